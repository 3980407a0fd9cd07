use crate::error::{NumlineError, Result};
use std::path::Path;

pub const MAX_DOCUMENT_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Read a document from disk, refusing anything over
/// [`MAX_DOCUMENT_FILE_BYTES`].
pub fn read_document(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_DOCUMENT_FILE_BYTES {
        return Err(NumlineError::TooLarge {
            path: path.display().to_string(),
            size: meta.len(),
            max: MAX_DOCUMENT_FILE_BYTES,
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x = 2").unwrap();
        assert_eq!(read_document(file.path()).unwrap(), "x = 2\n");
    }

    #[test]
    fn test_read_document_rejects_large_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(MAX_DOCUMENT_FILE_BYTES + 1).unwrap();
        assert!(matches!(
            read_document(file.path()),
            Err(NumlineError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_read_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_document(&dir.path().join("missing.calc")),
            Err(NumlineError::Io(_))
        ));
    }
}
