//! Interactive mode: one line in, one result out.

use numline_core::Evaluator;
use numline_engine::builtins::MATH_BUILTINS;
use numline_engine::engine::format_number;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Enter a calculation per line. Commands:
  :vars       List variables
  :clear      Forget variables and previous results
  :functions  List math functions
  :help       Show this help
  :quit       Exit";

/// Run the read-evaluate-print loop until `:quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    evaluator: &mut Evaluator,
    input: R,
    out: &mut W,
    prompt: bool,
) -> io::Result<()> {
    if prompt {
        write!(out, "> ")?;
        out.flush()?;
    }

    for line in input.lines() {
        let line = line?;
        match line.trim() {
            ":quit" | ":q" => break,
            ":help" => writeln!(out, "{}", HELP)?,
            ":vars" => {
                let vars = evaluator.variables();
                if vars.is_empty() {
                    writeln!(out, "(no variables)")?;
                }
                for var in vars {
                    match var.unit {
                        Some(unit) => {
                            writeln!(out, "{} = {} {}", var.name, format_number(var.value), unit)?
                        }
                        None => writeln!(out, "{} = {}", var.name, format_number(var.value))?,
                    }
                }
            }
            ":clear" => {
                evaluator.clear();
                writeln!(out, "Cleared")?;
            }
            ":functions" => {
                for builtin in MATH_BUILTINS {
                    writeln!(out, "{:<8} {}", builtin.name, builtin.description)?;
                }
            }
            cmd if cmd.starts_with(':') => {
                writeln!(out, "Unknown command: {} (try :help)", cmd)?;
            }
            _ => {
                let shown = evaluator.evaluate_line(&line);
                if !shown.is_empty() {
                    writeln!(out, "{}", shown)?;
                }
            }
        }
        if prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
    }

    Ok(())
}
