//! Background exchange rate refresh.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{CurrencyService, RateSource};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Owns the refresh thread. Dropping the handle stops the thread.
pub struct RefreshHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop refreshing and wait for the thread to exit.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        // Closing the channel wakes the thread out of its wait.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Refresh `service` from `source` now and then every `interval`, off the
/// calling thread. Failures are logged by the service and never stop the loop.
pub fn spawn_refresh(
    service: Arc<CurrencyService>,
    source: Arc<dyn RateSource>,
    interval: Duration,
) -> std::io::Result<RefreshHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let thread = thread::Builder::new()
        .name("numline-rates".to_string())
        .spawn(move || {
            loop {
                let _ = service.refresh_rates(source.as_ref());
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::debug!("exchange rate refresh stopped");
        })?;

    Ok(RefreshHandle {
        stop: Some(stop_tx),
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::currency::StaticRateSource;
    use std::time::Instant;

    #[test]
    fn test_spawn_refresh_publishes_and_stops() {
        let service = Arc::new(CurrencyService::new());
        let source: Arc<dyn RateSource> = Arc::new(StaticRateSource::new([("EUR", 0.5)]));

        let handle = spawn_refresh(service.clone(), source, Duration::from_secs(3600)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while service.rate("EUR").map(|r| r.rate) != Some(0.5) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(service.rate("EUR").unwrap().rate, 0.5);

        // Must return promptly even though the interval is an hour.
        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
