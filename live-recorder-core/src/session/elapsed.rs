use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::models::error::RecorderError;
use crate::models::event::{EventSender, RecorderEvent};
use crate::models::recording_result::format_elapsed;
use crate::session::clock::Clock;

/// Background timer posting `ElapsedTimeUpdated` while a recording runs.
///
/// Each tick reports `clock.now() - started_at`. Stopping is immediate and
/// joins the timer thread.
pub struct ElapsedTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ElapsedTicker {
    pub fn start(
        started_at: Instant,
        clock: Arc<dyn Clock>,
        interval: Duration,
        events: EventSender,
    ) -> Result<Self, RecorderError> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("elapsed-timer".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let elapsed = clock.now().saturating_duration_since(started_at);
                        let event = RecorderEvent::ElapsedTimeUpdated {
                            elapsed: format_elapsed(elapsed),
                        };
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| RecorderError::InvalidState(format!("failed to spawn timer thread: {}", e)))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        // Dropping the sender disconnects the timer's receive.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use crossbeam_channel::unbounded;

    #[test]
    fn reports_clock_time_not_tick_count() {
        let clock = ManualClock::new();
        let started_at = clock.now();
        clock.advance(Duration::from_secs(42));
        let (tx, rx) = unbounded();

        let mut ticker =
            ElapsedTicker::start(started_at, Arc::new(clock), Duration::from_millis(10), tx).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.stop();

        assert_eq!(
            first,
            RecorderEvent::ElapsedTimeUpdated {
                elapsed: "00:00:42".into()
            }
        );
    }

    #[test]
    fn stop_ends_updates() {
        let clock = ManualClock::new();
        let (tx, rx) = unbounded();

        let mut ticker =
            ElapsedTicker::start(clock.now(), Arc::new(clock), Duration::from_millis(5), tx).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.stop();
        while rx.try_recv().is_ok() {}

        thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_does_not_wait_for_the_next_tick() {
        let clock = ManualClock::new();
        let (tx, _rx) = unbounded();
        let mut ticker =
            ElapsedTicker::start(clock.now(), Arc::new(clock), Duration::from_secs(3600), tx).unwrap();

        let begun = Instant::now();
        ticker.stop();
        assert!(begun.elapsed() < Duration::from_secs(5));
    }
}
