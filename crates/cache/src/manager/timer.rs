//! Background swap timer
//!
//! A single named thread waits for the configured interval, runs one sweep,
//! and only then starts waiting again, so ticks can never overlap.

use super::Shared;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "gfxswap-timer";

/// Handle to the running swap timer thread
pub(crate) struct SwapTimer {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SwapTimer {
    /// Start the timer thread
    ///
    /// The thread only holds a weak reference to the manager and exits once
    /// the manager is gone or the timer is stopped.
    pub(crate) fn start(shared: Weak<Shared>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(shared, interval, stop_rx))?;

        tracing::debug!(?interval, "Started graphic swap timer");
        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        // Full channel means a stop is already pending
        let _ = self.stop_tx.try_send(());

        if let Some(handle) = self.handle.take() {
            // The last manager handle can be released by the timer thread itself
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::warn!("Graphic swap timer thread panicked");
            }
        }
    }
}

impl Drop for SwapTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: Weak<Shared>, interval: Duration, stop_rx: Receiver<()>) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.on_swap_timer();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("Graphic swap timer stopped");
}
