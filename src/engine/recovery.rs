//! Stream recovery worker
//!
//! Stream error callbacks only enqueue a [`RecoveryRequest`]; a single
//! long-lived worker thread owns remediation (stop the dead stream, open a
//! new one). Error detection therefore never blocks and never spawns threads.

use std::sync::{Mutex, Weak};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

/// Reason a backend asked for its stream to be rebuilt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryRequest {
    /// Output device went away (headphones unplugged, route change)
    Disconnected,
    /// Any other stream error reported by the platform
    StreamError { reason: String },
    /// Stop the worker loop
    Shutdown,
}

/// Something the worker can ask to rebuild its output stream
pub trait Recoverable: Send + Sync {
    fn recover(&self, request: &RecoveryRequest);
}

/// Dedicated recovery thread fed by an unbounded mpsc channel
pub struct RecoveryWorker {
    tx: mpsc::UnboundedSender<RecoveryRequest>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecoveryWorker {
    /// Spawn the worker. It holds only a weak reference to its target so the
    /// owner's lifetime is not extended by the thread.
    pub fn spawn<T: Recoverable + 'static>(
        target: Weak<T>,
        tx: mpsc::UnboundedSender<RecoveryRequest>,
        mut rx: mpsc::UnboundedReceiver<RecoveryRequest>,
    ) -> std::io::Result<Self> {
        let handle = std::thread::Builder::new()
            .name("click-recovery".to_string())
            .spawn(move || {
                tracing::debug!("[RecoveryWorker] Started");
                while let Some(request) = rx.blocking_recv() {
                    if request == RecoveryRequest::Shutdown {
                        break;
                    }
                    match target.upgrade() {
                        Some(target) => target.recover(&request),
                        None => break,
                    }
                }
                tracing::debug!("[RecoveryWorker] Stopped");
            })?;

        Ok(Self {
            tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Sender handed to backends for their error callbacks
    pub fn sender(&self) -> mpsc::UnboundedSender<RecoveryRequest> {
        self.tx.clone()
    }

    /// Ask the worker to exit and wait for it.
    pub fn shutdown(&self) {
        let _ = self.tx.send(RecoveryRequest::Shutdown);
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            // The worker may be the thread dropping the last engine handle
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for RecoveryWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<RecoveryRequest>>,
    }

    impl Recoverable for Recorder {
        fn recover(&self, request: &RecoveryRequest) {
            self.seen.lock().unwrap().push(request.clone());
        }
    }

    fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_requests_reach_target_in_order() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = RecoveryWorker::spawn(Arc::downgrade(&recorder), tx, rx).unwrap();

        let sender = worker.sender();
        sender.send(RecoveryRequest::Disconnected).unwrap();
        sender
            .send(RecoveryRequest::StreamError {
                reason: "underrun".to_string(),
            })
            .unwrap();

        assert!(wait_for(|| recorder.seen.lock().unwrap().len() == 2));
        assert_eq!(recorder.seen.lock().unwrap()[0], RecoveryRequest::Disconnected);

        worker.shutdown();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = RecoveryWorker::spawn(Arc::downgrade(&recorder), tx, rx).unwrap();
        worker.shutdown();
        worker.shutdown();
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
