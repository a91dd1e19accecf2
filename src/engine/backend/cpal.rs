//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows)
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated output
//! thread for its whole life. `start` waits for that thread to report whether
//! the stream opened; `stop` signals it and joins, which guarantees the
//! render callback has finished before the engine resets shared state.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::audio::engine_cpal::AudioEngine;
use crate::config::AudioConfig;
use crate::error::{log_audio_error, AudioError};

use super::{AudioBackend, EngineStartContext};

struct OutputThread {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// CPAL backend owning the output thread
pub struct CpalBackend {
    audio_config: AudioConfig,
    output: Mutex<Option<OutputThread>>,
}

impl CpalBackend {
    pub fn new(audio_config: AudioConfig) -> Self {
        Self {
            audio_config,
            output: Mutex::new(None),
        }
    }

    fn lock_output(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<OutputThread>>, AudioError> {
        self.output.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "cpal_output".to_string(),
            };
            log_audio_error(&err, "lock_output");
            err
        })
    }
}

impl AudioBackend for CpalBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), AudioError> {
        let mut guard = self.lock_output()?;
        if guard.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let config = self.audio_config.clone();

        let handle = std::thread::Builder::new()
            .name("click-output".to_string())
            .spawn(move || {
                let mut engine = AudioEngine::new(config);
                match engine.start(ctx.renderer, ctx.recovery_tx) {
                    Ok(()) => {
                        let _ = ready_tx.send(Ok(()));
                        // Returns on stop() or when the backend is dropped
                        let _ = stop_rx.recv();
                        if let Err(err) = engine.stop() {
                            log_audio_error(&err, "cpal_output_thread");
                        }
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                    }
                }
            })?;

        let started = ready_rx.recv().unwrap_or_else(|_| {
            Err(AudioError::StreamFailure {
                reason: "output thread exited before reporting".to_string(),
            })
        });

        match started {
            Ok(()) => {
                *guard = Some(OutputThread { stop_tx, handle });
                Ok(())
            }
            Err(err) => {
                let _ = handle.join();
                log_audio_error(&err, "cpal_start");
                Err(err)
            }
        }
    }

    fn stop(&self) -> Result<(), AudioError> {
        let output = self.lock_output()?.take();
        if let Some(output) = output {
            let _ = output.stop_tx.send(());
            output.handle.join().map_err(|_| AudioError::HardwareError {
                details: "output thread panicked".to_string(),
            })?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.lock_output()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
