use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::audio::render::{ClickRenderer, RenderReport};
use crate::engine::recovery::RecoveryRequest;
use crate::error::{log_audio_error, AudioError};

use super::{AudioBackend, EngineStartContext};

struct OfflineStream {
    renderer: ClickRenderer,
    recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
}

/// Backend without audio hardware.
///
/// While "running" it holds the renderer and renders blocks on demand, which
/// makes it the deterministic harness for tests and the CLI WAV export.
#[derive(Default)]
pub struct OfflineBackend {
    stream: Mutex<Option<OfflineStream>>,
    starts: AtomicU64,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_stream(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<OfflineStream>>, AudioError> {
        self.stream.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "offline_stream".to_string(),
            };
            log_audio_error(&err, "lock_stream");
            err
        })
    }

    /// Number of successful `start` calls, recoveries included.
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Render into a caller-provided mono buffer, as one audio callback would.
    pub fn render_into(&self, output: &mut [f32]) -> Result<RenderReport, AudioError> {
        let mut guard = self.lock_stream()?;
        let stream = guard.as_mut().ok_or(AudioError::NotRunning)?;
        Ok(stream.renderer.render(output))
    }

    /// Render `frames` mono samples into a new buffer.
    pub fn render_block(&self, frames: usize) -> Result<Vec<f32>, AudioError> {
        let mut block = vec![0.0; frames];
        self.render_into(&mut block)?;
        Ok(block)
    }

    /// Report a stream failure the way a device error callback would.
    pub fn simulate_stream_error(&self, request: RecoveryRequest) -> Result<(), AudioError> {
        let guard = self.lock_stream()?;
        let stream = guard.as_ref().ok_or(AudioError::NotRunning)?;
        stream
            .recovery_tx
            .send(request)
            .map_err(|_| AudioError::StreamFailure {
                reason: "recovery worker is gone".to_string(),
            })
    }
}

impl AudioBackend for OfflineBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), AudioError> {
        let mut guard = self.lock_stream()?;
        if guard.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        *guard = Some(OfflineStream {
            renderer: ctx.renderer,
            recovery_tx: ctx.recovery_tx,
        });
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.lock_stream()?.take();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.lock_stream()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
