//! Audio Output Callback - Oboe trait implementation for the click render loop
//!
//! This module provides the OutputCallback struct that implements oboe-rs v0.6.x
//! AudioOutputCallback trait. It wraps a [`ClickRenderer`] and forwards stream
//! errors to the recovery worker.
//!
//! # Architecture
//! ```text
//! AudioEngine::create_output_stream()
//!   └─> OutputCallback::new()
//!       └─> oboe::AudioStreamBuilder::set_callback()
//!           ├─> OutputCallback::on_audio_ready()        [Real-time thread]
//!           │     └─> ClickRenderer::render()
//!           └─> OutputCallback::on_error_after_close()  [Oboe error thread]
//!                 └─> RecoveryRequest -> recovery worker
//! ```

use oboe::{AudioOutputCallback, AudioOutputStreamSafe, AudioStreamBase, DataCallbackResult};
use tokio::sync::mpsc;

use super::render::ClickRenderer;
use crate::engine::recovery::RecoveryRequest;

/// Output audio callback for click generation
///
/// All state needed by the real-time callback lives inside the renderer;
/// the callback itself only adapts the oboe signature.
pub struct OutputCallback {
    renderer: ClickRenderer,
    recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
}

impl OutputCallback {
    pub fn new(renderer: ClickRenderer, recovery_tx: mpsc::UnboundedSender<RecoveryRequest>) -> Self {
        Self {
            renderer,
            recovery_tx,
        }
    }
}

impl AudioOutputCallback for OutputCallback {
    type FrameType = (f32, oboe::Mono);

    fn on_audio_ready(
        &mut self,
        stream: &mut dyn AudioOutputStreamSafe,
        frames: &mut [f32],
    ) -> DataCallbackResult {
        // Real-time audio callback - NO ALLOCATIONS, LOCKS, OR BLOCKING!
        self.renderer.set_sample_rate(stream.get_sample_rate() as u32);
        self.renderer.render(frames);

        DataCallbackResult::Continue
    }

    fn on_error_after_close(
        &mut self,
        _stream: &mut dyn AudioOutputStreamSafe,
        error: oboe::Error,
    ) {
        let request = match error {
            oboe::Error::Disconnected => RecoveryRequest::Disconnected,
            other => RecoveryRequest::StreamError {
                reason: format!("{:?}", other),
            },
        };
        // Detection only; the worker thread rebuilds the stream
        let _ = self.recovery_tx.send(request);
    }
}
