//! AudioEngine - Oboe-based real-time click output
//!
//! This module provides the Android audio engine using Oboe for output.
//! Key features:
//! - Low-latency output via oboe-rs (AAudio/OpenSL ES backends)
//! - Buffer sized as a small multiple of the device burst
//! - Real-time safe: the callback only runs the click renderer
//!
//! Thread safety:
//! - All metronome state is shared through atomics in `MetronomeState`
//! - Stream errors are forwarded to the recovery worker over an mpsc channel

#[cfg(target_os = "android")]
use oboe::{
    AudioStream, AudioStreamAsync, AudioStreamBase, AudioStreamBuilder, Output, PerformanceMode,
    SharingMode,
};
#[cfg(target_os = "android")]
use tokio::sync::mpsc;

#[cfg(target_os = "android")]
use super::callback::OutputCallback;
#[cfg(target_os = "android")]
use super::render::ClickRenderer;
#[cfg(target_os = "android")]
use crate::config::AudioConfig;
#[cfg(target_os = "android")]
use crate::engine::recovery::RecoveryRequest;
#[cfg(target_os = "android")]
use crate::error::AudioError;

/// Oboe output engine
///
/// # Real-Time Safety Guarantees
/// - No heap allocations in audio callback (click sources pre-decoded)
/// - No mutex locks (only atomic operations)
/// - Bounded execution time (one pass over the requested frames)
///
/// # Example
/// ```ignore
/// let mut engine = AudioEngine::new(AudioConfig::default());
/// engine.start(renderer, recovery_tx)?;
/// engine.stop()?;
/// ```
#[cfg(target_os = "android")]
pub struct AudioEngine {
    config: AudioConfig,
    output_stream: Option<AudioStreamAsync<Output, OutputCallback>>,
}

#[cfg(target_os = "android")]
impl AudioEngine {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            output_stream: None,
        }
    }

    /// Create and open the output audio stream with the click callback
    ///
    /// # Errors
    /// Returns `StreamOpenFailed` if the stream cannot be opened
    fn create_output_stream(
        &self,
        renderer: ClickRenderer,
        recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
    ) -> Result<AudioStreamAsync<Output, OutputCallback>, AudioError> {
        let callback = OutputCallback::new(renderer, recovery_tx);

        AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Exclusive)
            .set_direction::<Output>()
            .set_sample_rate(self.config.sample_rate as i32)
            .set_channel_count::<oboe::Mono>()
            .set_format::<f32>()
            .set_callback(callback)
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Output stream: {:?}", e),
            })
    }

    /// Open and start the output stream
    ///
    /// # Errors
    /// Returns error if the stream cannot be opened or started
    pub fn start(
        &mut self,
        renderer: ClickRenderer,
        recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
    ) -> Result<(), AudioError> {
        if self.output_stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        if self.config.channel_count != 1 {
            tracing::warn!(
                "[AudioEngine] Oboe output is mono; ignoring channel_count={}",
                self.config.channel_count
            );
        }
        let mut output_stream = self.create_output_stream(renderer, recovery_tx)?;

        let burst = output_stream.get_frames_per_burst();
        let requested = burst * self.config.buffer_size_in_bursts.max(1) as i32;
        if let Err(e) = output_stream.set_buffer_size_in_frames(requested) {
            tracing::warn!("[AudioEngine] Could not set buffer size to {}: {:?}", requested, e);
        }
        tracing::debug!(
            "[AudioEngine] Buffer size in frames: {} (burst {})",
            output_stream.get_buffer_size_in_frames(),
            burst
        );

        output_stream
            .start()
            .map_err(|e| AudioError::HardwareError {
                details: format!("Failed to start output stream: {:?}", e),
            })?;

        tracing::info!(
            "[AudioEngine] Output stream started at {} Hz",
            output_stream.get_sample_rate()
        );
        self.output_stream = Some(output_stream);
        Ok(())
    }

    /// Stop and close the output stream
    ///
    /// Safe to call when no stream is open.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut stream) = self.output_stream.take() {
            stream.stop().map_err(|e| AudioError::HardwareError {
                details: format!("Failed to stop output stream: {:?}", e),
            })?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.output_stream.is_some()
    }
}

#[cfg(not(target_os = "android"))]
pub use super::engine_cpal::AudioEngine;
