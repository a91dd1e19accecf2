#[cfg(not(target_os = "android"))]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
#[cfg(not(target_os = "android"))]
use tokio::sync::mpsc;

#[cfg(not(target_os = "android"))]
use super::render::ClickRenderer;
#[cfg(not(target_os = "android"))]
use crate::config::AudioConfig;
#[cfg(not(target_os = "android"))]
use crate::engine::recovery::RecoveryRequest;
#[cfg(not(target_os = "android"))]
use crate::error::AudioError;

/// Frames below which a fixed cpal buffer is not requested
#[cfg(not(target_os = "android"))]
const MIN_FIXED_BUFFER_FRAMES: u32 = 64;

/// First F32 output range with the requested channel count whose rate range
/// covers `sample_rate`, pinned to that rate.
#[cfg(not(target_os = "android"))]
fn select_output_config<I>(
    supported: I,
    channels: u16,
    sample_rate: u32,
) -> Option<cpal::SupportedStreamConfig>
where
    I: IntoIterator<Item = cpal::SupportedStreamConfigRange>,
{
    let rate = cpal::SampleRate(sample_rate);
    supported
        .into_iter()
        .find(|range| {
            range.channels() == channels
                && range.sample_format() == cpal::SampleFormat::F32
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .map(|range| range.with_sample_rate(rate))
}

#[cfg(not(target_os = "android"))]
pub struct AudioEngine {
    config: AudioConfig,
    /// Output audio stream
    output_stream: Option<cpal::Stream>,
}

#[cfg(not(target_os = "android"))]
impl AudioEngine {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            output_stream: None,
        }
    }

    fn buffer_size(&self, supported: &cpal::SupportedBufferSize) -> cpal::BufferSize {
        match supported {
            cpal::SupportedBufferSize::Range { min, max } => {
                let bursts = self.config.buffer_size_in_bursts.max(1);
                let burst = (*min).max(MIN_FIXED_BUFFER_FRAMES);
                let frames = (burst * bursts).clamp(*min, *max);
                cpal::BufferSize::Fixed(frames)
            }
            cpal::SupportedBufferSize::Unknown => cpal::BufferSize::Default,
        }
    }

    fn create_output_stream(
        &self,
        mut renderer: ClickRenderer,
        recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
    ) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::StreamOpenFailed {
                reason: "No default output device found".to_string(),
            })?;

        let requested = device.supported_output_configs().ok().and_then(|configs| {
            select_output_config(configs, self.config.channel_count, self.config.sample_rate)
        });
        let config = match requested {
            Some(config) => config,
            None => {
                let fallback =
                    device
                        .default_output_config()
                        .map_err(|e| AudioError::StreamOpenFailed {
                            reason: format!("Failed to get default output config: {:?}", e),
                        })?;
                tracing::warn!(
                    "[AudioEngine] No F32 output config with {} ch at {} Hz; using device default {} ch",
                    self.config.channel_count,
                    self.config.sample_rate,
                    fallback.channels()
                );
                fallback
            }
        };

        let mut stream_config: cpal::StreamConfig = config.clone().into();
        stream_config.buffer_size = self.buffer_size(config.buffer_size());
        let channels_count = stream_config.channels as usize;

        if stream_config.sample_rate.0 != self.config.sample_rate {
            tracing::warn!(
                "[AudioEngine] Device rate {} Hz differs from requested {} Hz; click timing follows the device",
                stream_config.sample_rate.0,
                self.config.sample_rate
            );
        }
        renderer.set_sample_rate(stream_config.sample_rate.0);

        let err_fn = move |err: cpal::StreamError| {
            let request = match err {
                cpal::StreamError::DeviceNotAvailable => RecoveryRequest::Disconnected,
                other => RecoveryRequest::StreamError {
                    reason: other.to_string(),
                },
            };
            let _ = recovery_tx.send(request);
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.render_interleaved(data, channels_count);
                },
                err_fn,
                None,
            ),
            _ => {
                return Err(AudioError::StreamOpenFailed {
                    reason: "Only F32 sample format is currently supported for output".to_string(),
                })
            }
        }
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        tracing::debug!(
            "[AudioEngine] Output config: {} ch, {} Hz, buffer {:?}",
            channels_count,
            stream_config.sample_rate.0,
            stream_config.buffer_size
        );

        Ok(stream)
    }

    pub fn start(
        &mut self,
        renderer: ClickRenderer,
        recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
    ) -> Result<(), AudioError> {
        if self.output_stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        let output_stream = self.create_output_stream(renderer, recovery_tx)?;
        output_stream
            .play()
            .map_err(|e| AudioError::HardwareError {
                details: format!("Output start failed: {}", e),
            })?;

        tracing::info!("[AudioEngine] Output stream started");
        self.output_stream = Some(output_stream);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.output_stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("[AudioEngine] Pause before drop failed: {}", e);
            }
            drop(stream);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.output_stream.is_some()
    }
}
