//! Click sound sources - immutable pre-decoded mono sample buffers
//!
//! One source exists per accent tier. Sources are decoded (or synthesized)
//! before playback starts and are then shared read-only with the audio
//! thread through an `Arc`, so the render loop never allocates or frees them.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::accent::Accent;
use crate::config::AssetConfig;
use crate::error::AudioError;

/// Pre-decoded mono click sound
#[derive(Debug, Clone)]
pub struct ClickSoundSource {
    samples: Arc<[f32]>,
}

impl ClickSoundSource {
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Read-only sample data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples in the click
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Decode a WAV asset into a mono source at `target_sample_rate`.
    ///
    /// Multi-channel files are downmixed by averaging. A file recorded at a
    /// different rate is converted with linear interpolation, which is good
    /// enough for a click but not sample-accurate.
    ///
    /// # Errors
    /// Returns `AudioError::AssetDecodeFailed` when the file cannot be opened
    /// or uses an unsupported sample format.
    pub fn decode_wav<P: AsRef<Path>>(
        path: P,
        target_sample_rate: u32,
    ) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let (mono, source_rate) = read_wav_mono(path)?;
        let samples = if source_rate == target_sample_rate {
            mono
        } else {
            tracing::debug!(
                "[ClickSoundSource] Converting {} from {} Hz to {} Hz",
                path.display(),
                source_rate,
                target_sample_rate
            );
            resample_linear(&mono, source_rate, target_sample_rate)
        };

        tracing::debug!(
            "[ClickSoundSource] Decoded {} ({} samples)",
            path.display(),
            samples.len()
        );
        Ok(Self::from_samples(samples))
    }

    /// Deterministic built-in click used when no asset is configured.
    ///
    /// A decaying sine with a short seeded noise transient. Strong clicks are
    /// higher, louder and slightly longer than medium ones, which in turn are
    /// above weak ones.
    pub fn synthesized(accent: Accent, sample_rate: u32) -> Self {
        let (frequency, duration_ms, amplitude) = match accent {
            Accent::Strong => (1500.0_f32, 30.0_f32, 0.9_f32),
            Accent::Medium => (1000.0, 25.0, 0.7),
            Accent::Weak => (800.0, 20.0, 0.5),
        };

        let num_samples = (sample_rate as f32 * duration_ms / 1000.0) as usize;
        let transient_samples = (sample_rate as f32 * 0.002) as usize;
        let phase_increment = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

        // Fixed seed keeps every synthesized click identical across runs
        let mut rng = StdRng::seed_from_u64(42);

        let mut samples = Vec::with_capacity(num_samples);
        for i in 0..num_samples {
            let t = i as f32 / num_samples as f32;
            let envelope = (-t * 6.0).exp();
            let tone = (i as f32 * phase_increment).sin();
            let noise = if i < transient_samples {
                rng.gen_range(-1.0..1.0)
            } else {
                0.0
            };
            let sample = (0.8 * tone + 0.2 * noise) * envelope * amplitude;
            samples.push(sample.clamp(-1.0, 1.0));
        }

        Self::from_samples(samples)
    }
}

/// The three click sources, one per accent tier
#[derive(Debug, Clone)]
pub struct ClickSounds {
    pub strong: ClickSoundSource,
    pub medium: ClickSoundSource,
    pub weak: ClickSoundSource,
}

impl ClickSounds {
    pub fn new(strong: ClickSoundSource, medium: ClickSoundSource, weak: ClickSoundSource) -> Self {
        Self {
            strong,
            medium,
            weak,
        }
    }

    /// Built-in clicks for every tier
    pub fn synthesized(sample_rate: u32) -> Self {
        Self::new(
            ClickSoundSource::synthesized(Accent::Strong, sample_rate),
            ClickSoundSource::synthesized(Accent::Medium, sample_rate),
            ClickSoundSource::synthesized(Accent::Weak, sample_rate),
        )
    }

    /// Decode the configured assets, using the built-in click for any tier
    /// without a path.
    pub fn load(assets: &AssetConfig, sample_rate: u32) -> Result<Self, AudioError> {
        let load_one = |path: &Option<std::path::PathBuf>, accent| match path {
            Some(path) => ClickSoundSource::decode_wav(path, sample_rate),
            None => Ok(ClickSoundSource::synthesized(accent, sample_rate)),
        };

        let sounds = Self::new(
            load_one(&assets.strong, Accent::Strong)?,
            load_one(&assets.medium, Accent::Medium)?,
            load_one(&assets.weak, Accent::Weak)?,
        );

        tracing::info!(
            "[ClickSounds] Loaded click sources: strong={} medium={} weak={} samples",
            sounds.strong.len(),
            sounds.medium.len(),
            sounds.weak.len()
        );
        Ok(sounds)
    }

    #[inline]
    pub fn select(&self, accent: Accent) -> &ClickSoundSource {
        match accent {
            Accent::Strong => &self.strong,
            Accent::Medium => &self.medium,
            Accent::Weak => &self.weak,
        }
    }
}

fn decode_error(path: &Path, reason: impl Into<String>) -> AudioError {
    AudioError::AssetDecodeFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| decode_error(path, err.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(decode_error(path, "zero channels"));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| decode_error(path, err.to_string())))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / i16::MAX as f32)
                        .map_err(|err| decode_error(path, err.to_string()))
                })
                .collect::<Result<Vec<f32>, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / 8_388_607.0)
                        .map_err(|err| decode_error(path, err.to_string()))
                })
                .collect::<Result<Vec<f32>, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / i32::MAX as f32)
                        .map_err(|err| decode_error(path, err.to_string()))
                })
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(decode_error(
                    path,
                    format!("unsupported bits_per_sample={}", bits),
                ))
            }
        },
    };

    if spec.channels == 1 {
        return Ok((samples, spec.sample_rate));
    }

    let channels = spec.channels as usize;
    let mono = samples
        .chunks(channels)
        .map(|frame| frame.iter().copied().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if input.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).round() as usize;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            input[idx] + (input[next] - input[idx]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_synthesized_click_lengths() {
        let sr = 48000;
        assert_eq!(ClickSoundSource::synthesized(Accent::Strong, sr).len(), 1440);
        assert_eq!(ClickSoundSource::synthesized(Accent::Medium, sr).len(), 1200);
        assert_eq!(ClickSoundSource::synthesized(Accent::Weak, sr).len(), 960);
    }

    #[test]
    fn test_synthesized_click_range_and_determinism() {
        let a = ClickSoundSource::synthesized(Accent::Strong, 44100);
        let b = ClickSoundSource::synthesized(Accent::Strong, 44100);
        assert_eq!(a.data(), b.data());
        assert!(a.data().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(a.data().iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_select_returns_matching_tier() {
        let sounds = ClickSounds::new(
            ClickSoundSource::from_samples(vec![1.0]),
            ClickSoundSource::from_samples(vec![0.5, 0.5]),
            ClickSoundSource::from_samples(vec![0.25, 0.25, 0.25]),
        );
        assert_eq!(sounds.select(Accent::Strong).len(), 1);
        assert_eq!(sounds.select(Accent::Medium).len(), 2);
        assert_eq!(sounds.select(Accent::Weak).len(), 3);
    }

    #[test]
    fn test_empty_source() {
        let source = ClickSoundSource::from_samples(Vec::new());
        assert!(source.is_empty());
        assert_eq!(source.len(), 0);
    }

    #[test]
    fn test_decode_mono_int16_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[0, i16::MAX, -i16::MAX, 0]);

        let source = ClickSoundSource::decode_wav(&path, 44100).unwrap();
        assert_eq!(source.data(), &[0.0, 1.0, -1.0, 0.0]);
    }

    #[test]
    fn test_decode_stereo_wav_downmixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[i16::MAX, 0, 0, -i16::MAX]);

        let source = ClickSoundSource::decode_wav(&path, 44100).unwrap();
        assert_eq!(source.data(), &[0.5, -0.5]);
    }

    #[test]
    fn test_decode_converts_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("22k.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[0; 100]);

        let source = ClickSoundSource::decode_wav(&path, 44100).unwrap();
        assert_eq!(source.len(), 200);
    }

    #[test]
    fn test_decode_missing_file_reports_path() {
        let err = ClickSoundSource::decode_wav("missing/click_high.wav", 44100).unwrap_err();
        match err {
            AudioError::AssetDecodeFailed { path, .. } => {
                assert!(path.ends_with("click_high.wav"));
            }
            other => panic!("Expected AssetDecodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_falls_back_to_synthesized_tiers() {
        let sounds = ClickSounds::load(&AssetConfig::default(), 48000).unwrap();
        assert_eq!(
            sounds.strong.data(),
            ClickSoundSource::synthesized(Accent::Strong, 48000).data()
        );
        assert_eq!(sounds.weak.len(), 960);
    }

    #[test]
    fn test_resample_linear_interpolates() {
        let out = resample_linear(&[0.0, 1.0], 1, 2);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[2], 1.0);
    }
}
