//! Configuration management for the click engine
//!
//! This module provides runtime configuration loading from JSON files so the
//! stream parameters, the initial meter and the click asset paths can be
//! changed without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub metronome: MetronomeConfig,
    #[serde(default)]
    pub assets: AssetConfig,
}

/// Output stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Requested sample rate in Hz (the device may grant another one)
    pub sample_rate: u32,
    /// Requested output channel count. Desktop output picks a device config
    /// with this many channels when one exists; Oboe output is always mono.
    pub channel_count: u16,
    /// Buffer size as a multiple of the device burst size.
    /// Double-buffering trades a little latency for glitch protection.
    pub buffer_size_in_bursts: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channel_count: 1,
            buffer_size_in_bursts: 2,
        }
    }
}

/// Initial meter applied when the engine is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetronomeConfig {
    pub tempo_bpm: u32,
    pub clicks_per_beat: u32,
    pub beats_per_bar: u32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            clicks_per_beat: 1,
            beats_per_bar: 4,
        }
    }
}

/// Paths of the three click assets
///
/// A missing path means the synthesized click is used for that accent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default)]
    pub strong: Option<PathBuf>,
    #[serde(default)]
    pub medium: Option<PathBuf>,
    #[serde(default)]
    pub weak: Option<PathBuf>,
}

impl AssetConfig {
    /// Asset layout shipped with the app: `click_high.wav`,
    /// `click_medium.wav` and `click_low.wav` inside `dir`.
    pub fn bundled_in<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            strong: Some(dir.join("click_high.wav")),
            medium: Some(dir.join("click_medium.wav")),
            weak: Some(dir.join("click_low.wav")),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Falls back to the default configuration (and logs a warning) when the
    /// file is missing or is not valid JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Configuration for Android builds
    ///
    /// Bundled assets live behind the AssetManager, which the host passes in
    /// separately, so only defaults are available here.
    #[cfg(target_os = "android")]
    pub fn load() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/metronome_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.channel_count, 1);
        assert_eq!(config.audio.buffer_size_in_bursts, 2);
        assert_eq!(config.metronome.tempo_bpm, 120);
        assert_eq!(config.metronome.clicks_per_beat, 1);
        assert_eq!(config.metronome.beats_per_bar, 4);
        assert!(config.assets.strong.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AppConfig::default();
        config.metronome.tempo_bpm = 96;
        config.assets = AssetConfig::bundled_in("assets");

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.metronome.tempo_bpm, 96);
        assert_eq!(
            parsed.assets.medium,
            Some(PathBuf::from("assets").join("click_medium.wav"))
        );
    }

    #[test]
    fn test_partial_json_uses_section_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "metronome": { "tempo_bpm": 60, "clicks_per_beat": 3, "beats_per_bar": 3 } }"#)
                .unwrap();
        assert_eq!(parsed.metronome.clicks_per_beat, 3);
        assert_eq!(parsed.audio.sample_rate, 44100);
    }

    #[test]
    fn test_load_from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "audio": {{ "sample_rate": 48000, "channel_count": 2, "buffer_size_in_bursts": 4 }} }}"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path());
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.audio.channel_count, 2);
        assert_eq!(config.metronome.tempo_bpm, 120);
    }

    #[test]
    fn test_load_from_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config.metronome.tempo_bpm, 120);
    }

    #[test]
    fn test_load_from_invalid_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = AppConfig::load_from_file(file.path());
        assert_eq!(config.audio.buffer_size_in_bursts, 2);
    }
}
