// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;
use std::path::PathBuf;

/// Audio error code constants shared with the host application
///
/// Error code range: 1001-1012
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Tempo is invalid (must be > 0)
    pub const TEMPO_INVALID: i32 = 1001;

    /// Clicks per beat is invalid (must be > 0)
    pub const CLICKS_PER_BEAT_INVALID: i32 = 1002;

    /// Beats per bar is invalid (must be > 0)
    pub const BEATS_PER_BAR_INVALID: i32 = 1003;

    /// Audio engine is already running
    pub const ALREADY_RUNNING: i32 = 1004;

    /// Audio engine is not running
    pub const NOT_RUNNING: i32 = 1005;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1006;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1007;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1008;

    /// Android context was not initialized before audio engine start
    pub const CONTEXT_NOT_INITIALIZED: i32 = 1009;

    /// Audio stream disconnected or failed while playing
    pub const STREAM_FAILURE: i32 = 1010;

    /// Click asset could not be decoded
    pub const ASSET_DECODE_FAILED: i32 = 1011;

    /// Output sample rate is invalid (must be > 0)
    pub const SAMPLE_RATE_INVALID: i32 = 1012;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=ClickEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover configuration validation, stream management,
/// hardware access and click asset decoding.
///
/// Error code ranges: 1001-1012
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Tempo must be > 0
    TempoInvalid { tempo_bpm: u32 },

    /// Clicks per beat must be > 0
    ClicksPerBeatInvalid { clicks_per_beat: u32 },

    /// Beats per bar must be > 0
    BeatsPerBarInvalid { beats_per_bar: u32 },

    /// Audio engine is already running
    AlreadyRunning,

    /// Audio engine is not running
    NotRunning,

    /// Hardware error occurred
    HardwareError { details: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Android context was not initialized before audio engine start
    ContextNotInitialized,

    /// Stream disconnected or failed during playback
    StreamFailure { reason: String },

    /// Click asset could not be read or converted
    AssetDecodeFailed { path: PathBuf, reason: String },

    /// Sample rate must be > 0
    SampleRateInvalid { sample_rate: u32 },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::TempoInvalid { .. } => AudioErrorCodes::TEMPO_INVALID,
            AudioError::ClicksPerBeatInvalid { .. } => AudioErrorCodes::CLICKS_PER_BEAT_INVALID,
            AudioError::BeatsPerBarInvalid { .. } => AudioErrorCodes::BEATS_PER_BAR_INVALID,
            AudioError::AlreadyRunning => AudioErrorCodes::ALREADY_RUNNING,
            AudioError::NotRunning => AudioErrorCodes::NOT_RUNNING,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::ContextNotInitialized => AudioErrorCodes::CONTEXT_NOT_INITIALIZED,
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::AssetDecodeFailed { .. } => AudioErrorCodes::ASSET_DECODE_FAILED,
            AudioError::SampleRateInvalid { .. } => AudioErrorCodes::SAMPLE_RATE_INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::TempoInvalid { tempo_bpm } => {
                format!("Tempo must be greater than 0 BPM (got {})", tempo_bpm)
            }
            AudioError::ClicksPerBeatInvalid { clicks_per_beat } => {
                format!(
                    "Clicks per beat must be greater than 0 (got {})",
                    clicks_per_beat
                )
            }
            AudioError::BeatsPerBarInvalid { beats_per_bar } => {
                format!("Beats per bar must be greater than 0 (got {})", beats_per_bar)
            }
            AudioError::AlreadyRunning => {
                "Audio engine already running. Call stop() first.".to_string()
            }
            AudioError::NotRunning => "Audio engine not running. Call start() first.".to_string(),
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::ContextNotInitialized => {
                "Android context not initialized. JNI_OnLoad must run first.".to_string()
            }
            AudioError::StreamFailure { reason } => {
                format!("Audio stream failed: {}", reason)
            }
            AudioError::AssetDecodeFailed { path, reason } => {
                format!("Failed to decode click asset {}: {}", path.display(), reason)
            }
            AudioError::SampleRateInvalid { sample_rate } => {
                format!("Sample rate must be greater than 0 Hz (got {})", sample_rate)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}
