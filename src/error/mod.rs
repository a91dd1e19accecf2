// Error types for the click engine
//
// A single error enum covers meter validation, stream lifecycle and asset
// decoding. Every variant carries a stable numeric code for JNI and CLI hosts.

mod audio;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};

/// Numeric code plus display message for an error value
pub trait ErrorCode {
    /// Stable code in the 1001-1012 range
    fn code(&self) -> i32;

    fn message(&self) -> String;
}
