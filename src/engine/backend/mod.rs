//! Backend abstractions for the click engine.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::render::ClickRenderer;
use crate::config::AudioConfig;
use crate::engine::recovery::RecoveryRequest;
use crate::error::AudioError;

/// Context provided to audio backends when starting the engine.
///
/// The renderer is moved into the platform callback; the recovery sender is
/// handed to the stream's error callback.
pub struct EngineStartContext {
    pub renderer: ClickRenderer,
    pub recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
}

/// Trait implemented by platform-specific audio backends.
///
/// `stop` must not return until the render callback can no longer run, since
/// the engine resets the shared cursor right after it.
pub trait AudioBackend: Send + Sync {
    fn start(&self, ctx: EngineStartContext) -> Result<(), AudioError>;
    fn stop(&self) -> Result<(), AudioError>;
    fn is_running(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Backend for the current target: Oboe on Android, CPAL elsewhere.
#[cfg(target_os = "android")]
pub fn platform_backend(config: &AudioConfig) -> Arc<dyn AudioBackend> {
    Arc::new(OboeBackend::new(config.clone()))
}

#[cfg(not(target_os = "android"))]
pub fn platform_backend(config: &AudioConfig) -> Arc<dyn AudioBackend> {
    Arc::new(CpalBackend::new(config.clone()))
}

#[cfg(target_os = "android")]
mod oboe;
#[cfg(target_os = "android")]
pub use self::oboe::OboeBackend;

#[cfg(not(target_os = "android"))]
mod cpal;
#[cfg(not(target_os = "android"))]
pub use self::cpal::CpalBackend;

mod offline;
pub use offline::OfflineBackend;
