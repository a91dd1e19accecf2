use std::sync::Mutex;

use crate::audio::engine::AudioEngine;
use crate::config::AudioConfig;
use crate::error::{log_audio_error, AudioError};

use super::{AudioBackend, EngineStartContext};

/// Android backend that drives the Oboe-powered audio engine.
pub struct OboeBackend {
    engine: Mutex<AudioEngine>,
}

impl OboeBackend {
    pub fn new(audio_config: AudioConfig) -> Self {
        Self {
            engine: Mutex::new(AudioEngine::new(audio_config)),
        }
    }

    fn lock_engine(&self) -> Result<std::sync::MutexGuard<'_, AudioEngine>, AudioError> {
        self.engine.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "oboe_engine".to_string(),
            };
            log_audio_error(&err, "lock_engine");
            err
        })
    }
}

impl AudioBackend for OboeBackend {
    fn start(&self, ctx: EngineStartContext) -> Result<(), AudioError> {
        if !crate::android_context_ready() {
            let err = AudioError::ContextNotInitialized;
            log_audio_error(&err, "oboe_start");
            return Err(err);
        }
        self.lock_engine()?.start(ctx.renderer, ctx.recovery_tx)
    }

    fn stop(&self) -> Result<(), AudioError> {
        self.lock_engine()?.stop()
    }

    fn is_running(&self) -> bool {
        self.lock_engine()
            .map(|engine| engine.is_running())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "oboe"
    }
}
