//! MetronomeEngine: control-plane facade over the click render loop.
//!
//! Owns the shared `MetronomeState`, the decoded click sounds, the platform
//! backend, the control-side beat counter and the recovery worker. Every
//! method here runs on the control thread; the only path into the audio
//! thread is through atomics in `MetronomeState`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::audio::metronome::{frames_per_click, MetronomeState};
use crate::audio::render::ClickRenderer;
use crate::audio::sound_source::ClickSounds;
use crate::config::{AppConfig, AudioConfig};
use crate::engine::backend::{platform_backend, AudioBackend, EngineStartContext};
use crate::engine::beat_counter::{BeatCounter, BeatPosition};
use crate::engine::recovery::{Recoverable, RecoveryRequest, RecoveryWorker};
use crate::error::{log_audio_error, AudioError};

/// Published each time the control thread consumes an advance signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatEvent {
    /// Advances consumed since the last start/stop
    pub sequence: u64,
    /// Position of the click that is now playing
    pub position: BeatPosition,
}

struct EngineInner {
    state: Arc<MetronomeState>,
    sounds: Arc<ClickSounds>,
    backend: Arc<dyn AudioBackend>,
    audio_config: AudioConfig,
    counter: Mutex<BeatCounter>,
    /// Serializes start/stop/recovery; holds the running flag
    running: Mutex<bool>,
    beat_tx: broadcast::Sender<BeatEvent>,
    recovery_tx: mpsc::UnboundedSender<RecoveryRequest>,
    sequence: AtomicU64,
    recoveries: AtomicU64,
}

impl EngineInner {
    fn lock_running(&self) -> Result<MutexGuard<'_, bool>, AudioError> {
        self.running.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "engine_lifecycle".to_string(),
            };
            log_audio_error(&err, "lock_running");
            err
        })
    }

    fn lock_counter(&self) -> Result<MutexGuard<'_, BeatCounter>, AudioError> {
        self.counter.lock().map_err(|_| {
            let err = AudioError::LockPoisoned {
                component: "beat_counter".to_string(),
            };
            log_audio_error(&err, "lock_counter");
            err
        })
    }

    fn start_context(&self) -> EngineStartContext {
        EngineStartContext {
            renderer: ClickRenderer::new(
                Arc::clone(&self.state),
                Arc::clone(&self.sounds),
                self.audio_config.sample_rate,
            ),
            recovery_tx: self.recovery_tx.clone(),
        }
    }
}

impl Recoverable for EngineInner {
    fn recover(&self, request: &RecoveryRequest) {
        let mut running = match self.lock_running() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if !*running {
            tracing::debug!(
                "[MetronomeEngine] Ignoring {:?}; playback already stopped",
                request
            );
            return;
        }

        tracing::warn!(
            "[MetronomeEngine] Rebuilding {} stream after {:?}",
            self.backend.name(),
            request
        );

        // The old stream is already dead; its stop error is not actionable
        if let Err(err) = self.backend.stop() {
            tracing::debug!("[MetronomeEngine] Stop during recovery failed: {}", err);
        }

        match self.backend.start(self.start_context()) {
            Ok(()) => {
                self.recoveries.fetch_add(1, Ordering::SeqCst);
                tracing::info!("[MetronomeEngine] Stream recovered");
            }
            Err(err) => {
                log_audio_error(&err, "recover");
                *running = false;
            }
        }
    }
}

/// Control-plane handle to the click engine
pub struct MetronomeEngine {
    inner: Arc<EngineInner>,
    recovery: RecoveryWorker,
}

fn validate_meter(tempo_bpm: u32, clicks_per_beat: u32) -> Result<(), AudioError> {
    if tempo_bpm == 0 {
        return Err(AudioError::TempoInvalid { tempo_bpm });
    }
    if clicks_per_beat == 0 {
        return Err(AudioError::ClicksPerBeatInvalid { clicks_per_beat });
    }
    Ok(())
}

fn validate_sample_rate(sample_rate: u32) -> Result<(), AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::SampleRateInvalid { sample_rate });
    }
    Ok(())
}

fn validate_beats_per_bar(beats_per_bar: u32) -> Result<(), AudioError> {
    if beats_per_bar == 0 {
        return Err(AudioError::BeatsPerBarInvalid { beats_per_bar });
    }
    Ok(())
}

impl MetronomeEngine {
    /// Build an engine from configuration, decoding the click assets and
    /// selecting the platform backend.
    pub fn from_config(config: &AppConfig) -> Result<Self, AudioError> {
        validate_sample_rate(config.audio.sample_rate)?;
        let sounds = ClickSounds::load(&config.assets, config.audio.sample_rate).map_err(|err| {
            log_audio_error(&err, "load_click_sounds");
            err
        })?;
        Self::with_backend(config, sounds, platform_backend(&config.audio))
    }

    /// Build an engine around explicit sounds and backend.
    ///
    /// # Errors
    /// Rejects a zero tempo, subdivision or bar length in `config.metronome`,
    /// and a zero `config.audio.sample_rate`.
    pub fn with_backend(
        config: &AppConfig,
        sounds: ClickSounds,
        backend: Arc<dyn AudioBackend>,
    ) -> Result<Self, AudioError> {
        let meter = &config.metronome;
        validate_meter(meter.tempo_bpm, meter.clicks_per_beat)?;
        validate_beats_per_bar(meter.beats_per_bar)?;
        validate_sample_rate(config.audio.sample_rate)?;

        let (beat_tx, _) = broadcast::channel(64);
        let (recovery_tx, recovery_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(EngineInner {
            state: Arc::new(MetronomeState::new(meter.tempo_bpm, meter.clicks_per_beat)),
            sounds: Arc::new(sounds),
            backend,
            audio_config: config.audio.clone(),
            counter: Mutex::new(BeatCounter::new(meter.beats_per_bar, meter.clicks_per_beat)),
            running: Mutex::new(false),
            beat_tx,
            recovery_tx: recovery_tx.clone(),
            sequence: AtomicU64::new(0),
            recoveries: AtomicU64::new(0),
        });

        let recovery = RecoveryWorker::spawn(Arc::downgrade(&inner), recovery_tx, recovery_rx)?;

        tracing::info!(
            "[MetronomeEngine] Created: {} BPM, {} clicks/beat, {} beats/bar, backend={}",
            meter.tempo_bpm,
            meter.clicks_per_beat,
            meter.beats_per_bar,
            inner.backend.name()
        );

        Ok(Self { inner, recovery })
    }

    /// Update tempo and subdivision.
    ///
    /// Takes effect on the next render call. A click in progress keeps its
    /// cursor and completes under the new timing.
    ///
    /// # Errors
    /// `TempoInvalid` / `ClicksPerBeatInvalid` for zero values; the previous
    /// configuration stays in effect.
    pub fn configure(&self, tempo_bpm: u32, clicks_per_beat: u32) -> Result<(), AudioError> {
        validate_meter(tempo_bpm, clicks_per_beat).map_err(|err| {
            log_audio_error(&err, "configure");
            err
        })?;

        let mut counter = self.inner.lock_counter()?;
        let beats_per_bar = counter.beats_per_bar();
        counter.set_meter(beats_per_bar, clicks_per_beat);
        let position = counter.position();

        self.inner.state.configure(tempo_bpm, clicks_per_beat);
        self.inner
            .state
            .set_accent_position(position.beat, position.click);

        tracing::info!(
            "[MetronomeEngine] Configured {} BPM, {} clicks/beat",
            tempo_bpm,
            clicks_per_beat
        );
        Ok(())
    }

    /// Change the bar length used to wrap beats.
    pub fn set_beats_per_bar(&self, beats_per_bar: u32) -> Result<(), AudioError> {
        validate_beats_per_bar(beats_per_bar).map_err(|err| {
            log_audio_error(&err, "set_beats_per_bar");
            err
        })?;

        let mut counter = self.inner.lock_counter()?;
        let clicks_per_beat = counter.clicks_per_beat();
        counter.set_meter(beats_per_bar, clicks_per_beat);
        let position = counter.position();
        self.inner
            .state
            .set_accent_position(position.beat, position.click);
        Ok(())
    }

    /// Open the output stream and start rendering.
    ///
    /// # Errors
    /// `AlreadyRunning`, or whatever the backend reports when the stream
    /// cannot be opened.
    pub fn start(&self) -> Result<(), AudioError> {
        let mut running = self.inner.lock_running()?;
        if *running {
            let err = AudioError::AlreadyRunning;
            log_audio_error(&err, "start");
            return Err(err);
        }

        self.inner
            .backend
            .start(self.inner.start_context())
            .map_err(|err| {
                log_audio_error(&err, "start");
                err
            })?;

        *running = true;
        tracing::info!(
            "[MetronomeEngine] Started on {} backend",
            self.inner.backend.name()
        );
        Ok(())
    }

    /// Stop playback and return to the zero position.
    ///
    /// The stream is stopped before the shared state is reset, so the reset
    /// never races a render call. Sound sources are kept. Calling this on an
    /// idle engine still resets the state.
    pub fn stop(&self) -> Result<(), AudioError> {
        let mut running = self.inner.lock_running()?;
        if *running {
            self.inner.backend.stop().map_err(|err| {
                log_audio_error(&err, "stop");
                err
            })?;
            *running = false;
            tracing::info!("[MetronomeEngine] Stopped");
        }

        self.inner.state.reset();
        self.inner.lock_counter()?.reset();
        self.inner.sequence.store(0, Ordering::SeqCst);
        Ok(())
    }

    pub fn set_synchronized_mode(&self, enabled: bool) {
        self.inner.state.set_synchronized_mode(enabled);
    }

    pub fn set_synchronized_active(&self, active: bool) {
        self.inner.state.set_synchronized_active(active);
    }

    /// Read and clear the one-shot advance signal.
    pub fn consume_advance(&self) -> bool {
        self.inner.state.consume_advance()
    }

    /// Consume a pending advance, step the beat counter, move the accent
    /// position for the next click and publish a [`BeatEvent`].
    ///
    /// Returns `None` when no click completed since the last poll. Several
    /// completions between polls collapse into one advance.
    pub fn poll_advance(&self) -> Result<Option<BeatEvent>, AudioError> {
        if !self.inner.state.consume_advance() {
            return Ok(None);
        }

        let mut counter = self.inner.lock_counter()?;
        let position = counter.advance();
        self.inner
            .state
            .set_accent_position(position.beat, position.click);
        drop(counter);

        let event = BeatEvent {
            sequence: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            position,
        };
        // No subscribers is fine
        let _ = self.inner.beat_tx.send(event);
        Ok(Some(event))
    }

    pub fn subscribe_beats(&self) -> broadcast::Receiver<BeatEvent> {
        self.inner.beat_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock_running().map(|r| *r).unwrap_or(false)
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.inner.state.tempo_bpm()
    }

    pub fn clicks_per_beat(&self) -> u32 {
        self.inner.state.clicks_per_beat()
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.inner
            .lock_counter()
            .map(|c| c.beats_per_bar())
            .unwrap_or(1)
    }

    /// Click period at the configured sample rate.
    pub fn frames_per_click(&self) -> u32 {
        frames_per_click(
            self.inner.audio_config.sample_rate,
            self.tempo_bpm(),
            self.clicks_per_beat(),
        )
    }

    /// Current accent position as `(beat, click)`.
    pub fn accent_position(&self) -> (u32, u32) {
        self.inner.state.accent_position()
    }

    pub fn state(&self) -> &Arc<MetronomeState> {
        &self.inner.state
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    /// Streams successfully rebuilt by the recovery worker.
    pub fn recovery_count(&self) -> u64 {
        self.inner.recoveries.load(Ordering::SeqCst)
    }

    /// Enqueue a recovery request, as a stream error callback would.
    pub fn request_recovery(&self, request: RecoveryRequest) {
        let _ = self.recovery.sender().send(request);
    }
}

impl Drop for MetronomeEngine {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log_audio_error(&err, "drop");
        }
        self.recovery.shutdown();
    }
}

#[cfg(test)]
mod tests;
