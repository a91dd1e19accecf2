//! Metronome state - beat/sample-position bookkeeping shared between threads
//!
//! The control thread writes tempo, subdivision, accent position and the
//! synchronization flags; the render loop reads them once per callback via
//! [`MetronomeState::snapshot`] and owns the click cursor. Every field is an
//! atomic so neither side ever waits on the other.
//!
//! Key features:
//! - Wait-free updates (plain atomic loads/stores, no locks)
//! - Edge-triggered advance flag consumed with an atomic swap
//! - Zero allocations after construction

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::accent::{resolve_accent, Accent};

/// Converts tempo and subdivision into the length of one click period.
///
/// Formula: `round(sample_rate * 60 / (tempo_bpm * clicks_per_beat))`, never
/// less than one frame. Callers must pass non-zero tempo and subdivision;
/// zero is rejected upstream by the engine's `configure`.
///
/// # Examples
/// ```
/// use click_engine::audio::metronome::frames_per_click;
///
/// assert_eq!(frames_per_click(44100, 120, 1), 22050);
/// assert_eq!(frames_per_click(48000, 120, 2), 12000);
/// ```
#[inline]
pub fn frames_per_click(sample_rate: u32, tempo_bpm: u32, clicks_per_beat: u32) -> u32 {
    let numerator = sample_rate as u64 * 60;
    let denominator = (tempo_bpm as u64 * clicks_per_beat as u64).max(1);
    let frames = (numerator + denominator / 2) / denominator;
    frames.clamp(1, u32::MAX as u64) as u32
}

/// Coherent copy of the control fields, taken once per render call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeSnapshot {
    pub tempo_bpm: u32,
    pub clicks_per_beat: u32,
    pub accent_beat_position: u32,
    pub accent_click_position: u32,
    pub synchronized_mode: bool,
    pub synchronized_active: bool,
}

impl MetronomeSnapshot {
    #[inline]
    pub fn accent(&self) -> Accent {
        resolve_accent(self.accent_beat_position, self.accent_click_position)
    }

    /// Whether playback may advance: always when free-running, only while
    /// the external pulse is on in synchronized mode.
    #[inline]
    pub fn is_emitting(&self) -> bool {
        !self.synchronized_mode || self.synchronized_active
    }

    #[inline]
    pub fn frames_per_click(&self, sample_rate: u32) -> u32 {
        frames_per_click(sample_rate, self.tempo_bpm, self.clicks_per_beat)
    }
}

/// Shared metronome state
///
/// Shared as `Arc<MetronomeState>` between the engine facade and the
/// renderer living inside the audio callback.
#[derive(Debug)]
pub struct MetronomeState {
    tempo_bpm: AtomicU32,
    clicks_per_beat: AtomicU32,
    accent_beat_position: AtomicU32,
    accent_click_position: AtomicU32,
    /// Samples written into the current click; render-owned
    frames_written: AtomicU32,
    pending_advance: AtomicBool,
    synchronized_mode: AtomicBool,
    synchronized_active: AtomicBool,
}

impl MetronomeState {
    pub fn new(tempo_bpm: u32, clicks_per_beat: u32) -> Self {
        Self {
            tempo_bpm: AtomicU32::new(tempo_bpm),
            clicks_per_beat: AtomicU32::new(clicks_per_beat),
            accent_beat_position: AtomicU32::new(1),
            accent_click_position: AtomicU32::new(1),
            frames_written: AtomicU32::new(0),
            pending_advance: AtomicBool::new(false),
            synchronized_mode: AtomicBool::new(false),
            synchronized_active: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> MetronomeSnapshot {
        MetronomeSnapshot {
            tempo_bpm: self.tempo_bpm.load(Ordering::Relaxed),
            clicks_per_beat: self.clicks_per_beat.load(Ordering::Relaxed),
            accent_beat_position: self.accent_beat_position.load(Ordering::Relaxed),
            accent_click_position: self.accent_click_position.load(Ordering::Relaxed),
            synchronized_mode: self.synchronized_mode.load(Ordering::Acquire),
            synchronized_active: self.synchronized_active.load(Ordering::Acquire),
        }
    }

    /// Store new tempo and subdivision. Values are not validated here.
    pub fn configure(&self, tempo_bpm: u32, clicks_per_beat: u32) {
        self.tempo_bpm.store(tempo_bpm, Ordering::Relaxed);
        self.clicks_per_beat.store(clicks_per_beat, Ordering::Relaxed);
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.tempo_bpm.load(Ordering::Relaxed)
    }

    pub fn clicks_per_beat(&self) -> u32 {
        self.clicks_per_beat.load(Ordering::Relaxed)
    }

    pub fn set_accent_position(&self, beat_position: u32, click_position: u32) {
        self.accent_beat_position
            .store(beat_position, Ordering::Relaxed);
        self.accent_click_position
            .store(click_position, Ordering::Relaxed);
    }

    pub fn accent_position(&self) -> (u32, u32) {
        (
            self.accent_beat_position.load(Ordering::Relaxed),
            self.accent_click_position.load(Ordering::Relaxed),
        )
    }

    pub fn set_synchronized_mode(&self, enabled: bool) {
        self.synchronized_mode.store(enabled, Ordering::Release);
    }

    pub fn set_synchronized_active(&self, active: bool) {
        self.synchronized_active.store(active, Ordering::Release);
    }

    pub fn is_synchronized_mode(&self) -> bool {
        self.synchronized_mode.load(Ordering::Acquire)
    }

    pub fn is_synchronized_active(&self) -> bool {
        self.synchronized_active.load(Ordering::Acquire)
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Cursor write-back from the render loop
    #[inline]
    pub(crate) fn store_frames_written(&self, frames: u32) {
        self.frames_written.store(frames, Ordering::Relaxed);
    }

    /// Raise the one-shot advance signal (render side)
    #[inline]
    pub(crate) fn signal_advance(&self) {
        self.pending_advance.store(true, Ordering::Release);
    }

    /// Peek at the advance signal without clearing it
    pub fn is_advance_pending(&self) -> bool {
        self.pending_advance.load(Ordering::Acquire)
    }

    /// Read and clear the advance signal in one atomic step.
    ///
    /// Returns `true` if a click completed since the last call.
    pub fn consume_advance(&self) -> bool {
        self.pending_advance.swap(false, Ordering::AcqRel)
    }

    /// Return to the zero position. Tempo and subdivision are kept.
    ///
    /// Must not race a render call: the engine only calls this after the
    /// output stream has been stopped.
    pub fn reset(&self) {
        self.frames_written.store(0, Ordering::Relaxed);
        self.pending_advance.store(false, Ordering::Release);
        self.synchronized_mode.store(false, Ordering::Release);
        self.synchronized_active.store(false, Ordering::Release);
        self.set_accent_position(1, 1);
    }
}
