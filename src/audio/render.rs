//! Click render loop - the real-time entry point of the engine
//!
//! [`ClickRenderer`] is moved into the platform output callback and invoked
//! once per buffer. For every output frame it decides whether to emit the
//! active click, tracks the cursor inside that click and raises the one-shot
//! advance signal when a click period completes.
//!
//! # Real-Time Safety
//! - No heap allocations (sources are pre-decoded, output is caller-owned)
//! - No locks (one atomic snapshot per call, one cursor store at the end)
//! - No I/O and no logging
//! - Loop bound is exactly the number of requested frames
//!
//! # Architecture
//! ```text
//! control thread ──configure/sync/accent──> MetronomeState
//!                                              │ snapshot()
//! audio callback ──> ClickRenderer::render ────┘
//!                         └─> signal_advance() ──> MetronomeEngine::poll_advance()
//! ```

use std::sync::Arc;

use super::metronome::MetronomeState;
use super::sound_source::ClickSounds;

/// Per-call summary returned by the render loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Frames written (equals the requested frame count)
    pub frames: usize,
    /// Click periods that completed during the call
    pub clicks_completed: u32,
    /// Frame index of the last completed click, if any
    pub last_click_frame: Option<usize>,
}

/// Render-side owner of the click cursor
pub struct ClickRenderer {
    state: Arc<MetronomeState>,
    sounds: Arc<ClickSounds>,
    sample_rate: u32,
}

impl ClickRenderer {
    pub fn new(state: Arc<MetronomeState>, sounds: Arc<ClickSounds>, sample_rate: u32) -> Self {
        Self {
            state,
            sounds,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Adopt the rate the device actually granted. Zero is ignored.
    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate > 0 {
            self.sample_rate = sample_rate;
        }
    }

    pub fn state(&self) -> &Arc<MetronomeState> {
        &self.state
    }

    /// Fill a mono output buffer.
    #[inline]
    pub fn render(&mut self, output: &mut [f32]) -> RenderReport {
        self.render_interleaved(output, 1)
    }

    /// Fill an interleaved buffer, writing the same click sample to every
    /// channel of a frame.
    ///
    /// The accent is resolved once from the snapshot; a click that completes
    /// mid-buffer is followed by the same tier until the control thread
    /// moves the accent position.
    pub fn render_interleaved(&mut self, output: &mut [f32], channels: usize) -> RenderReport {
        let channels = channels.max(1);
        let snapshot = self.state.snapshot();
        let source = self.sounds.select(snapshot.accent()).data();
        let period = snapshot.frames_per_click(self.sample_rate);
        let emitting = snapshot.is_emitting();

        let mut cursor = self.state.frames_written();
        let mut report = RenderReport::default();

        for (index, frame) in output.chunks_mut(channels).enumerate() {
            let sample = if emitting {
                let value = source.get(cursor as usize).copied().unwrap_or(0.0);
                cursor = cursor.saturating_add(1);
                // `>=` also completes a click whose cursor already passed a
                // period shortened by configure()
                if cursor >= period {
                    cursor = 0;
                    self.state.signal_advance();
                    report.clicks_completed += 1;
                    report.last_click_frame = Some(index);
                }
                value
            } else {
                0.0
            };

            frame.fill(sample);
            report.frames += 1;
        }

        self.state.store_frames_written(cursor);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sound_source::ClickSoundSource;

    fn tiered_sounds() -> Arc<ClickSounds> {
        Arc::new(ClickSounds::new(
            ClickSoundSource::from_samples(vec![1.0; 4]),
            ClickSoundSource::from_samples(vec![0.5; 4]),
            ClickSoundSource::from_samples(vec![0.25; 4]),
        ))
    }

    // 600 BPM at 100 Hz gives a 10-frame click period
    fn renderer(clicks_per_beat: u32) -> ClickRenderer {
        let state = Arc::new(MetronomeState::new(600, clicks_per_beat));
        ClickRenderer::new(state, tiered_sounds(), 100)
    }

    #[test]
    fn test_copies_source_then_pads_with_silence() {
        let mut renderer = renderer(1);
        let mut out = vec![9.0; 10];
        renderer.render(&mut out);
        assert_eq!(out, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_advance_raised_on_last_frame_of_period() {
        let mut renderer = renderer(1);
        let mut out = vec![0.0; 9];
        let report = renderer.render(&mut out);
        assert_eq!(report.clicks_completed, 0);
        assert!(!renderer.state().is_advance_pending());
        assert_eq!(renderer.state().frames_written(), 9);

        let mut out = vec![0.0; 1];
        let report = renderer.render(&mut out);
        assert_eq!(report.clicks_completed, 1);
        assert_eq!(report.last_click_frame, Some(0));
        assert!(renderer.state().consume_advance());
        assert_eq!(renderer.state().frames_written(), 0);
    }

    #[test]
    fn test_accent_read_once_per_call() {
        let mut renderer = renderer(2);
        renderer.state().set_accent_position(2, 1);
        let mut out = vec![0.0; 2];
        renderer.render(&mut out);
        assert_eq!(out, vec![0.5, 0.5]);

        renderer.state().set_accent_position(2, 2);
        renderer.render(&mut out);
        assert_eq!(out, vec![0.25, 0.25]);
    }

    #[test]
    fn test_interleaved_duplicates_across_channels() {
        let mut renderer = renderer(1);
        let mut out = vec![0.0; 12];
        let report = renderer.render_interleaved(&mut out, 2);
        assert_eq!(report.frames, 6);
        assert_eq!(&out[..8], &[1.0; 8]);
        assert_eq!(&out[8..], &[0.0; 4]);
        assert_eq!(renderer.state().frames_written(), 6);
    }

    #[test]
    fn test_gated_off_is_silent_and_frozen() {
        let mut renderer = renderer(1);
        let mut out = vec![0.0; 3];
        renderer.render(&mut out);

        renderer.state().set_synchronized_mode(true);
        let mut out = vec![7.0; 50];
        let report = renderer.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(report.clicks_completed, 0);
        assert_eq!(renderer.state().frames_written(), 3);

        // Pulse on: resumes mid-click instead of restarting
        renderer.state().set_synchronized_active(true);
        let mut out = vec![0.0; 2];
        renderer.render(&mut out);
        assert_eq!(out, vec![1.0, 0.0]);
        assert_eq!(renderer.state().frames_written(), 5);
    }

    #[test]
    fn test_shortened_period_completes_on_next_frame() {
        let mut renderer = renderer(1);
        let mut out = vec![0.0; 8];
        renderer.render(&mut out);

        // Period drops from 10 to 5 frames while the cursor sits at 8
        renderer.state().configure(600, 2);
        let mut out = vec![0.0; 1];
        let report = renderer.render(&mut out);
        assert_eq!(report.clicks_completed, 1);
        assert_eq!(renderer.state().frames_written(), 0);
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let mut renderer = renderer(1);
        let report = renderer.render(&mut []);
        assert_eq!(report, RenderReport::default());
        assert_eq!(renderer.state().frames_written(), 0);
    }

    #[test]
    fn test_set_sample_rate_ignores_zero() {
        let mut renderer = renderer(1);
        renderer.set_sample_rate(0);
        assert_eq!(renderer.sample_rate(), 100);
        renderer.set_sample_rate(48000);
        assert_eq!(renderer.sample_rate(), 48000);
    }
}
