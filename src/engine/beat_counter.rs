//! Control-plane beat counter
//!
//! Bar length and meter are control concerns, so the render loop never moves
//! the accent position itself. Each consumed advance signal steps this
//! counter, and the engine copies the new position into `MetronomeState`.

use serde::{Deserialize, Serialize};

use crate::audio::accent::{resolve_accent, Accent};

/// Position of the click that is about to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatPosition {
    /// Completed bars since start/stop
    pub bar: u64,
    /// 1-based beat within the bar
    pub beat: u32,
    /// 1-based click within the beat
    pub click: u32,
    pub accent: Accent,
}

#[derive(Debug, Clone)]
pub struct BeatCounter {
    beats_per_bar: u32,
    clicks_per_beat: u32,
    bar: u64,
    beat: u32,
    click: u32,
}

impl BeatCounter {
    /// Both arguments must be non-zero; the engine validates them first.
    pub fn new(beats_per_bar: u32, clicks_per_beat: u32) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
            clicks_per_beat: clicks_per_beat.max(1),
            bar: 0,
            beat: 1,
            click: 1,
        }
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn clicks_per_beat(&self) -> u32 {
        self.clicks_per_beat
    }

    /// Change the meter, clamping the current position into the new range
    /// so the next advance wraps normally.
    pub fn set_meter(&mut self, beats_per_bar: u32, clicks_per_beat: u32) {
        self.beats_per_bar = beats_per_bar.max(1);
        self.clicks_per_beat = clicks_per_beat.max(1);
        self.beat = self.beat.min(self.beats_per_bar);
        self.click = self.click.min(self.clicks_per_beat);
    }

    pub fn position(&self) -> BeatPosition {
        BeatPosition {
            bar: self.bar,
            beat: self.beat,
            click: self.click,
            accent: resolve_accent(self.beat, self.click),
        }
    }

    /// Step to the next click, wrapping subdivision into beat and beat into bar.
    pub fn advance(&mut self) -> BeatPosition {
        if self.click >= self.clicks_per_beat {
            self.click = 1;
            if self.beat >= self.beats_per_bar {
                self.beat = 1;
                self.bar += 1;
            } else {
                self.beat += 1;
            }
        } else {
            self.click += 1;
        }
        self.position()
    }

    pub fn reset(&mut self) {
        self.bar = 0;
        self.beat = 1;
        self.click = 1;
    }
}
