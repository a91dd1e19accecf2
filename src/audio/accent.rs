//! Accent resolution - maps a position in the bar to a click sound tier
//!
//! Downbeats get the strong click, the first click of every other beat gets
//! the medium click, and subdivisions are always weak.

use serde::{Deserialize, Serialize};

/// Loudness/timbre tier of a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accent {
    /// First click of the first beat of a bar
    Strong,
    /// First click of any other beat
    Medium,
    /// Any subdivision click
    Weak,
}

/// Resolve the accent for a 1-based `(beat, click)` position.
///
/// Pure and allocation-free; safe to call from the audio thread.
///
/// # Examples
/// ```
/// use click_engine::audio::accent::{resolve_accent, Accent};
///
/// assert_eq!(resolve_accent(1, 1), Accent::Strong);
/// assert_eq!(resolve_accent(2, 1), Accent::Medium);
/// assert_eq!(resolve_accent(2, 2), Accent::Weak);
/// ```
#[inline]
pub fn resolve_accent(beat_position: u32, click_position: u32) -> Accent {
    match (beat_position == 1, click_position == 1) {
        (true, true) => Accent::Strong,
        (false, true) => Accent::Medium,
        (_, false) => Accent::Weak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downbeat_is_strong() {
        assert_eq!(resolve_accent(1, 1), Accent::Strong);
    }

    #[test]
    fn test_subdivision_of_first_beat_is_weak() {
        assert_eq!(resolve_accent(1, 2), Accent::Weak);
        assert_eq!(resolve_accent(1, 4), Accent::Weak);
    }

    #[test]
    fn test_other_beat_starts_are_medium() {
        for beat in 2..=7 {
            assert_eq!(resolve_accent(beat, 1), Accent::Medium, "beat {}", beat);
        }
    }

    #[test]
    fn test_other_beat_subdivisions_are_weak() {
        assert_eq!(resolve_accent(2, 2), Accent::Weak);
        assert_eq!(resolve_accent(3, 3), Accent::Weak);
    }
}
