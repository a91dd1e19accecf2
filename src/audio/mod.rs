// Audio module - click rendering and low-latency output

pub mod accent;
#[cfg(target_os = "android")]
pub mod callback;
pub mod engine;
#[cfg(not(target_os = "android"))]
pub mod engine_cpal;
pub mod metronome;
pub mod render;
pub mod sound_source;

// Re-export commonly used types for convenience
pub use accent::{resolve_accent, Accent};
pub use engine::AudioEngine;
pub use metronome::{frames_per_click, MetronomeSnapshot, MetronomeState};
pub use render::{ClickRenderer, RenderReport};
pub use sound_source::{ClickSoundSource, ClickSounds};
