//! Engine module housing the control plane around the click renderer.
//!
//! `backend` abstracts the output stream (Oboe, CPAL, offline), `core` holds
//! the `MetronomeEngine` facade, `beat_counter` tracks bar/beat/click on the
//! control thread and `recovery` rebuilds streams after device errors.

pub mod backend;
pub mod beat_counter;
pub mod core;
pub mod recovery;

#[cfg(target_os = "android")]
pub use backend::OboeBackend;
#[cfg(not(target_os = "android"))]
pub use backend::CpalBackend;
pub use backend::{platform_backend, AudioBackend, EngineStartContext, OfflineBackend};
pub use beat_counter::{BeatCounter, BeatPosition};
pub use core::{BeatEvent, MetronomeEngine};
pub use recovery::{Recoverable, RecoveryRequest, RecoveryWorker};
