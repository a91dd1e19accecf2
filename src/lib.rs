// Click Engine Core - Rust Metronome Engine
// Real-time click rendering with a lock-free control/audio split

// Module declarations
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use audio::{Accent, ClickRenderer, ClickSoundSource, ClickSounds, MetronomeState};
pub use config::AppConfig;
pub use engine::{BeatEvent, BeatPosition, MetronomeEngine, OfflineBackend, RecoveryRequest};
pub use error::{AudioError, ErrorCode};

#[cfg(target_os = "android")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "android")]
static ANDROID_CONTEXT_READY: AtomicBool = AtomicBool::new(false);

/// Whether `JNI_OnLoad` has handed the JavaVM to `ndk-context`.
#[cfg(target_os = "android")]
pub(crate) fn android_context_ready() -> bool {
    ANDROID_CONTEXT_READY.load(Ordering::Acquire)
}

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function initializes the Android context required by oboe-rs
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    logging::init_logging();

    tracing::info!("JNI_OnLoad called - initializing Android context");

    // ndk-context refuses a second initialization
    if !ANDROID_CONTEXT_READY.swap(true, Ordering::AcqRel) {
        // SAFETY: the JavaVM pointer is valid for the life of the process and
        // this runs before any Oboe stream is opened
        unsafe {
            ndk_context::initialize_android_context(
                vm.get_java_vm_pointer() as *mut std::ffi::c_void,
                std::ptr::null_mut(),
            );
        }
        tracing::info!("Android context initialized successfully");
    }

    jni::sys::JNI_VERSION_1_6
}
