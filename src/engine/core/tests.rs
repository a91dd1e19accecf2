use super::*;
use crate::audio::accent::Accent;
use crate::audio::sound_source::ClickSoundSource;
use crate::engine::backend::OfflineBackend;
use std::time::{Duration, Instant};

// 600 BPM at 100 Hz: 10-frame click period
fn offline_engine(clicks_per_beat: u32, beats_per_bar: u32) -> (MetronomeEngine, Arc<OfflineBackend>) {
    let mut config = AppConfig::default();
    config.audio.sample_rate = 100;
    config.metronome.tempo_bpm = 600;
    config.metronome.clicks_per_beat = clicks_per_beat;
    config.metronome.beats_per_bar = beats_per_bar;

    let sounds = ClickSounds::new(
        ClickSoundSource::from_samples(vec![1.0; 3]),
        ClickSoundSource::from_samples(vec![0.5; 3]),
        ClickSoundSource::from_samples(vec![0.25; 3]),
    );
    let backend = Arc::new(OfflineBackend::new());
    let engine = MetronomeEngine::with_backend(&config, sounds, backend.clone()).unwrap();
    (engine, backend)
}

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_with_backend_rejects_invalid_meter() {
    let mut config = AppConfig::default();
    config.metronome.tempo_bpm = 0;
    let result = MetronomeEngine::with_backend(
        &config,
        ClickSounds::synthesized(100),
        Arc::new(OfflineBackend::new()),
    );
    assert!(matches!(result, Err(AudioError::TempoInvalid { tempo_bpm: 0 })));

    let mut config = AppConfig::default();
    config.metronome.beats_per_bar = 0;
    let result = MetronomeEngine::with_backend(
        &config,
        ClickSounds::synthesized(100),
        Arc::new(OfflineBackend::new()),
    );
    assert!(matches!(
        result,
        Err(AudioError::BeatsPerBarInvalid { beats_per_bar: 0 })
    ));
}

#[test]
fn test_with_backend_rejects_zero_sample_rate() {
    let mut config = AppConfig::default();
    config.audio.sample_rate = 0;
    let result = MetronomeEngine::with_backend(
        &config,
        ClickSounds::synthesized(100),
        Arc::new(OfflineBackend::new()),
    );
    assert!(matches!(
        result,
        Err(AudioError::SampleRateInvalid { sample_rate: 0 })
    ));
    assert!(matches!(
        MetronomeEngine::from_config(&config),
        Err(AudioError::SampleRateInvalid { sample_rate: 0 })
    ));
}

#[test]
fn test_configure_rejects_zero_and_keeps_previous() {
    let (engine, _backend) = offline_engine(1, 4);

    assert_eq!(
        engine.configure(0, 2),
        Err(AudioError::TempoInvalid { tempo_bpm: 0 })
    );
    assert_eq!(
        engine.configure(90, 0),
        Err(AudioError::ClicksPerBeatInvalid { clicks_per_beat: 0 })
    );
    assert_eq!(engine.tempo_bpm(), 600);
    assert_eq!(engine.clicks_per_beat(), 1);

    engine.configure(300, 2).unwrap();
    assert_eq!(engine.tempo_bpm(), 300);
    assert_eq!(engine.clicks_per_beat(), 2);
    assert_eq!(engine.frames_per_click(), 10);
}

#[test]
fn test_start_twice_fails() {
    let (engine, backend) = offline_engine(1, 4);
    engine.start().unwrap();
    assert!(engine.is_running());
    assert!(backend.is_running());
    assert_eq!(engine.start(), Err(AudioError::AlreadyRunning));
}

#[test]
fn test_poll_advance_moves_accent_and_publishes() {
    let (engine, backend) = offline_engine(2, 2);
    let mut beats = engine.subscribe_beats();
    engine.start().unwrap();

    assert_eq!(engine.poll_advance().unwrap(), None);

    let block = backend.render_block(10).unwrap();
    assert_eq!(&block[..4], &[1.0, 1.0, 1.0, 0.0]);

    let event = engine.poll_advance().unwrap().expect("one click completed");
    assert_eq!(event.sequence, 1);
    assert_eq!((event.position.beat, event.position.click), (1, 2));
    assert_eq!(event.position.accent, Accent::Weak);
    assert_eq!(engine.accent_position(), (1, 2));
    assert_eq!(beats.try_recv().unwrap(), event);

    // Next period plays the weak click
    let block = backend.render_block(10).unwrap();
    assert_eq!(block[0], 0.25);

    let event = engine.poll_advance().unwrap().unwrap();
    assert_eq!((event.position.beat, event.position.click), (2, 1));
    assert_eq!(event.position.accent, Accent::Medium);

    let block = backend.render_block(10).unwrap();
    assert_eq!(block[0], 0.5);
}

#[test]
fn test_consume_advance_clears_flag() {
    let (engine, backend) = offline_engine(1, 4);
    engine.start().unwrap();
    backend.render_block(10).unwrap();
    assert!(engine.consume_advance());
    assert!(!engine.consume_advance());
    assert_eq!(engine.poll_advance().unwrap(), None);
}

#[test]
fn test_stop_resets_to_fresh_state() {
    let (engine, backend) = offline_engine(2, 4);
    engine.start().unwrap();
    backend.render_block(13).unwrap();
    engine.poll_advance().unwrap();
    engine.set_synchronized_mode(true);
    engine.set_synchronized_active(true);
    backend.render_block(4).unwrap();

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert!(!backend.is_running());

    let (fresh, fresh_backend) = offline_engine(2, 4);
    assert_eq!(engine.state().snapshot(), fresh.state().snapshot());
    assert_eq!(engine.state().frames_written(), 0);
    assert!(!engine.state().is_advance_pending());

    // Second stop on an idle engine is harmless
    engine.stop().unwrap();

    engine.start().unwrap();
    fresh.start().unwrap();
    assert_eq!(
        backend.render_block(25).unwrap(),
        fresh_backend.render_block(25).unwrap()
    );
}

#[test]
fn test_synchronized_mode_gates_playback() {
    let (engine, backend) = offline_engine(1, 4);
    engine.start().unwrap();
    engine.set_synchronized_mode(true);

    let block = backend.render_block(30).unwrap();
    assert!(block.iter().all(|s| *s == 0.0));
    assert_eq!(engine.state().frames_written(), 0);
    assert_eq!(engine.poll_advance().unwrap(), None);

    engine.set_synchronized_active(true);
    let block = backend.render_block(10).unwrap();
    assert_eq!(block[0], 1.0);
    assert!(engine.poll_advance().unwrap().is_some());
}

#[test]
fn test_set_beats_per_bar() {
    let (engine, backend) = offline_engine(1, 4);
    assert_eq!(
        engine.set_beats_per_bar(0),
        Err(AudioError::BeatsPerBarInvalid { beats_per_bar: 0 })
    );
    engine.set_beats_per_bar(2).unwrap();
    assert_eq!(engine.beats_per_bar(), 2);

    engine.start().unwrap();
    let mut accents = Vec::new();
    for _ in 0..4 {
        backend.render_block(10).unwrap();
        accents.push(engine.poll_advance().unwrap().unwrap().position.accent);
    }
    assert_eq!(
        accents,
        vec![Accent::Medium, Accent::Strong, Accent::Medium, Accent::Strong]
    );
}

#[test]
fn test_recovery_rebuilds_stream() {
    let (engine, backend) = offline_engine(1, 4);
    engine.start().unwrap();
    backend.render_block(4).unwrap();

    backend
        .simulate_stream_error(RecoveryRequest::Disconnected)
        .unwrap();

    assert!(wait_for(|| engine.recovery_count() == 1));
    assert_eq!(backend.start_count(), 2);
    assert!(engine.is_running());

    // Cursor survives the rebuild
    assert_eq!(engine.state().frames_written(), 4);
    let block = backend.render_block(6).unwrap();
    assert_eq!(block, vec![0.0; 6]);
    assert!(engine.consume_advance());
}

#[test]
fn test_recovery_ignored_after_stop() {
    let (engine, backend) = offline_engine(1, 4);
    engine.start().unwrap();
    engine.stop().unwrap();

    engine.request_recovery(RecoveryRequest::Disconnected);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(engine.recovery_count(), 0);
    assert_eq!(backend.start_count(), 1);
    assert!(!backend.is_running());
}
