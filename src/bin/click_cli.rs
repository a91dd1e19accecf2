use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use click_engine::audio::frames_per_click;
use click_engine::audio::sound_source::ClickSounds;
use click_engine::config::AppConfig;
use click_engine::engine::{BeatEvent, MetronomeEngine, OfflineBackend};
use click_engine::logging;

#[derive(Parser, Debug)]
#[command(name = "click_cli", about = "Metronome click engine harness")]
struct Cli {
    /// JSON configuration file (defaults to assets/metronome_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct MeterArgs {
    /// Tempo in beats per minute
    #[arg(long)]
    tempo: Option<u32>,
    /// Subdivision clicks per beat
    #[arg(long)]
    clicks_per_beat: Option<u32>,
    /// Beats per bar
    #[arg(long)]
    beats_per_bar: Option<u32>,
    /// Output sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render clicks offline into a mono WAV file
    Render {
        #[command(flatten)]
        meter: MeterArgs,
        #[arg(long, default_value_t = 4.0)]
        seconds: f32,
        #[arg(long)]
        output: PathBuf,
        /// Frames per simulated audio callback
        #[arg(long, default_value_t = 256)]
        block: usize,
        /// Print beat events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Play clicks through the default output device
    Play {
        #[command(flatten)]
        meter: MeterArgs,
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        #[arg(long)]
        json: bool,
    },
    /// Print the click period for a meter
    Info {
        #[command(flatten)]
        meter: MeterArgs,
    },
}

fn main() -> ExitCode {
    logging::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Render {
            meter,
            seconds,
            output,
            block,
            json,
        } => run_render(apply_meter(base, &meter), seconds, output, block, json),
        Commands::Play {
            meter,
            seconds,
            json,
        } => run_play(apply_meter(base, &meter), seconds, json),
        Commands::Info { meter } => run_info(&apply_meter(base, &meter)),
    }
}

fn apply_meter(mut config: AppConfig, meter: &MeterArgs) -> AppConfig {
    if let Some(tempo) = meter.tempo {
        config.metronome.tempo_bpm = tempo;
    }
    if let Some(clicks) = meter.clicks_per_beat {
        config.metronome.clicks_per_beat = clicks;
    }
    if let Some(beats) = meter.beats_per_bar {
        config.metronome.beats_per_bar = beats;
    }
    if let Some(rate) = meter.sample_rate {
        config.audio.sample_rate = rate;
    }
    config
}

fn report_beat(event: &BeatEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!(
            "#{:<5} bar {:<4} beat {} click {} {:?}",
            event.sequence,
            event.position.bar,
            event.position.beat,
            event.position.click,
            event.position.accent
        );
    }
    Ok(())
}

fn run_render(
    config: AppConfig,
    seconds: f32,
    output: PathBuf,
    block: usize,
    json: bool,
) -> Result<ExitCode> {
    if block == 0 {
        bail!("--block must be at least 1 frame");
    }
    if config.audio.sample_rate == 0 {
        bail!("--sample-rate must be positive");
    }

    let sample_rate = config.audio.sample_rate;
    let sounds = ClickSounds::load(&config.assets, sample_rate).context("loading click sounds")?;
    let backend = Arc::new(OfflineBackend::new());
    let engine = MetronomeEngine::with_backend(&config, sounds, backend.clone())
        .context("creating engine")?;
    engine.start()?;

    let total_frames = (seconds.max(0.0) * sample_rate as f32).round() as usize;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output, spec)
        .with_context(|| format!("creating {}", output.display()))?;

    let mut buffer = vec![0.0f32; block];
    let mut written = 0;
    let mut beats = 0u64;
    while written < total_frames {
        let frames = block.min(total_frames - written);
        let chunk = &mut buffer[..frames];
        backend.render_into(chunk)?;
        for sample in chunk.iter() {
            writer.write_sample(*sample)?;
        }
        written += frames;

        if let Some(event) = engine.poll_advance()? {
            beats += 1;
            report_beat(&event, json)?;
        }
    }
    writer.finalize()?;
    engine.stop()?;

    if !json {
        println!(
            "Wrote {} frames ({} beats) to {}",
            written,
            beats,
            output.display()
        );
    }
    Ok(ExitCode::from(0))
}

fn run_play(config: AppConfig, seconds: f32, json: bool) -> Result<ExitCode> {
    let engine = MetronomeEngine::from_config(&config).context("creating engine")?;
    engine.start()?;
    tracing::info!(
        "Playing on {} backend for {:.1}s",
        engine.backend_name(),
        seconds
    );

    let deadline = Instant::now() + Duration::from_secs_f32(seconds.max(0.0));
    while Instant::now() < deadline {
        if let Some(event) = engine.poll_advance()? {
            report_beat(&event, json)?;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    engine.stop()?;
    Ok(ExitCode::from(0))
}

fn run_info(config: &AppConfig) -> Result<ExitCode> {
    let meter = &config.metronome;
    let sample_rate = config.audio.sample_rate;
    let frames = frames_per_click(sample_rate, meter.tempo_bpm, meter.clicks_per_beat);
    let millis = if sample_rate > 0 {
        frames as f64 * 1000.0 / sample_rate as f64
    } else {
        0.0
    };
    println!(
        "{} BPM, {} clicks/beat, {} beats/bar @ {} Hz: {} frames per click ({:.2} ms)",
        meter.tempo_bpm,
        meter.clicks_per_beat,
        meter.beats_per_bar,
        sample_rate,
        frames,
        millis
    );
    Ok(ExitCode::from(0))
}
