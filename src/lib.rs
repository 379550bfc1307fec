pub mod core;
pub mod models;
pub mod platform;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crate::core::config::{GameConfig, Variant};
use crate::core::feedback_channel::FeedbackChannel;
use crate::core::random::{RandomSource, RngSource};
use crate::core::session_loop::{SessionLoop, SessionSummary};
use crate::models::game::SessionPhase;
use crate::platform::{speech_for_config, CurlSimulator, ImageSurface, PoseSource, ReplaySource};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Frames per synthetic curl in the demo
const DEMO_FRAMES_PER_REP: u32 = 40;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Pose-driven balloon exercise game", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session from recorded detector output (JSON lines)
    Run(RunArgs),

    /// Elbow curl session on synthetic frames
    Demo(DemoArgs),

    /// Print or save the default configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON-lines pose recording
    #[arg(long)]
    replay: PathBuf,

    /// Configuration file (defaults to ~/.coach/config.json when present)
    #[arg(long, env = "COACH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured game
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Write every rendered frame as PNG into this directory
    #[arg(long)]
    frames_out: Option<PathBuf>,

    /// Seed target placement for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Restart after a finished session until this many rounds were played
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Stop each round after this many frames
    #[arg(long)]
    max_frames: Option<u64>,
}

#[derive(Args)]
struct DemoArgs {
    /// Number of curls to simulate
    #[arg(long, default_value_t = 12)]
    reps: u32,

    #[arg(long, env = "COACH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    frames_out: Option<PathBuf>,

    /// Drop the detection on every Nth frame
    #[arg(long)]
    dropout_every: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Balloon,
    Elbow,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Balloon => Variant::Balloon,
            VariantArg::Elbow => Variant::Elbow,
        }
    }
}

/// Application entry point
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_replay(args),
        Commands::Demo(args) => run_demo(args),
        Commands::Config { output } => write_default_config(output.as_deref()),
    }
}

fn run_replay(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(variant) = args.variant {
        config.variant = variant.into();
        config.validate()?;
    }

    let source = ReplaySource::open(&args.replay)
        .with_context(|| format!("Failed to open replay {}", args.replay.display()))?;

    play(
        &config,
        source,
        args.frames_out.as_deref(),
        args.seed,
        args.rounds.max(1),
        args.max_frames,
    )
}

fn run_demo(args: DemoArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.variant = Variant::Elbow;
    config.validate()?;

    let source = CurlSimulator::new(config.monitored_arm, args.reps, DEMO_FRAMES_PER_REP)
        .with_dropouts(args.dropout_every);

    play(&config, source, args.frames_out.as_deref(), args.seed, 1, None)
}

fn play<S: PoseSource>(
    config: &GameConfig,
    source: S,
    frames_out: Option<&Path>,
    seed: Option<u64>,
    rounds: u32,
    max_frames: Option<u64>,
) -> Result<()> {
    let surface = match frames_out {
        Some(dir) => ImageSurface::with_output_dir(dir)
            .with_context(|| format!("Failed to prepare frame directory {}", dir.display()))?,
        None => ImageSurface::new(),
    };
    let rng: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    };

    let mut channel = FeedbackChannel::spawn(speech_for_config(&config.speech), &config.feedback)?;
    let mut session = SessionLoop::new(config, source, surface, channel.handle(), rng)?;

    for round in 1..=rounds {
        let summary = session.run(max_frames);
        print_summary(&summary)?;

        if round == rounds {
            break;
        }
        if session.phase() != SessionPhase::Finished {
            warn!(round, "Source ended before the session finished, no further rounds");
            break;
        }
        session.restart();
    }

    let stats = channel.shutdown();
    info!(
        spoken = stats.spoken,
        dropped = stats.dropped,
        "Feedback finished"
    );
    Ok(())
}

fn print_summary(summary: &SessionSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Explicit path must exist; otherwise the per-user file is used when present
fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    if let Some(path) = path {
        return GameConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()));
    }

    match GameConfig::default_path() {
        Ok(path) => GameConfig::load_or_default(&path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        Err(e) => {
            warn!(error = %e, "No home directory, using default configuration");
            let config = GameConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn write_default_config(output: Option<&Path>) -> Result<()> {
    let config = GameConfig::default();
    match output {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Default configuration written");
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "coach",
            "run",
            "--replay",
            "session.jsonl",
            "--variant",
            "elbow",
            "--seed",
            "7",
            "--rounds",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.replay, PathBuf::from("session.jsonl"));
                assert!(matches!(args.variant, Some(VariantArg::Elbow)));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.rounds, 2);
                assert_eq!(args.max_frames, None);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_demo_defaults() {
        let cli = Cli::try_parse_from(["coach", "demo", "--dropout-every", "9"]).unwrap();
        match cli.command {
            Commands::Demo(args) => {
                assert_eq!(args.reps, 12);
                assert_eq!(args.dropout_every, Some(9));
            }
            _ => panic!("expected demo command"),
        }
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.json").as_path())).is_err());
    }

    #[test]
    fn test_written_default_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coach.json");
        write_default_config(Some(path.as_path())).unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap(), GameConfig::default());
    }
}
