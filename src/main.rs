use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jiggler::config::{JigglerSettings, DEFAULT_SECONDARY_TARGET};
use jiggler::model::{Path, Point};
use jiggler::path::{path_stats, synthesize_path};
use jiggler::scheduler::{JigglerConfig, Scheduler};
use jiggler::smoothing::smooth_path;
use jiggler::state::{JigglerState, ReadyGate};
use jiggler::transport::{open_transport, TransportBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportBackendArg {
    Auto,
    X11,
    Log,
}

impl TransportBackendArg {
    fn to_library(self) -> TransportBackend {
        match self {
            TransportBackendArg::Auto => TransportBackend::Auto,
            TransportBackendArg::X11 => TransportBackend::X11,
            TransportBackendArg::Log => TransportBackend::Log,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "jiggler")]
#[command(about = "Human-like idle mouse jiggler for remotely controlled machines", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    /// JSON config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the jiggler until Ctrl+C
    Run {
        /// Transport backend.
        ///
        /// - auto: choose a backend based on the runtime environment
        /// - x11: force X11 (XTEST)
        /// - log: dry run, only log reports
        #[arg(long, value_enum, default_value_t = TransportBackendArg::Auto)]
        backend: TransportBackendArg,

        /// Start with jiggling enabled
        #[arg(long)]
        enabled: bool,

        /// Base interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// Maximum interval jitter in seconds
        #[arg(long)]
        jitter: Option<f64>,

        /// Also synthesize a path toward the secondary target every cycle
        #[arg(long)]
        secondary: bool,

        /// Optional RNG seed (for debugging)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Synthesize one path and print it (JSON)
    Path {
        #[arg(long, default_value_t = 0)]
        from_x: i32,

        #[arg(long, default_value_t = 0)]
        from_y: i32,

        #[arg(long)]
        to_x: i32,

        #[arg(long)]
        to_y: i32,

        /// Smooth the path before printing
        #[arg(long)]
        smooth: bool,

        /// Output file (defaults to stdout)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Optional RNG seed (for debugging)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the effective configuration (JSON)
    Config,
}

#[derive(Debug, Serialize)]
struct PathOutput {
    start: Point,
    target: Point,
    path: Path,
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<JigglerSettings> {
    match path {
        Some(path) => JigglerSettings::load(path),
        None => Ok(JigglerSettings::default()),
    }
}

fn write_output(path: &PathBuf, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn run(
    settings: JigglerSettings,
    backend: TransportBackendArg,
    seed: Option<u64>,
) -> Result<()> {
    settings.validate()?;

    // Fail fast on unsupported environments/backends.
    let transport = open_transport(backend.to_library())?;

    let state = Arc::new(JigglerState::default());
    state.set_enabled(settings.enabled);

    let gate = Arc::new(ReadyGate::new());
    let scheduler = Scheduler::new(
        JigglerConfig::from_settings(&settings),
        state.clone(),
        transport,
        rng_from_seed(seed),
    );
    let stop = scheduler.stop_handle();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install Ctrl+C handler")?;
    }

    let handle = scheduler.spawn(gate.clone())?;
    gate.open();
    info!(
        enabled = state.enabled(),
        "jiggler running; press Ctrl+C to stop"
    );

    let scheduler = handle
        .join()
        .map_err(|_| anyhow!("jiggler thread panicked"))?;
    eprintln!(
        "Stopped after {} iterations, {} jiggles",
        scheduler.iterations(),
        scheduler.jiggles()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(cli.config.as_ref())?;

    match cli.command {
        Command::Run {
            backend,
            enabled,
            interval,
            jitter,
            secondary,
            seed,
        } => {
            if enabled {
                settings.enabled = true;
            }
            if let Some(v) = interval {
                settings.interval.base_secs = v;
            }
            if let Some(v) = jitter {
                settings.interval.jitter_secs = v;
            }
            if secondary && settings.secondary_target.is_none() {
                settings.secondary_target = Some(DEFAULT_SECONDARY_TARGET);
            }
            run(settings, backend, seed)?;
        }
        Command::Path {
            from_x,
            from_y,
            to_x,
            to_y,
            smooth,
            output,
            seed,
        } => {
            let start = Point::new(from_x, from_y);
            let target = Point::new(to_x, to_y);
            let mut rng = rng_from_seed(seed);

            let mut path = synthesize_path(start, target, &settings.path.to_path_config(), &mut rng);
            if smooth {
                settings.smoothing.enabled = true;
            }
            if let Some(cfg) = settings.smoothing.to_smoothing_config() {
                path = smooth_path(&path, &cfg);
            }

            let stats = path_stats(&path);
            eprintln!(
                "Path: {} nodes, length {:.1}px, max deviation {:.1}px",
                stats.nodes, stats.length, stats.max_deviation
            );

            let json = serde_json::to_string_pretty(&PathOutput {
                start,
                target,
                path,
            })
            .context("failed to serialize path")?;
            if let Some(out) = output {
                write_output(&out, &json)?;
            } else {
                println!("{json}");
            }
        }
        Command::Config => {
            println!("{}", settings.to_json_pretty()?);
        }
    }

    Ok(())
}
