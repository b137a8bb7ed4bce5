//! Hibiscus pachislot workbench
//!
//! Usage:
//!   hibiscus simulate --games 1000000 --setting 6 --plot
//!   hibiscus sweep --games 500000 --json
//!   hibiscus play --setting 1 --credits 1000
//!   hibiscus config --setting 5
//!   hibiscus serve --setting 6 --port 8000 --dir static

mod play;
mod serve;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hb_engine::{MachineConfig, Setting, VALID_LEVELS};
use hb_sim::{Progress, Simulation, plot, sweep_configs, sweep_table};

const PLOT_WIDTH: usize = 100;
const PLOT_HEIGHT: usize = 20;

#[derive(Parser)]
#[command(name = "hibiscus", version, about = "Heaven-mode pachislot simulator")]
struct Cli {
    /// Machine config JSON replacing the standard tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one long simulation and print its report
    Simulate {
        /// Games to play
        #[arg(short, long, default_value_t = 1_000_000)]
        games: u64,
        /// Setting level (1, 2, 3, 5, 6)
        #[arg(short, long)]
        setting: Option<u8>,
        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Draw the credit history after the report
        #[arg(long)]
        plot: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate every setting in parallel
    Sweep {
        #[arg(short, long, default_value_t = 1_000_000)]
        games: u64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Play interactively in the terminal
    Play {
        #[arg(short, long)]
        setting: Option<u8>,
        /// Starting credits in medals
        #[arg(short, long, default_value_t = 1000)]
        credits: u64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the resolved machine config as JSON
    Config {
        #[arg(short, long)]
        setting: Option<u8>,
    },
    /// Serve the browser UI with a generated config.js
    Serve {
        #[arg(short, long)]
        setting: Option<u8>,
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
        /// Static file directory
        #[arg(short, long, default_value = "static")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Simulate {
            games,
            setting,
            seed,
            plot,
            json,
        } => simulate(resolve_config(config_path, setting)?, games, seed, plot, json),
        Commands::Sweep { games, seed, json } => sweep(config_path, games, seed, json),
        Commands::Play {
            setting,
            credits,
            seed,
        } => {
            let config = resolve_config(config_path, setting)?;
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            play::run(config, credits, seed, stdin.lock(), stdout.lock()).map(|_| ())
        }
        Commands::Config { setting } => {
            let config = resolve_config(config_path, setting)?;
            println!("{}", config.to_json()?);
            Ok(())
        }
        Commands::Serve { setting, port, dir } => {
            let config = resolve_config(config_path, setting)?;
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(serve::run_server(config, port, dir))
        }
    }
}

/// Standard tables for the level, or the `--config` file with the level
/// applied on top when one is given
fn resolve_config(path: Option<&Path>, setting: Option<u8>) -> Result<MachineConfig> {
    let Some(path) = path else {
        let level = setting.unwrap_or(1);
        return MachineConfig::for_setting(level)
            .with_context(|| format!("Cannot build config for setting {level}"));
    };

    let mut config = MachineConfig::load(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    if let Some(level) = setting {
        config = config.with_setting(Setting::for_level(level)?);
        config.validate()?;
    }
    log::info!("Loaded {} from {}", config.setting.label, path.display());
    Ok(config)
}

fn simulate(config: MachineConfig, games: u64, seed: Option<u64>, plot: bool, json: bool) -> Result<()> {
    if games == 0 {
        bail!("--games must be positive");
    }

    let mut sim = Simulation::with_config(config, seed)?.with_history(plot);
    let report = sim.run(games, |p| {
        if !json {
            print_progress(p);
        }
    })?;

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    eprintln!();
    println!("{report}");
    if let Some(history) = sim.history() {
        let title = format!("{} - credit history over {} games", report.label, report.games);
        println!("{}", plot::render_history(history, PLOT_WIDTH, PLOT_HEIGHT, &title));
    }
    Ok(())
}

fn sweep(config_path: Option<&Path>, games: u64, seed: Option<u64>, json: bool) -> Result<()> {
    if games == 0 {
        bail!("--games must be positive");
    }

    let configs = VALID_LEVELS
        .iter()
        .map(|&level| resolve_config(config_path, Some(level)))
        .collect::<Result<Vec<_>>>()?;
    // printed below so an unseeded sweep can be repeated
    let seed = seed.unwrap_or_else(rand::random);
    let reports = sweep_configs(configs, games, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("Sweep seed {seed}\n");
        print!("{}", sweep_table(&reports));
    }
    Ok(())
}

fn print_progress(progress: &Progress) {
    const BAR: usize = 20;
    let filled = ((progress.fraction() * BAR as f64) as usize).min(BAR);
    eprint!(
        "\r  [{}>{}] {} / {} games ({:.2}s, rate {:.2}%)",
        "=".repeat(filled),
        " ".repeat(BAR - filled),
        progress.done,
        progress.total,
        progress.elapsed.as_secs_f64(),
        progress.payout_rate * 100.0
    );
    let _ = std::io::stderr().flush();
}
