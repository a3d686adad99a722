use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::path::PathBuf;

use gale_shapley::config::{load_config, DEFAULT_CONFIG_PATH};
use gale_shapley::report::{build_report, write_reports};
use gale_shapley::simulator::{SimulationOptions, Simulator};
use gale_shapley::utils::logging::{init_logger, log_file_path, open_log_file};

/// Stable matching simulations with the Gale-Shapley algorithm
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of simulations to run
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    simulations: u64,

    /// Path to the simulation configuration YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Do not log preference tables
    #[arg(long)]
    no_preferences: bool,

    /// List preferences per agent instead of a compact table
    #[arg(long)]
    expanded: bool,

    /// Do not log the final matching
    #[arg(long)]
    no_report: bool,

    /// Let the responding side propose
    #[arg(long)]
    swap_sides: bool,

    /// Random seed, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for running simulations (0 = one per CPU)
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Directory for report.json and report.txt
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include every round in the JSON report
    #[arg(long)]
    steps: bool,

    /// Directory holding the configured log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Overwrite an existing log file
    #[arg(long)]
    force: bool,
}

impl Args {
    fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            simulations: self.simulations as usize,
            seed: self.seed,
            jobs: self.jobs,
            show_preferences: !self.no_preferences,
            compact: !self.expanded,
            show_matches: !self.no_report,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.swap_sides {
        config.swap_sides().wrap_err("Configuration is invalid with sides swapped")?;
    }

    // Logging goes to stderr, and to the configured log file if any
    let log_file = match &config.log_file_name {
        Some(name) => Some(open_log_file(&log_file_path(&args.log_dir, name), args.force)?),
        None => None,
    };
    init_logger(&args.log_level, log_file)?;

    info!("Configuration file: {:?}", args.config);
    info!(
        "{} propose to {} ({} preferences)",
        config.proposer_side_name, config.responder_side_name, config.preference_type
    );

    let simulator = Simulator::new(config)?;
    let batch = simulator.simulate(&args.simulation_options())?;

    if let Some(output_dir) = &args.output {
        let report = build_report(simulator.config(), &batch, args.steps);
        write_reports(&report, output_dir)?;
        info!("Reports written to {:?}", output_dir);
    }

    Ok(())
}
