use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use env_logger::Env;
use log::info;

use honeypotsim::config::ExperimentConfig;
use honeypotsim::config_loader::{apply_overrides, load_config, CliOverrides};
use honeypotsim::experiment::{run_experiment, Experiment};
use honeypotsim::graph::Graph;
use honeypotsim::report::{print_summary, write_json_summary, ResultTable};

/// Honeypot placement against stochastic contagion on networks
#[derive(Parser, Debug)]
#[command(name = "honeypotsim")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Default log filter (RUST_LOG takes precedence)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Worker threads for scenario generation (0 = all cores)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the summary and core structure of the configured network
    Info {
        /// Path to the experiment configuration YAML file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Pick the smallest time-step budget that reaches the target fraction reliably
    Calibrate {
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Generate and persist the training scenario sets of the sweep
    Simulate {
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Run the full placement and validation pipeline
    Run {
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct OverrideArgs {
    /// Override the base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Append to existing result tables instead of replacing them
    #[arg(long)]
    append: bool,
}

fn base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn prepare(config_path: &Path, overrides: &OverrideArgs) -> Result<ExperimentConfig> {
    let mut config = load_config(config_path)?;

    // Paths given on the command line are relative to the working directory
    let output_dir = match &overrides.output_dir {
        Some(dir) if dir.is_relative() => Some(
            std::env::current_dir()
                .context("Failed to read the working directory")?
                .join(dir),
        ),
        other => other.clone(),
    };
    apply_overrides(
        &mut config,
        &CliOverrides {
            seed: overrides.seed,
            output_dir,
            append: overrides.append,
        },
    )?;
    Ok(config)
}

fn output_dir(config: &ExperimentConfig, base_dir: &Path) -> Result<PathBuf> {
    let dir = base_dir.join(&config.general.output_dir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Ok(dir)
}

fn build_graph(config: &ExperimentConfig, base_dir: &Path) -> Result<Graph> {
    config
        .network
        .build(base_dir)
        .with_context(|| format!("Failed to build network for '{}'", config.general.name))
}

fn print_network(graph: &Graph) -> Result<()> {
    let summary = graph.summary();
    println!("Network:          {}", summary.network);
    println!("Vertices:         {}", summary.vertices);
    println!("Edges:            {}", summary.edges);
    println!("Average degree:   {:.3}", summary.average_degree);
    println!("Maximum degree:   {}", summary.max_degree);
    match summary.distances.average {
        Some(avg) => println!("Average distance: {:.3}", avg),
        None => println!("Average distance: n/a"),
    }
    println!("Diameter:         {}", summary.distances.maximum);
    println!("Connected:        {}", summary.distances.connected);

    let cores = graph.core_decomposition().context("Core decomposition failed")?;
    let degeneracy = cores.degeneracy();
    println!("Degeneracy:       {}", degeneracy);
    println!("Innermost core:   {} vertices", cores.k_core(degeneracy).len());
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info { config } => {
            let experiment = load_config(&config)?;
            let graph = build_graph(&experiment, &base_dir(&config))?;
            print_network(&graph)?;
        }
        Commands::Calibrate { config, overrides } => {
            let base = base_dir(&config);
            let experiment = prepare(&config, &overrides)?;
            let graph = build_graph(&experiment, &base)?;
            let out = output_dir(&experiment, &base)?;

            let reports = Experiment::new(&experiment, &graph)
                .calibrate()
                .context("Calibration failed")?;
            let table = out.join("calibration.csv");
            for (i, report) in reports.iter().enumerate() {
                report
                    .write_results(&table, experiment.general.append || i > 0)
                    .with_context(|| format!("Failed to write {}", table.display()))?;
                match report.selected {
                    Some(t) => info!(
                        "{} p={} target={}: {} time steps",
                        report.model, report.transmissibility, report.target_fraction, t
                    ),
                    None => log::warn!(
                        "{} p={} target={}: no candidate budget reaches reliability {}",
                        report.model,
                        report.transmissibility,
                        report.target_fraction,
                        report.reliability
                    ),
                }
            }
            write_json_summary(&reports, &out.join("calibration.json"))?;
        }
        Commands::Simulate { config, overrides } => {
            let base = base_dir(&config);
            let experiment = prepare(&config, &overrides)?;
            let graph = build_graph(&experiment, &base)?;
            let dir = output_dir(&experiment, &base)?.join("scenarios");
            fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

            let written = Experiment::new(&experiment, &graph)
                .simulate_all(&dir)
                .context("Scenario generation failed")?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Commands::Run { config, overrides } => {
            let base = base_dir(&config);
            let experiment = prepare(&config, &overrides)?;
            let summary = run_experiment(&experiment, &base)?;
            print_summary(&summary);
        }
    }

    Ok(())
}
