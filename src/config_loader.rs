use crate::config::ExperimentConfig;
use color_eyre::eyre::{Context, Result};
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load, parse and validate an experiment configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<ExperimentConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open configuration {}", config_path.display()))?;

    let config: ExperimentConfig = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse configuration {}", config_path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    info!(
        "Experiment '{}': {} configurations, strategies {:?}",
        config.general.name,
        config.sweep.parameters("").len(),
        config.optimization.strategies
    );
    Ok(config)
}

/// Command-line values that take precedence over the YAML file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub append: bool,
}

/// Apply CLI overrides to an experiment configuration
pub fn apply_overrides(config: &mut ExperimentConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(seed) = overrides.seed {
        info!("Overriding seed {} with {}", config.general.seed, seed);
        config.general.seed = seed;
    }

    if let Some(dir) = &overrides.output_dir {
        info!("Writing results to {}", dir.display());
        config.general.output_dir = dir.to_string_lossy().into_owned();
    }

    if overrides.append {
        config.general.append = true;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
