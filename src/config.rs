use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result as HoneypotResult;
use crate::graph::{self, generators, Graph, VertexId};
use crate::optimize::{ExactOptions, Strategy};
use crate::params::Parameters;
use crate::simulation::{SeedChoice, SpreadModel, StreamSeed};
use crate::stats::Alpha;

/// Experiment description loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub sweep: SweepConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationConfig>,
}

impl ExperimentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.name.is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "experiment name cannot be empty".to_string(),
            ));
        }
        if self.general.output_dir.is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "output_dir cannot be empty".to_string(),
            ));
        }
        self.network.validate()?;
        self.sweep.validate()?;
        self.optimization.validate()?;
        self.validation.validate()?;
        if let Some(calibration) = &self.calibration {
            calibration.validate()?;
        }
        Ok(())
    }

    pub fn seed(&self) -> StreamSeed {
        StreamSeed::new(self.general.seed)
    }
}

/// Shared general configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Append to existing result tables instead of overwriting them
    #[serde(default)]
    pub append: bool,
}

fn default_seed() -> u64 {
    42
}

fn default_output_dir() -> String {
    "results".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Complete,
    Circulant,
}

/// Where the network comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkSource {
    Generated {
        generator: GeneratorKind,
        vertices: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        offsets: Vec<u32>,
    },
    EdgeList {
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(flatten)]
    pub source: NetworkSource,
    /// Keep only the largest connected component after cleanup
    #[serde(default = "default_true")]
    pub largest_component: bool,
}

fn default_true() -> bool {
    true
}

impl NetworkConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.source {
            NetworkSource::EdgeList { path } => {
                if path.is_empty() {
                    return Err(ValidationError::InvalidNetwork(
                        "edge-list path cannot be empty".to_string(),
                    ));
                }
            }
            NetworkSource::Generated { generator, vertices, offsets } => {
                if *vertices == 0 {
                    return Err(ValidationError::InvalidNetwork(
                        "generated networks need at least one vertex".to_string(),
                    ));
                }
                if *generator == GeneratorKind::Circulant && offsets.is_empty() {
                    return Err(ValidationError::InvalidNetwork(
                        "circulant networks need at least one offset".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build the network and clean it up: self-loops are always removed,
    /// and the graph is reduced to its largest component when requested
    pub fn build(&self, base_dir: &Path) -> HoneypotResult<Graph> {
        let mut graph = match &self.source {
            NetworkSource::EdgeList { path } => graph::load_edge_list(&base_dir.join(path))?,
            NetworkSource::Generated { generator: GeneratorKind::Complete, vertices, .. } => {
                generators::complete(*vertices)
            }
            NetworkSource::Generated { generator: GeneratorKind::Circulant, vertices, offsets } => {
                generators::circulant(*vertices, offsets)?
            }
        };

        let loops = graph.remove_self_loops();
        if loops > 0 {
            log::info!("Removed {} self-loops from {}", loops, graph.name());
        }
        if self.largest_component {
            graph.retain_largest_component();
        }
        Ok(graph)
    }
}

/// Axes of the parameter sweep; the experiment runs their cartesian product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub models: Vec<SpreadModel>,
    pub honeypots: Vec<usize>,
    pub repetitions: Vec<usize>,
    #[serde(default = "default_target_fractions")]
    pub target_fractions: Vec<f64>,
    #[serde(default = "default_false_negatives")]
    pub false_negatives: Vec<f64>,
    pub time_steps: Vec<usize>,
    pub transmissibilities: Vec<f64>,
}

fn default_target_fractions() -> Vec<f64> {
    vec![1.0]
}

fn default_false_negatives() -> Vec<f64> {
    vec![0.0]
}

impl SweepConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let axes = [
            ("models", self.models.len()),
            ("honeypots", self.honeypots.len()),
            ("repetitions", self.repetitions.len()),
            ("target_fractions", self.target_fractions.len()),
            ("false_negatives", self.false_negatives.len()),
            ("time_steps", self.time_steps.len()),
            ("transmissibilities", self.transmissibilities.len()),
        ];
        if let Some((axis, _)) = axes.iter().find(|(_, len)| *len == 0) {
            return Err(ValidationError::InvalidSweep(format!("{} cannot be empty", axis)));
        }
        if self.honeypots.contains(&0) || self.repetitions.contains(&0) {
            return Err(ValidationError::InvalidSweep(
                "honeypot and repetition counts must be positive".to_string(),
            ));
        }
        let probabilities = self.false_negatives.iter().chain(&self.transmissibilities);
        if let Some(p) = probabilities.into_iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ValidationError::InvalidSweep(format!(
                "probabilities must lie in [0, 1], got {}",
                p
            )));
        }
        if let Some(t) = self.target_fractions.iter().find(|t| !(**t > 0.0 && **t <= 1.0)) {
            return Err(ValidationError::InvalidSweep(format!(
                "target fractions must lie in (0, 1], got {}",
                t
            )));
        }
        Ok(())
    }

    /// Every configuration of the sweep for `network`.
    ///
    /// Within each (model, transmissibility, target) family the time budgets
    /// ascend, so cached rollouts only ever need extending. Honeypot counts
    /// vary fastest, so configurations sharing scenarios are adjacent.
    pub fn parameters(&self, network: &str) -> Vec<Parameters> {
        let mut time_steps = self.time_steps.clone();
        time_steps.sort_unstable();
        time_steps.dedup();

        let mut all = Vec::new();
        for &model in &self.models {
            for &transmissibility in &self.transmissibilities {
                for &target_fraction in &self.target_fractions {
                    for &steps in &time_steps {
                        for &repetitions in &self.repetitions {
                            for &false_negative in &self.false_negatives {
                                for &honeypots in &self.honeypots {
                                    all.push(Parameters {
                                        network: network.to_string(),
                                        model,
                                        honeypots,
                                        repetitions,
                                        target_fraction,
                                        false_negative,
                                        time_steps: steps,
                                        transmissibility,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        all
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Start every rollout from this vertex instead of a random one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_vertex: Option<VertexId>,
    /// Persist every training scenario set under `<output_dir>/scenarios`
    #[serde(default)]
    pub persist_scenarios: bool,
}

impl SimulationConfig {
    pub fn seed_choice(&self) -> SeedChoice {
        self.seed_vertex.map_or(SeedChoice::Random, SeedChoice::Fixed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub exact: ExactOptions,
}

fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::DegreeCentrality, Strategy::MaxRowsGreedy]
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            exact: ExactOptions::default(),
        }
    }
}

impl OptimizationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.strategies.is_empty() {
            return Err(ValidationError::InvalidOptimization(
                "at least one strategy is required".to_string(),
            ));
        }
        let gap = self.exact.budget.relative_gap;
        if !(gap >= 0.0 && gap.is_finite()) {
            return Err(ValidationError::InvalidOptimization(format!(
                "relative_gap must be a non-negative number, got {}",
                gap
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub alpha: Alpha,
    #[serde(default = "default_held_out")]
    pub held_out_repetitions: usize,
    /// Overfitting-gap replications; 0 disables the estimate
    #[serde(default)]
    pub gap_replications: usize,
    /// Compare every pair of strategies on the held-out set
    #[serde(default = "default_true")]
    pub compare: bool,
}

fn default_held_out() -> usize {
    1000
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            alpha: Alpha::default(),
            held_out_repetitions: default_held_out(),
            gap_replications: 0,
            compare: true,
        }
    }
}

impl ValidationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.held_out_repetitions == 0 {
            return Err(ValidationError::InvalidValidation(
                "held_out_repetitions must be positive".to_string(),
            ));
        }
        if self.gap_replications == 1 {
            return Err(ValidationError::InvalidValidation(
                "gap_replications must be 0 (disabled) or at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub candidates: Vec<usize>,
    #[serde(default = "default_calibration_repetitions")]
    pub repetitions: usize,
    #[serde(default = "default_reliability")]
    pub reliability: f64,
}

fn default_calibration_repetitions() -> usize {
    200
}

fn default_reliability() -> f64 {
    0.95
}

impl CalibrationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.candidates.is_empty() || self.repetitions == 0 {
            return Err(ValidationError::InvalidCalibration(
                "calibration needs candidate budgets and a positive repetition count".to_string(),
            ));
        }
        if !(self.reliability > 0.0 && self.reliability <= 1.0) {
            return Err(ValidationError::InvalidCalibration(format!(
                "reliability must lie in (0, 1], got {}",
                self.reliability
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid sweep configuration: {0}")]
    InvalidSweep(String),
    #[error("Invalid optimization configuration: {0}")]
    InvalidOptimization(String),
    #[error("Invalid validation configuration: {0}")]
    InvalidValidation(String),
    #[error("Invalid calibration configuration: {0}")]
    InvalidCalibration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const YAML: &str = r#"
general:
  name: "k5"
  seed: 7
network:
  generator: complete
  vertices: 5
sweep:
  models: [repeated_attempt]
  honeypots: [1, 2]
  repetitions: [100]
  time_steps: [10, 3]
  transmissibilities: [1.0]
optimization:
  strategies: [degree_centrality, max_rows_greedy, exact]
  exact:
    budget:
      time_limit: "30s"
validation:
  alpha: 0.1
  held_out_repetitions: 200
"#;

    #[test]
    fn test_experiment_parsing() {
        let config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        config.validate().unwrap();

        assert_eq!(config.general.output_dir, "results");
        assert!(config.network.largest_component);
        assert!(matches!(
            config.network.source,
            NetworkSource::Generated { generator: GeneratorKind::Complete, vertices: 5, .. }
        ));
        assert_eq!(config.sweep.false_negatives, vec![0.0]);
        assert_eq!(config.optimization.strategies.len(), 3);
        assert_eq!(config.optimization.exact.budget.time_limit, Some(Duration::from_secs(30)));
        assert!(config.optimization.exact.reduce);
        assert_eq!(config.validation.alpha.value(), 0.1);
        assert!(config.calibration.is_none());
    }

    #[test]
    fn test_edge_list_network() {
        let yaml = "path: graphs/net.txt\nlargest_component: false\n";
        let network: NetworkConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(network.source, NetworkSource::EdgeList { ref path } if path == "graphs/net.txt"));
        assert!(!network.largest_component);
    }

    #[test]
    fn test_sweep_order_and_size() {
        let config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        let params = config.sweep.parameters("complete_5");
        assert_eq!(params.len(), 4);
        let budgets: Vec<usize> = params.iter().map(|p| p.time_steps).collect();
        assert_eq!(budgets, vec![3, 3, 10, 10]);
        assert_eq!(params[0].honeypots, 1);
        assert_eq!(params[1].honeypots, 2);
    }

    #[test]
    fn test_validation_errors() {
        let mut config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        config.sweep.transmissibilities = vec![1.5];
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSweep(_))));

        let mut config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        config.validation.gap_replications = 1;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidValidation(_))));

        let mut config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        config.optimization.strategies.clear();
        assert!(config.validate().is_err());

        let bad_alpha = YAML.replace("alpha: 0.1", "alpha: 1.5");
        assert!(serde_yaml::from_str::<ExperimentConfig>(&bad_alpha).is_err());
    }

    #[test]
    fn test_network_build_cleans_up() {
        let config: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        let graph = config.network.build(Path::new(".")).unwrap();
        assert_eq!(graph.vertex_count(), 5);
        assert!(!graph.has_self_loops());
    }
}
