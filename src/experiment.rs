//! Experiment orchestrator.
//!
//! Walks the configured sweep, simulating training and held-out scenarios
//! once per scenario configuration, running every requested strategy on
//! them and validating the results. A configuration that fails is recorded
//! with the stage it failed in and the sweep moves on.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ExperimentConfig;
use crate::error::HoneypotError;
use crate::graph::{Graph, NetworkSummary};
use crate::optimize::{optimizer_for, CoverageMatrix, HoneypotSolution, Strategy};
use crate::params::Parameters;
use crate::report::{utc_now, write_json_summary, FailureRecord, ResultMap, ResultTable};
use crate::simulation::{
    calibrate_time_step, CacheStats, CalibrationReport, CalibrationRequest, RolloutCache, ScenarioGenerator,
    ScenarioKey, ScenarioSet,
};
use crate::validation::{
    compare_paired, compare_solutions, estimate_overfitting_gap, estimate_sampling_error, GapEstimate,
    PairedComparison, ReplicationPlan, SamplingError, SolutionComparison,
};

/// Child stream of the experiment seed used for held-out scenarios
const HELD_OUT_STREAM: u64 = 1;
/// Child stream of the experiment seed used for gap replications
const GAP_STREAM: u64 = 2;

/// Every result table an experiment produces, keyed by configuration
#[derive(Debug, Default)]
pub struct ExperimentResults {
    pub solutions: ResultMap<HoneypotSolution>,
    pub sampling: ResultMap<SamplingError>,
    pub paired: ResultMap<PairedComparison>,
    pub comparisons: ResultMap<SolutionComparison>,
    pub gaps: ResultMap<GapEstimate>,
    pub failures: ResultMap<FailureRecord>,
    pub completed: usize,
    pub cache: CacheStats,
}

/// Best held-out strategy for one configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestStrategy {
    pub configuration: String,
    pub strategy: Strategy,
    pub in_sample: f64,
    pub held_out: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub network: NetworkSummary,
    pub completed: usize,
    pub failed: usize,
    pub cache: CacheStats,
    pub best: Vec<BestStrategy>,
    pub failures: Vec<(String, FailureRecord)>,
    pub generated_at: String,
}

impl ExperimentResults {
    pub fn summary(&self, name: &str, network: NetworkSummary) -> ExperimentSummary {
        let best = self
            .sampling
            .keys()
            .into_iter()
            .filter_map(|params| {
                self.sampling
                    .get(params)
                    .iter()
                    .max_by(|a, b| a.estimate.point.total_cmp(&b.estimate.point))
                    .map(|s| BestStrategy {
                        configuration: params.to_string(),
                        strategy: s.strategy,
                        in_sample: s.in_sample,
                        held_out: s.estimate.point,
                    })
            })
            .collect();
        let failures = self
            .failures
            .keys()
            .into_iter()
            .flat_map(|params| {
                self.failures
                    .get(params)
                    .iter()
                    .map(move |f| (params.to_string(), f.clone()))
            })
            .collect::<Vec<_>>();

        ExperimentSummary {
            name: name.to_string(),
            network,
            completed: self.completed,
            failed: self.failures.len(),
            cache: self.cache,
            best,
            failures,
            generated_at: utc_now(),
        }
    }

    /// Write every non-empty table under `dir`
    pub fn write_tables(&self, dir: &Path, append: bool) -> Result<()> {
        fn write<T: ResultTable>(table: &T, path: PathBuf, append: bool) -> Result<()> {
            table
                .write_results(&path, append)
                .with_context(|| format!("Failed to write {}", path.display()))
        }

        write(&self.solutions, dir.join("solutions.csv"), append)?;
        write(&self.sampling, dir.join("sampling_error.csv"), append)?;
        if !self.paired.is_empty() {
            write(&self.paired, dir.join("paired_comparisons.csv"), append)?;
            write(&self.comparisons, dir.join("solution_comparisons.csv"), append)?;
        }
        if !self.gaps.is_empty() {
            write(&self.gaps, dir.join("overfitting_gaps.csv"), append)?;
        }
        if !self.failures.is_empty() {
            write(&self.failures, dir.join("failures.csv"), append)?;
        }
        Ok(())
    }
}

/// Training and held-out scenarios shared by configurations that differ
/// only in the honeypot count
struct ScenarioBatch {
    key: ScenarioKey,
    target_bits: u64,
    training: CoverageMatrix,
    held_out: CoverageMatrix,
}

impl ScenarioBatch {
    fn serves(&self, params: &Parameters) -> bool {
        self.key == ScenarioKey::from(params) && self.target_bits == params.target_fraction.to_bits()
    }
}

/// Records of one configuration, committed only once every stage succeeded
#[derive(Debug, Default)]
struct ConfigurationRecords {
    solutions: Vec<HoneypotSolution>,
    sampling: Vec<SamplingError>,
    gaps: Vec<GapEstimate>,
    paired: Vec<PairedComparison>,
    comparisons: Vec<SolutionComparison>,
}

impl ConfigurationRecords {
    fn commit(self, params: &Parameters, results: &mut ExperimentResults) {
        for record in self.solutions {
            results.solutions.insert(params.clone(), record);
        }
        for record in self.sampling {
            results.sampling.insert(params.clone(), record);
        }
        for record in self.gaps {
            results.gaps.insert(params.clone(), record);
        }
        for record in self.paired {
            results.paired.insert(params.clone(), record);
        }
        for record in self.comparisons {
            results.comparisons.insert(params.clone(), record);
        }
        results.completed += 1;
    }
}

fn staged<T>(stage: &str, result: crate::error::Result<T>) -> std::result::Result<T, FailureRecord> {
    result.map_err(|e| FailureRecord {
        stage: stage.to_string(),
        error: e.to_string(),
    })
}

pub struct Experiment<'a> {
    config: &'a ExperimentConfig,
    graph: &'a Graph,
    scenario_dir: Option<PathBuf>,
}

impl<'a> Experiment<'a> {
    pub fn new(config: &'a ExperimentConfig, graph: &'a Graph) -> Self {
        Self {
            config,
            graph,
            scenario_dir: None,
        }
    }

    /// Persist every training scenario set into `dir`
    pub fn with_scenario_dir(mut self, dir: PathBuf) -> Self {
        self.scenario_dir = Some(dir);
        self
    }

    fn generator(&self) -> ScenarioGenerator<'a> {
        ScenarioGenerator::new(self.graph).with_seed_choice(self.config.simulation.seed_choice())
    }

    pub fn run(&self) -> ExperimentResults {
        let generator = self.generator();
        let mut cache = RolloutCache::new();
        let mut results = ExperimentResults::default();
        let mut batch: Option<ScenarioBatch> = None;

        let sweep = self.config.sweep.parameters(self.graph.name());
        log::info!(
            "Running {} configurations of '{}' on {}",
            sweep.len(),
            self.config.general.name,
            self.graph.name()
        );

        for params in sweep {
            if let Err(failure) = staged("configure", params.check_cardinality(self.graph.vertex_count())) {
                log::warn!("Skipping {}: {}", params, failure.error);
                results.failures.insert(params, failure);
                continue;
            }

            if !batch.as_ref().is_some_and(|b| b.serves(&params)) {
                batch = match self.simulate(&generator, &params, &mut cache) {
                    Ok(b) => Some(b),
                    Err(failure) => {
                        log::warn!("Simulation failed for {}: {}", params, failure.error);
                        results.failures.insert(params.clone(), failure);
                        None
                    }
                };
            }
            let Some(current) = batch.as_ref() else { continue };

            match self.evaluate(&generator, &params, current) {
                Ok(records) => records.commit(&params, &mut results),
                Err(failure) => {
                    log::warn!("{} failed during {}: {}", params, failure.stage, failure.error);
                    results.failures.insert(params, failure);
                }
            }
        }

        results.cache = cache.stats();
        log::info!(
            "Finished: {} configurations completed, {} failed",
            results.completed,
            results.failures.len()
        );
        results
    }

    fn simulate(
        &self,
        generator: &ScenarioGenerator<'_>,
        params: &Parameters,
        cache: &mut RolloutCache,
    ) -> std::result::Result<ScenarioBatch, FailureRecord> {
        let seed = self.config.seed();
        let training = staged("simulate", generator.generate_cached(params, seed, cache))?;
        if let Some(dir) = &self.scenario_dir {
            staged("persist", training.save_in(dir))?;
        }

        let held_out_params = Parameters {
            repetitions: self.config.validation.held_out_repetitions,
            ..params.clone()
        };
        let held_out = staged(
            "simulate",
            generator.generate_cached(&held_out_params, seed.split(HELD_OUT_STREAM), cache),
        )?;
        log::info!(
            "Scenarios for {}: mean infected fraction {:.3} (training), {:.3} (held-out)",
            training.key(),
            training.mean_infected_fraction(),
            held_out.mean_infected_fraction()
        );

        Ok(ScenarioBatch {
            key: ScenarioKey::from(params),
            target_bits: params.target_fraction.to_bits(),
            training: staged("simulate", CoverageMatrix::from_scenarios(&training))?,
            held_out: staged("simulate", CoverageMatrix::from_scenarios(&held_out))?,
        })
    }

    fn evaluate(
        &self,
        generator: &ScenarioGenerator<'_>,
        params: &Parameters,
        batch: &ScenarioBatch,
    ) -> std::result::Result<ConfigurationRecords, FailureRecord> {
        let optimization = &self.config.optimization;
        let validation = &self.config.validation;
        let alpha = validation.alpha;
        let mut records = ConfigurationRecords::default();

        for &strategy in &optimization.strategies {
            let optimizer = optimizer_for(strategy, params.transmissibility, &optimization.exact);
            let solution = staged(
                "optimize",
                optimizer.optimize(self.graph, &batch.training, params.honeypots),
            )?;
            let sampling = staged(
                "validate",
                estimate_sampling_error(&solution, &batch.held_out, alpha),
            )?;
            log::info!(
                "{} {}: {:?} in-sample {:.4}, held-out {:.4} ± {:.4}",
                params,
                strategy,
                solution.honeypots,
                solution.objective,
                sampling.estimate.point,
                sampling.estimate.half_width
            );

            if validation.gap_replications >= 2 {
                let plan = ReplicationPlan {
                    replications: validation.gap_replications,
                    held_out_repetitions: validation.held_out_repetitions,
                    alpha,
                    seed: self.config.seed().split(GAP_STREAM),
                };
                let gap = staged(
                    "gap",
                    estimate_overfitting_gap(generator, params, optimizer.as_ref(), &plan),
                )?;
                records.gaps.push(gap);
            }

            records.sampling.push(sampling);
            records.solutions.push(solution);
        }

        if validation.compare {
            let solutions = &records.solutions;
            let mut paired_records = Vec::new();
            let mut comparison_records = Vec::new();
            for (i, first) in solutions.iter().enumerate() {
                for second in &solutions[i + 1..] {
                    let paired = staged("compare", compare_paired(first, second, &batch.held_out, alpha))?;
                    if paired.significant {
                        log::info!(
                            "{} vs {} on {}: difference {:.4} is significant",
                            first.strategy,
                            second.strategy,
                            params,
                            paired.difference.point
                        );
                    }
                    let comparison = staged("compare", compare_solutions(first, second, &batch.held_out, alpha))?;
                    paired_records.push(paired);
                    comparison_records.push(comparison);
                }
            }
            records.paired = paired_records;
            records.comparisons = comparison_records;
        }
        Ok(records)
    }

    /// Simulate and persist the training set of every scenario configuration
    pub fn simulate_all(&self, dir: &Path) -> crate::error::Result<Vec<PathBuf>> {
        let generator = self.generator();
        let mut cache = RolloutCache::new();
        let seed = self.config.seed();
        let mut written: Vec<PathBuf> = Vec::new();
        let mut last: Option<(ScenarioKey, u64)> = None;

        for params in self.config.sweep.parameters(self.graph.name()) {
            let id = (ScenarioKey::from(&params), params.target_fraction.to_bits());
            if last.as_ref() == Some(&id) {
                continue;
            }
            let set: ScenarioSet = generator.generate_cached(&params, seed, &mut cache)?;
            written.push(set.save_in(dir)?);
            last = Some(id);
        }
        log::info!("Persisted {} scenario sets to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Time-step calibration for every (model, transmissibility, target) of the sweep
    pub fn calibrate(&self) -> crate::error::Result<Vec<CalibrationReport>> {
        let calibration = self.config.calibration.as_ref().ok_or_else(|| {
            HoneypotError::Configuration("the configuration has no calibration section".to_string())
        })?;
        let generator = self.generator();
        let sweep = &self.config.sweep;

        let mut reports = Vec::new();
        for &model in &sweep.models {
            for &transmissibility in &sweep.transmissibilities {
                for &target_fraction in &sweep.target_fractions {
                    let request = CalibrationRequest {
                        model,
                        transmissibility,
                        target_fraction,
                        candidates: calibration.candidates.clone(),
                        repetitions: calibration.repetitions,
                        reliability: calibration.reliability,
                        alpha: self.config.validation.alpha,
                        seed: self.config.seed(),
                    };
                    reports.push(calibrate_time_step(&generator, &request)?);
                }
            }
        }
        Ok(reports)
    }
}

/// Build the network, run the whole sweep and write every table plus a
/// JSON summary into the output directory
pub fn run_experiment(config: &ExperimentConfig, base_dir: &Path) -> Result<ExperimentSummary> {
    let graph = config
        .network
        .build(base_dir)
        .with_context(|| format!("Failed to build network for '{}'", config.general.name))?;

    let output_dir = base_dir.join(&config.general.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let network = graph.summary();
    network
        .write_results(&output_dir.join("networks.csv"), config.general.append)
        .context("Failed to write network summary")?;

    let mut experiment = Experiment::new(config, &graph);
    if config.simulation.persist_scenarios {
        let scenario_dir = output_dir.join("scenarios");
        fs::create_dir_all(&scenario_dir)
            .with_context(|| format!("Failed to create {}", scenario_dir.display()))?;
        experiment = experiment.with_scenario_dir(scenario_dir);
    }

    let results = experiment.run();
    results.write_tables(&output_dir, config.general.append)?;

    let summary = results.summary(&config.general.name, network);
    write_json_summary(&summary, &output_dir.join("summary.json"))?;
    Ok(summary)
}
