//! Parallel scenario generation and the refinement cache.
//!
//! Rollouts run on the rayon pool, one task per run index, each with its
//! own stream derived from the run index. The calling thread collects them
//! in index order and assembles the scenario set.

use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::model::{SeedChoice, SpreadModel};
use super::rng::StreamSeed;
use super::rollout::Rollout;
use super::scenarios::{detection_row, ScenarioKey, ScenarioSet};
use crate::error::{HoneypotError, Result};
use crate::graph::{Graph, IndexedGraph};
use crate::params::Parameters;

/// Everything that determines a rollout apart from its time budget and run index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RolloutFamily {
    network: String,
    model: SpreadModel,
    transmissibility: u64,
    target_fraction: u64,
    seed: StreamSeed,
    seed_choice: SeedChoice,
}

#[derive(Debug)]
struct CachedRollouts {
    budget: usize,
    rollouts: Vec<Rollout>,
}

/// Counters describing how much work the cache saved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub fresh: usize,
    pub extended: usize,
    pub reused: usize,
}

/// Paused rollouts kept across a parameter sweep.
///
/// A request that asks for the same family with a time budget no smaller
/// than the cached one, and any number of runs, is a refinement: cached
/// rollouts are resumed up to the new budget and missing runs are started.
/// Anything else is simulated from scratch and leaves the cache untouched.
#[derive(Debug, Default)]
pub struct RolloutCache {
    families: HashMap<RolloutFamily, CachedRollouts>,
    stats: CacheStats,
}

impl RolloutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn families(&self) -> usize {
        self.families.len()
    }

    pub fn clear(&mut self) {
        self.families.clear();
    }
}

pub struct ScenarioGenerator<'g> {
    graph: &'g Graph,
    indexed: IndexedGraph,
    seed_choice: SeedChoice,
}

impl<'g> ScenarioGenerator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            indexed: graph.indexed(),
            seed_choice: SeedChoice::Random,
        }
    }

    pub fn with_seed_choice(mut self, seed_choice: SeedChoice) -> Self {
        self.seed_choice = seed_choice;
        self
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    fn check(&self, params: &Parameters) -> Result<()> {
        params.validate()?;
        if params.network != self.graph.name() {
            return Err(HoneypotError::Configuration(format!(
                "parameters target network '{}' but the generator holds '{}'",
                params.network,
                self.graph.name()
            )));
        }
        Ok(())
    }

    /// Start and advance the rollouts with run indices in `runs`
    pub fn rollouts(
        &self,
        model: SpreadModel,
        transmissibility: f64,
        target_fraction: f64,
        budget: usize,
        runs: Range<usize>,
        seed: StreamSeed,
    ) -> Result<Vec<Rollout>> {
        runs.into_par_iter()
            .map(|run| {
                let rng = seed.rollout_rng(run as u64);
                let mut rollout = Rollout::start(
                    &self.indexed,
                    model,
                    transmissibility,
                    target_fraction,
                    self.seed_choice,
                    rng,
                )?;
                rollout.advance(&self.indexed, budget);
                Ok(rollout)
            })
            .collect()
    }

    /// Simulate `params.repetitions` fresh rollouts
    pub fn generate(&self, params: &Parameters, seed: StreamSeed) -> Result<ScenarioSet> {
        self.check(params)?;
        let rollouts = self.rollouts(
            params.model,
            params.transmissibility,
            params.target_fraction,
            params.time_steps,
            0..params.repetitions,
            seed,
        )?;
        log::debug!("Simulated {} rollouts for {}", rollouts.len(), params);
        self.assemble(params, seed, &rollouts)
    }

    /// Like [`generate`](Self::generate), reusing cached rollouts when the
    /// request refines an earlier one. The rows are identical to a fresh run.
    pub fn generate_cached(
        &self,
        params: &Parameters,
        seed: StreamSeed,
        cache: &mut RolloutCache,
    ) -> Result<ScenarioSet> {
        self.check(params)?;
        let family = RolloutFamily {
            network: params.network.clone(),
            model: params.model,
            transmissibility: params.transmissibility.to_bits(),
            target_fraction: params.target_fraction.to_bits(),
            seed,
            seed_choice: self.seed_choice,
        };

        if let Some(cached) = cache.families.get(&family) {
            if cached.budget > params.time_steps {
                log::debug!(
                    "Cached rollouts for {} ran {} steps, more than the requested {}; simulating afresh",
                    params,
                    cached.budget,
                    params.time_steps
                );
                return self.generate(params, seed);
            }
        }

        let entry = cache.families.entry(family).or_insert_with(|| CachedRollouts {
            budget: params.time_steps,
            rollouts: Vec::new(),
        });

        if entry.budget < params.time_steps {
            let indexed = &self.indexed;
            let budget = params.time_steps;
            let resumed = entry.rollouts.iter().filter(|r| !r.is_finished()).count();
            entry
                .rollouts
                .par_iter_mut()
                .for_each(|r| r.advance(indexed, budget));
            entry.budget = budget;
            cache.stats.extended += resumed;
        }

        let have = entry.rollouts.len();
        if have < params.repetitions {
            let fresh = self.rollouts(
                params.model,
                params.transmissibility,
                params.target_fraction,
                params.time_steps,
                have..params.repetitions,
                seed,
            )?;
            cache.stats.fresh += fresh.len();
            entry.rollouts.extend(fresh);
        }
        cache.stats.reused += have.min(params.repetitions);

        log::debug!(
            "Scenario cache for {}: {} cached rollouts, budget {}",
            params,
            entry.rollouts.len(),
            entry.budget
        );
        self.assemble(params, seed, &entry.rollouts[..params.repetitions])
    }

    fn assemble(&self, params: &Parameters, seed: StreamSeed, rollouts: &[Rollout]) -> Result<ScenarioSet> {
        let infections: Vec<Vec<bool>> = rollouts.iter().map(|r| r.infected().to_vec()).collect();
        let detections = infections
            .iter()
            .enumerate()
            .map(|(run, row)| detection_row(row, params.false_negative, seed, run as u64))
            .collect();
        let seed_vertices = rollouts.iter().map(|r| self.indexed.id(r.seed_vertex())).collect();
        let steps = rollouts.iter().map(Rollout::steps).collect();

        ScenarioSet::from_parts(
            ScenarioKey::from(params),
            params.target_fraction,
            seed,
            self.indexed.ids().to_vec(),
            infections,
            detections,
            seed_vertices,
            steps,
        )
    }
}
