//! Scenario sets: aligned rows of raw infections and virtual detections.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::model::SpreadModel;
use super::rng::StreamSeed;
use crate::error::{HoneypotError, Result};
use crate::graph::VertexId;
use crate::params::Parameters;

/// Identity of a scenario set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub network: String,
    pub model: SpreadModel,
    pub time_steps: usize,
    pub repetitions: usize,
    pub false_negative: f64,
    pub transmissibility: f64,
}

impl ScenarioKey {
    fn ordering_tuple(&self) -> (&str, SpreadModel, usize, usize) {
        (&self.network, self.model, self.time_steps, self.repetitions)
    }
}

impl From<&Parameters> for ScenarioKey {
    fn from(p: &Parameters) -> Self {
        ScenarioKey {
            network: p.network.clone(),
            model: p.model,
            time_steps: p.time_steps,
            repetitions: p.repetitions,
            false_negative: p.false_negative,
            transmissibility: p.transmissibility,
        }
    }
}

impl PartialEq for ScenarioKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScenarioKey {}

impl Hash for ScenarioKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordering_tuple().hash(state);
        self.false_negative.to_bits().hash(state);
        self.transmissibility.to_bits().hash(state);
    }
}

impl PartialOrd for ScenarioKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScenarioKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_tuple()
            .cmp(&other.ordering_tuple())
            .then_with(|| self.false_negative.total_cmp(&other.false_negative))
            .then_with(|| self.transmissibility.total_cmp(&other.transmissibility))
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} T={} R={} fn={} p={}",
            self.network,
            self.model,
            self.time_steps,
            self.repetitions,
            self.false_negative,
            self.transmissibility
        )
    }
}

/// Virtual-detection row for one rollout.
///
/// Every vertex consumes exactly one uniform draw, infected or not, so two
/// sets that differ only in the false-negative probability see the same
/// draws and detection shrinks monotonically as that probability grows.
pub fn detection_row(infected: &[bool], false_negative: f64, seed: StreamSeed, run: u64) -> Vec<bool> {
    let mut rng = seed.detection_rng(run);
    infected
        .iter()
        .map(|&inf| {
            let u: f64 = rng.gen();
            inf && u >= false_negative
        })
        .collect()
}

/// Immutable sample of rollouts for one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    key: ScenarioKey,
    target_fraction: f64,
    seed: StreamSeed,
    vertex_ids: Vec<VertexId>,
    infections: Vec<Vec<bool>>,
    detections: Vec<Vec<bool>>,
    seed_vertices: Vec<VertexId>,
    steps: Vec<usize>,
}

impl ScenarioSet {
    /// Assemble a set from rows; rejects misaligned input
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        key: ScenarioKey,
        target_fraction: f64,
        seed: StreamSeed,
        vertex_ids: Vec<VertexId>,
        infections: Vec<Vec<bool>>,
        detections: Vec<Vec<bool>>,
        seed_vertices: Vec<VertexId>,
        steps: Vec<usize>,
    ) -> Result<Self> {
        let set = Self {
            key,
            target_fraction,
            seed,
            vertex_ids,
            infections,
            detections,
            seed_vertices,
            steps,
        };
        set.check_shape()?;
        Ok(set)
    }

    /// Row and column counts must agree with the key and the vertex list
    pub fn check_shape(&self) -> Result<()> {
        let rows = self.key.repetitions;
        let width = self.vertex_ids.len();
        let aligned = self.infections.len() == rows
            && self.detections.len() == rows
            && self.seed_vertices.len() == rows
            && self.steps.len() == rows;
        if !aligned {
            return Err(HoneypotError::Configuration(format!(
                "scenario set {} expects {} rows in every collection",
                self.key, rows
            )));
        }
        let bad_row = self
            .infections
            .iter()
            .chain(self.detections.iter())
            .any(|row| row.len() != width);
        if bad_row {
            return Err(HoneypotError::Configuration(format!(
                "scenario set {} has rows that do not span its {} vertices",
                self.key, width
            )));
        }
        let phantom = self
            .infections
            .iter()
            .zip(&self.detections)
            .any(|(inf, det)| inf.iter().zip(det).any(|(&i, &d)| d && !i));
        if phantom {
            return Err(HoneypotError::Configuration(format!(
                "scenario set {} detects vertices that were never infected",
                self.key
            )));
        }
        Ok(())
    }

    pub fn key(&self) -> &ScenarioKey {
        &self.key
    }

    pub fn target_fraction(&self) -> f64 {
        self.target_fraction
    }

    pub fn seed(&self) -> StreamSeed {
        self.seed
    }

    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    pub fn len(&self) -> usize {
        self.infections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infections.is_empty()
    }

    pub fn infections(&self) -> &[Vec<bool>] {
        &self.infections
    }

    pub fn detections(&self) -> &[Vec<bool>] {
        &self.detections
    }

    pub fn seed_vertices(&self) -> &[VertexId] {
        &self.seed_vertices
    }

    /// Steps simulated per rollout
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Mean infected fraction across rows
    pub fn mean_infected_fraction(&self) -> f64 {
        if self.is_empty() || self.vertex_ids.is_empty() {
            return 0.0;
        }
        let infected: usize = self
            .infections
            .iter()
            .map(|row| row.iter().filter(|&&x| x).count())
            .sum();
        infected as f64 / (self.len() * self.vertex_ids.len()) as f64
    }

    /// Same infections under another false-negative probability
    pub fn with_false_negative(&self, false_negative: f64) -> Result<ScenarioSet> {
        if !(0.0..=1.0).contains(&false_negative) {
            return Err(HoneypotError::Configuration(format!(
                "false-negative probability must lie in [0, 1], got {}",
                false_negative
            )));
        }
        let detections = self
            .infections
            .iter()
            .enumerate()
            .map(|(run, row)| detection_row(row, false_negative, self.seed, run as u64))
            .collect();
        Ok(ScenarioSet {
            key: ScenarioKey {
                false_negative,
                ..self.key.clone()
            },
            detections,
            ..self.clone()
        })
    }
}
