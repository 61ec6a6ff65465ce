//! Result maps keyed by experiment configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{utc_now, ResultTable};
use crate::optimize::HoneypotSolution;
use crate::params::Parameters;
use crate::validation::{GapEstimate, PairedComparison, SamplingError, SolutionComparison};

/// Row-shaped result that can be stored against a configuration
pub trait ResultRecord {
    fn columns() -> Vec<&'static str>;

    fn values(&self) -> Vec<String>;
}

const PARAMETER_COLUMNS: [&str; 8] = [
    "network",
    "model",
    "honeypots",
    "repetitions",
    "target_fraction",
    "false_negative",
    "time_steps",
    "transmissibility",
];

fn parameter_values(p: &Parameters) -> Vec<String> {
    vec![
        p.network.clone(),
        p.model.to_string(),
        p.honeypots.to_string(),
        p.repetitions.to_string(),
        p.target_fraction.to_string(),
        p.false_negative.to_string(),
        p.time_steps.to_string(),
        p.transmissibility.to_string(),
    ]
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Records per configuration, owned by whoever runs the sweep
#[derive(Debug, Clone)]
pub struct ResultMap<V> {
    entries: HashMap<Parameters, Vec<V>>,
}

impl<V> Default for ResultMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> ResultMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record for `params`; several records per configuration keep
    /// their insertion order
    pub fn insert(&mut self, params: Parameters, record: V) {
        self.entries.entry(params).or_default().push(record);
    }

    pub fn get(&self, params: &Parameters) -> &[V] {
        self.entries.get(params).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, params: &Parameters) -> bool {
        self.entries.contains_key(params)
    }

    /// Number of configurations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configurations in ascending order
    pub fn keys(&self) -> Vec<&Parameters> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    pub fn records(&self) -> impl Iterator<Item = &V> {
        self.entries.values().flatten()
    }
}

impl<V: ResultRecord> ResultTable for ResultMap<V> {
    fn header(&self) -> Vec<String> {
        PARAMETER_COLUMNS
            .iter()
            .copied()
            .chain(V::columns())
            .chain(["utc"])
            .map(str::to_string)
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let utc = utc_now();
        self.keys()
            .into_iter()
            .flat_map(|params| {
                let prefix = parameter_values(params);
                let utc = utc.clone();
                self.get(params).iter().map(move |record| {
                    let mut row = prefix.clone();
                    row.extend(record.values());
                    row.push(utc.clone());
                    row
                })
            })
            .collect()
    }
}

impl ResultRecord for HoneypotSolution {
    fn columns() -> Vec<&'static str> {
        vec![
            "strategy",
            "honeypots",
            "objective",
            "a_priori_bound",
            "posterior_bound",
            "status",
            "wall_time_s",
            "solver_status",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.strategy.to_string(),
            self.honeypots.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "),
            self.objective.to_string(),
            optional(self.a_priori_bound),
            optional(self.posterior_bound),
            self.status.to_string(),
            self.wall_time.as_secs_f64().to_string(),
            self.solver.as_ref().map(|s| s.status.clone()).unwrap_or_default(),
        ]
    }
}

impl ResultRecord for SamplingError {
    fn columns() -> Vec<&'static str> {
        vec![
            "strategy",
            "in_sample",
            "held_out",
            "std_error",
            "half_width",
            "alpha",
            "sample_size",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.strategy.to_string(),
            self.in_sample.to_string(),
            self.estimate.point.to_string(),
            self.estimate.std_error.to_string(),
            self.estimate.half_width.to_string(),
            self.estimate.alpha.to_string(),
            self.estimate.sample_size.to_string(),
        ]
    }
}

impl ResultRecord for PairedComparison {
    fn columns() -> Vec<&'static str> {
        vec![
            "first",
            "second",
            "both",
            "only_first",
            "only_second",
            "neither",
            "difference",
            "std_error",
            "lower",
            "upper",
            "significant",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.first.to_string(),
            self.second.to_string(),
            self.table.both.to_string(),
            self.table.only_first.to_string(),
            self.table.only_second.to_string(),
            self.table.neither.to_string(),
            self.difference.point.to_string(),
            self.difference.std_error.to_string(),
            self.difference.lower.to_string(),
            self.difference.upper.to_string(),
            self.significant.to_string(),
        ]
    }
}

impl ResultRecord for SolutionComparison {
    fn columns() -> Vec<&'static str> {
        vec![
            "first",
            "second",
            "first_objective",
            "second_objective",
            "difference_half_width",
            "semi_hamming",
        ]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.first.to_string(),
            self.second.to_string(),
            self.first_objective.to_string(),
            self.second_objective.to_string(),
            self.difference_half_width.to_string(),
            self.semi_hamming.to_string(),
        ]
    }
}

impl ResultRecord for GapEstimate {
    fn columns() -> Vec<&'static str> {
        vec!["strategy", "gap_mean", "gap_std_dev", "gap_ci_width", "alpha", "replications"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.strategy.to_string(),
            self.mean.to_string(),
            self.std_dev.to_string(),
            self.ci_width.to_string(),
            self.alpha.to_string(),
            self.replications.to_string(),
        ]
    }
}

/// A configuration that could not be completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub stage: String,
    pub error: String,
}

impl ResultRecord for FailureRecord {
    fn columns() -> Vec<&'static str> {
        vec!["stage", "error"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.stage.clone(), self.error.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SpreadModel;

    fn params(k: usize) -> Parameters {
        Parameters {
            network: "net".to_string(),
            model: SpreadModel::NeighborThreshold,
            honeypots: k,
            repetitions: 10,
            target_fraction: 0.5,
            false_negative: 0.0,
            time_steps: 3,
            transmissibility: 0.2,
        }
    }

    fn failure(stage: &str) -> FailureRecord {
        FailureRecord {
            stage: stage.to_string(),
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_rows_follow_parameter_order() {
        let mut map = ResultMap::new();
        map.insert(params(3), failure("optimize"));
        map.insert(params(1), failure("simulate"));
        map.insert(params(3), failure("validate"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&params(3)).len(), 2);
        assert!(map.get(&params(2)).is_empty());

        let header = map.header();
        assert_eq!(header.len(), 8 + 2 + 1);
        assert_eq!(header[0], "network");
        assert_eq!(header[8], "stage");
        assert_eq!(header.last().map(String::as_str), Some("utc"));

        let rows = map.rows();
        let stages: Vec<&str> = rows.iter().map(|r| r[8].as_str()).collect();
        assert_eq!(stages, vec!["simulate", "optimize", "validate"]);
        assert_eq!(rows[0][1], "neighbor_threshold");
    }
}
