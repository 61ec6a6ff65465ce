//! Contagion model variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HoneypotError;
use crate::graph::VertexId;

/// How infection crosses an edge between discrete time steps.
///
/// All variants update synchronously: vertices infected during step `t`
/// start transmitting at step `t + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadModel {
    /// Model A. A newly infected vertex tries each susceptible neighbour
    /// exactly once, in the step after its own infection. A failed attempt
    /// spends that edge for good.
    SingleAttempt,
    /// Model B. Every infected vertex retries every susceptible neighbour
    /// at every step.
    RepeatedAttempt,
    /// Model C. A susceptible vertex with at least one infected neighbour
    /// gets one draw per step, whatever the number of infected neighbours.
    NeighborThreshold,
}

impl SpreadModel {
    pub const ALL: [SpreadModel; 3] = [
        SpreadModel::SingleAttempt,
        SpreadModel::RepeatedAttempt,
        SpreadModel::NeighborThreshold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadModel::SingleAttempt => "single_attempt",
            SpreadModel::RepeatedAttempt => "repeated_attempt",
            SpreadModel::NeighborThreshold => "neighbor_threshold",
        }
    }
}

impl fmt::Display for SpreadModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpreadModel {
    type Err = HoneypotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single_attempt" | "a" => Ok(SpreadModel::SingleAttempt),
            "repeated_attempt" | "b" => Ok(SpreadModel::RepeatedAttempt),
            "neighbor_threshold" | "c" => Ok(SpreadModel::NeighborThreshold),
            other => Err(HoneypotError::Configuration(format!(
                "unknown spread model '{}'",
                other
            ))),
        }
    }
}

/// Where each rollout's initial infection comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedChoice {
    /// Uniformly random vertex, drawn from the rollout's own stream
    #[default]
    Random,
    Fixed(VertexId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_round_trip() {
        for model in SpreadModel::ALL {
            assert_eq!(model.as_str().parse::<SpreadModel>().unwrap(), model);
        }
        assert_eq!("B".parse::<SpreadModel>().unwrap(), SpreadModel::RepeatedAttempt);
        assert!("sir".parse::<SpreadModel>().is_err());
    }

    #[test]
    fn test_model_yaml_form() {
        let model: SpreadModel = serde_yaml::from_str("neighbor_threshold").unwrap();
        assert_eq!(model, SpreadModel::NeighborThreshold);
    }
}
