//! Experiment configuration key.
//!
//! [`Parameters`] identifies one experiment point. Equality, hashing and
//! ordering cover every field; floating-point fields compare by bit
//! pattern so the key is a proper `Eq + Hash` map key.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{HoneypotError, Result};
use crate::simulation::SpreadModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    pub network: String,
    pub model: SpreadModel,
    /// Honeypot count k
    pub honeypots: usize,
    /// Scenario repetitions R
    pub repetitions: usize,
    /// Infected fraction at which a rollout stops, in (0, 1]
    pub target_fraction: f64,
    pub false_negative: f64,
    /// Time-step budget per rollout
    pub time_steps: usize,
    pub transmissibility: f64,
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(HoneypotError::Configuration(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        if self.network.is_empty() {
            return Err(HoneypotError::Configuration(
                "network name cannot be empty".to_string(),
            ));
        }
        if self.honeypots == 0 {
            return Err(HoneypotError::Configuration(
                "honeypot count must be positive".to_string(),
            ));
        }
        if self.repetitions == 0 {
            return Err(HoneypotError::Configuration(
                "repetition count must be positive".to_string(),
            ));
        }
        if !(self.target_fraction > 0.0 && self.target_fraction <= 1.0) {
            return Err(HoneypotError::Configuration(format!(
                "target fraction must lie in (0, 1], got {}",
                self.target_fraction
            )));
        }
        check_probability("false-negative probability", self.false_negative)?;
        check_probability("transmissibility", self.transmissibility)?;
        Ok(())
    }

    /// Validate that `k` honeypots can be placed among `vertices` vertices
    pub fn check_cardinality(&self, vertices: usize) -> Result<()> {
        if self.honeypots > vertices {
            return Err(HoneypotError::Configuration(format!(
                "{} honeypots requested but {} has only {} vertices",
                self.honeypots, self.network, vertices
            )));
        }
        Ok(())
    }

    fn integer_fields(&self) -> (&str, SpreadModel, usize, usize, usize) {
        (
            &self.network,
            self.model,
            self.honeypots,
            self.repetitions,
            self.time_steps,
        )
    }

    fn float_fields(&self) -> [f64; 3] {
        [self.target_fraction, self.false_negative, self.transmissibility]
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Parameters {}

impl Hash for Parameters {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.integer_fields().hash(state);
        for x in self.float_fields() {
            x.to_bits().hash(state);
        }
    }
}

impl PartialOrd for Parameters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Parameters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.integer_fields()
            .cmp(&other.integer_fields())
            .then_with(|| {
                self.float_fields()
                    .iter()
                    .zip(other.float_fields().iter())
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} k={} R={} target={} fn={} T={} p={}",
            self.network,
            self.model,
            self.honeypots,
            self.repetitions,
            self.target_fraction,
            self.false_negative,
            self.time_steps,
            self.transmissibility
        )
    }
}
