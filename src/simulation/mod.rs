//! Stochastic spread simulation.
//!
//! Produces [`ScenarioSet`]s of independent rollouts under one of three
//! contagion models, with reproducible per-rollout random streams, a cache
//! that extends earlier rollouts across a sweep, and time-budget calibration.

pub mod model;
pub mod rng;
pub mod rollout;
pub mod scenarios;
pub mod generator;
pub mod persistence;
pub mod calibration;

pub use model::{SeedChoice, SpreadModel};
pub use rng::StreamSeed;
pub use rollout::{Rollout, RolloutState};
pub use scenarios::{ScenarioKey, ScenarioSet};
pub use generator::{CacheStats, RolloutCache, ScenarioGenerator};
pub use calibration::{calibrate_time_step, CalibrationPoint, CalibrationReport, CalibrationRequest};
