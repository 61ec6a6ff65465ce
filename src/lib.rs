//! # Honeypotsim - Sample-average-approximation honeypot placement
//!
//! This library chooses where to place a fixed number of honeypots in a
//! network so that a stochastic contagion starting from an unknown vertex
//! is detected as often as possible.
//!
//! ## Overview
//!
//! A contagion model (single attempt, repeated attempt, or neighbour
//! threshold) is rolled out many times on the network. Each rollout becomes
//! one scenario row recording which vertices would have detected the
//! spread. Selecting honeypots is then a maximum-coverage problem over those
//! rows, solved with centrality heuristics, a greedy algorithm with an
//! approximation guarantee, or an exact mixed-integer program. Independent
//! held-out scenarios measure how well each selection generalises.
//!
//! ## Architecture
//!
//! - `graph`: undirected networks, edge-list loading, generators and analytics
//! - `params`: the eight-field configuration key shared by every stage
//! - `simulation`: spread models, reproducible scenario generation, caching,
//!   persistence and time-step calibration
//! - `optimize`: coverage matrices and the placement strategies
//! - `solver`: the MIP model, its solver trait and a bundled branch-and-bound
//! - `validation`: sampling error, paired tests, solution comparison and
//!   replication-based gap estimates
//! - `stats`: confidence intervals and distribution quantiles
//! - `report`: CSV result tables and JSON summaries
//! - `config` / `config_loader`: YAML experiment files
//! - `experiment`: the sweep orchestrator
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use honeypotsim::graph::generators;
//! use honeypotsim::optimize::{CoverageMatrix, HoneypotOptimizer, MaxRowsGreedy};
//! use honeypotsim::params::Parameters;
//! use honeypotsim::simulation::{ScenarioGenerator, SpreadModel, StreamSeed};
//!
//! let graph = generators::circulant(20, &[1, 2])?;
//! let params = Parameters {
//!     network: graph.name().to_string(),
//!     model: SpreadModel::RepeatedAttempt,
//!     honeypots: 3,
//!     repetitions: 500,
//!     target_fraction: 1.0,
//!     false_negative: 0.0,
//!     time_steps: 6,
//!     transmissibility: 0.4,
//! };
//!
//! let scenarios = ScenarioGenerator::new(&graph).generate(&params, StreamSeed::new(7))?;
//! let coverage = CoverageMatrix::from_scenarios(&scenarios)?;
//! let solution = MaxRowsGreedy.optimize(&graph, &coverage, params.honeypots)?;
//! println!("{:?} detects {:.3}", solution.honeypots, solution.objective);
//! # Ok::<(), honeypotsim::error::HoneypotError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`error::Result`] with a typed
//! [`error::HoneypotError`]. The orchestrator and the binary wrap those in
//! `color_eyre` reports that carry file paths and experiment names.

pub mod error;
pub mod graph;
pub mod params;
pub mod stats;

pub mod simulation;
pub mod solver;
pub mod optimize;
pub mod validation;

pub mod report;
pub mod config;
pub mod config_loader;
pub mod experiment;
