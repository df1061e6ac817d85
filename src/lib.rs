//! A spatially-explicit agent-based SEIRS model
//!
//! Agents live on a toroidal grid and cycle through the Susceptible, Exposed,
//! Infectious and Recovered stages of an SEIRS disease. Every simulated day
//! each agent is relocated to a uniformly random cell, ages in its current
//! stage, and, if susceptible, may become exposed with a probability that
//! grows with the number of agents in the surrounding 3×3 neighborhood.
//!
//! The central object of a simulation is the `Context`, which owns all of the
//! simulation state through data plugins and drives the day loop through its
//! plan queue. Model state lives in a few modules that rely on the `Context`:
//! * `random` provides the seeded xorshift random source that every
//!   stochastic decision draws from.
//! * `duration` turns uniform draws into stage dwell times.
//! * `grid` keeps the cell → agent index that density queries read.
//! * `population` holds the agents themselves.
//! * `model` orchestrates the daily update and emits the trajectory.
//!
//! A single replication is deterministic for a given seed. Replications are
//! fully independent of one another and may be run on separate threads; see
//! `runner`.
pub mod context;
pub mod duration;
pub mod error;
pub mod execution_stats;
pub mod grid;
pub mod log;
pub mod model;
pub mod parameters;
pub mod plan;
pub mod population;
#[cfg(feature = "progress_bar")]
pub mod progress;
pub mod random;
pub mod report;
pub mod runner;

pub mod prelude;

// Re-exports for use in macros and by model code.
pub use csv;
pub use rand;
pub use serde;

pub use context::{Context, DataPlugin};
pub use error::SeirsError;
pub use report::{ContextReportExt, Report};

// Data plugins and log configuration are keyed with a fast, non-cryptographic hash.
pub(crate) use rustc_hash::FxHashMap as HashMap;
