//! Model parameters.
//!
//! `Parameters` holds every constant of the model. The defaults describe a
//! population of 20,000 agents on a 300 × 300 grid followed for two years.
//! Parameters can be read from a JSON file in which any field may be omitted;
//! omitted fields keep their defaults.
//!
//! ```json
//! { "population_size": 5000, "grid_size": 150, "beta": 0.3 }
//! ```
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::SeirsError;
use crate::log::trace;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Number of agents.
    pub population_size: usize,
    /// Side length of the toroidal grid.
    pub grid_size: usize,
    /// Number of simulated days. The trajectory has `num_days + 1` rows.
    pub num_days: u32,
    /// Infection pressure per neighboring agent.
    pub beta: f64,
    /// Number of agents, taken from the start of the population, that begin
    /// Infectious.
    pub initial_infectious: usize,
    /// Mean of the Exposed dwell time, in days.
    pub mean_latent: f64,
    /// Mean of the Infectious dwell time, in days.
    pub mean_infectious: f64,
    /// Mean of the Recovered dwell time, in days.
    pub mean_immunity: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population_size: 20_000,
            grid_size: 300,
            num_days: 730,
            beta: 0.5,
            initial_infectious: 20,
            mean_latent: 3.0,
            mean_infectious: 7.0,
            mean_immunity: 365.0,
        }
    }
}

impl Parameters {
    /// Checks that the parameters describe a runnable model.
    ///
    /// # Errors
    ///
    /// Returns `SeirsError::ParameterError` naming the first offending field.
    pub fn validate(&self) -> Result<(), SeirsError> {
        if self.grid_size == 0 {
            return Err(SeirsError::ParameterError(
                "grid_size must be positive".to_string(),
            ));
        }
        if self.initial_infectious > self.population_size {
            return Err(SeirsError::ParameterError(format!(
                "initial_infectious ({}) exceeds population_size ({})",
                self.initial_infectious, self.population_size
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(SeirsError::ParameterError(format!(
                "beta must be a non-negative number, got {}",
                self.beta
            )));
        }
        for (name, mean) in [
            ("mean_latent", self.mean_latent),
            ("mean_infectious", self.mean_infectious),
            ("mean_immunity", self.mean_immunity),
        ] {
            if !mean.is_finite() || mean <= 0.0 {
                return Err(SeirsError::ParameterError(format!(
                    "{name} must be a positive number, got {mean}"
                )));
            }
        }
        Ok(())
    }

    /// Parses parameters from a JSON string and validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, has unknown fields, or the
    /// resulting parameters are invalid.
    pub fn from_json(json: &str) -> Result<Parameters, SeirsError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "  population_size:    {}", self.population_size)?;
        writeln!(f, "  grid_size:          {}", self.grid_size)?;
        writeln!(f, "  num_days:           {}", self.num_days)?;
        writeln!(f, "  beta:               {}", self.beta)?;
        writeln!(f, "  initial_infectious: {}", self.initial_infectious)?;
        writeln!(f, "  mean_latent:        {}", self.mean_latent)?;
        writeln!(f, "  mean_infectious:    {}", self.mean_infectious)?;
        write!(f, "  mean_immunity:      {}", self.mean_immunity)
    }
}

/// Reads and validates parameters from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold valid
/// parameters.
pub fn load_parameters(path: &Path) -> Result<Parameters, SeirsError> {
    trace!("loading parameters from {}", path.display());
    let json = fs::read_to_string(path)?;
    Parameters::from_json(&json)
}

define_data_plugin!(ParametersPlugin, Option<Parameters>, None);

pub trait ContextParametersExt {
    /// Validates and stores the parameters of this replication.
    ///
    /// # Errors
    ///
    /// Returns `SeirsError::ParameterError` if the parameters are invalid.
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), SeirsError>;

    /// # Panics
    ///
    /// Panics if `set_parameters` has not been called.
    fn get_parameters(&self) -> &Parameters;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), SeirsError> {
        parameters.validate()?;
        *self.get_data_container_mut(ParametersPlugin) = Some(parameters);
        Ok(())
    }

    fn get_parameters(&self) -> &Parameters {
        self.get_data_container(ParametersPlugin)
            .and_then(Option::as_ref)
            .expect("Parameters have not been set")
    }
}
