//! The SEIRS day loop.
//!
//! `SeirsState` holds everything a replication mutates: the population, the
//! grid index and the processing order. `SeirsState::advance_day` performs
//! one simulated day against an explicit generator. The `ContextSeirsExt`
//! extension wires that state into a `Context`, driving one plan per day and
//! sending a `TrajectoryRow` report at the start of each day.
//!
//! Within a day agents are processed strictly one after another in a freshly
//! shuffled order. Each agent moves first and then reads the density of its
//! new neighborhood from the grid as it stands at that moment, so it sees the
//! new positions of every agent processed before it that day.
use std::cell::{Ref, RefCell};
use std::path::Path;

use serde::Serialize;

use crate::context::Context;
use crate::define_data_plugin;
use crate::define_report;
use crate::duration::StageDurations;
use crate::error::SeirsError;
use crate::grid::GridIndex;
use crate::log::{debug, info, trace};
use crate::parameters::{ContextParametersExt, Parameters};
use crate::population::{Agent, AgentId, InfectionStatus, Population, StatusCounts};
use crate::random::{ContextRandomExt, Xorshift64};
use crate::report::ContextReportExt;

/// One line of the trajectory output: `time,S,E,I,R`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrajectoryRow {
    pub time: u32,
    #[serde(rename = "S")]
    pub susceptible: usize,
    #[serde(rename = "E")]
    pub exposed: usize,
    #[serde(rename = "I")]
    pub infectious: usize,
    #[serde(rename = "R")]
    pub recovered: usize,
}

define_report!(TrajectoryRow);

impl TrajectoryRow {
    #[must_use]
    pub fn new(time: u32, counts: StatusCounts) -> TrajectoryRow {
        TrajectoryRow {
            time,
            susceptible: counts.susceptible,
            exposed: counts.exposed,
            infectious: counts.infectious,
            recovered: counts.recovered,
        }
    }
}

/// The mutable state of one replication.
#[derive(Clone, Debug)]
pub struct SeirsState {
    population: Population,
    grid: GridIndex,
    order: Vec<AgentId>,
    day: u32,
}

impl SeirsState {
    /// Creates the initial population.
    ///
    /// Agents are created in id order. The first `initial_infectious` start
    /// Infectious and the rest Susceptible. Each agent draws its three stage
    /// durations and then its `x` and `y` coordinates.
    pub fn new(parameters: &Parameters, rng: &mut Xorshift64) -> SeirsState {
        let n = parameters.population_size;
        let mut population = Population::with_capacity(n);
        let mut grid = GridIndex::new(parameters.grid_size);
        for index in 0..n {
            let status = if index < parameters.initial_infectious {
                InfectionStatus::Infectious
            } else {
                InfectionStatus::Susceptible
            };
            let durations = StageDurations::sample(
                rng,
                parameters.mean_latent,
                parameters.mean_infectious,
                parameters.mean_immunity,
            );
            let x = rng.sample_index(parameters.grid_size);
            let y = rng.sample_index(parameters.grid_size);
            let id = population.add_agent(Agent {
                status,
                time_in_status: 0,
                durations,
                x,
                y,
            });
            grid.insert(id, x, y);
        }
        let order = population.ids().collect();
        SeirsState {
            population,
            grid,
            order,
            day: 0,
        }
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// Number of days advanced so far.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        self.population.status_counts()
    }

    /// Runs one simulated day: shuffle the processing order, then move,
    /// age, and update each agent in turn.
    pub fn advance_day(&mut self, rng: &mut Xorshift64, beta: f64) {
        // The order carries over from the previous day and is reshuffled in place.
        rng.shuffle(&mut self.order);
        let size = self.grid.size();
        for &id in &self.order {
            let x = rng.sample_index(size);
            let y = rng.sample_index(size);
            let agent = self.population.get_mut(id);
            self.grid.move_agent(id, (agent.x, agent.y), (x, y));
            agent.x = x;
            agent.y = y;
            agent.time_in_status += 1;

            if agent.progress() || agent.status != InfectionStatus::Susceptible {
                continue;
            }

            let density = self.grid.density_around(x, y);
            if density > 0 {
                #[allow(clippy::cast_precision_loss)]
                let probability = 1.0 - (-beta * density as f64).exp();
                if rng.sample_bool(probability) {
                    agent.transition_to(InfectionStatus::Exposed);
                }
            }
        }
        self.day += 1;
    }

    /// Checks that every agent is indexed exactly once, at its own cell.
    #[must_use]
    pub fn grid_is_consistent(&self) -> bool {
        self.grid.total_indexed() == self.population.len()
            && self.grid.count_cells() == self.population.len()
            && self
                .population
                .iter()
                .all(|(id, agent)| self.grid.contains(id, agent.x, agent.y))
    }
}

struct SeirsData {
    state: RefCell<Option<SeirsState>>,
    error: Option<SeirsError>,
}

define_data_plugin!(
    SeirsPlugin,
    SeirsData,
    SeirsData {
        state: RefCell::new(None),
        error: None,
    }
);

fn get_state(context: &Context) -> Ref<'_, SeirsState> {
    let data_container = context
        .get_data_container(SeirsPlugin)
        .expect("The SEIRS model has not been initialized");
    Ref::map(data_container.state.borrow(), |state| {
        state
            .as_ref()
            .expect("The SEIRS model has not been initialized")
    })
}

fn schedule_day(context: &mut Context, day: u32) {
    trace!("scheduling day {day}");
    context.add_plan(f64::from(day), move |context| context.run_day(day));
}

pub trait ContextSeirsExt {
    /// Stores `parameters`, creates the population, and schedules day 0.
    ///
    /// The random number generator must already be initialized.
    ///
    /// # Errors
    ///
    /// Returns `SeirsError::ParameterError` if the parameters are invalid.
    fn init_seirs_model(&mut self, parameters: Parameters) -> Result<(), SeirsError>;

    /// Records the counts of `day` and, unless it is the last day, advances
    /// the population and schedules the next day.
    fn run_day(&mut self, day: u32);

    /// Executes the day loop to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while writing the trajectory.
    fn run_seirs_model(&mut self) -> Result<StatusCounts, SeirsError>;

    fn get_status_counts(&self) -> StatusCounts;

    fn get_agent(&self, id: AgentId) -> Option<Agent>;

    /// Number of days the population has been advanced.
    fn get_day(&self) -> u32;

    fn with_grid<R>(&self, f: impl FnOnce(&GridIndex) -> R) -> R;

    fn check_grid_consistency(&self) -> bool;
}

impl ContextSeirsExt for Context {
    fn init_seirs_model(&mut self, parameters: Parameters) -> Result<(), SeirsError> {
        self.set_parameters(parameters)?;
        let state = self.sample(|rng| SeirsState::new(&parameters, rng));
        let data_container = self.get_data_container_mut(SeirsPlugin);
        *data_container.state.get_mut() = Some(state);
        data_container.error = None;
        schedule_day(self, 0);
        Ok(())
    }

    fn run_day(&mut self, day: u32) {
        let counts = self.get_status_counts();
        debug!("day {day}: {counts}");
        if let Err(error) = self.send_report(TrajectoryRow::new(day, counts)) {
            self.get_data_container_mut(SeirsPlugin).error = Some(error);
            self.shutdown();
            return;
        }

        let parameters = *self.get_parameters();
        if day >= parameters.num_days {
            return;
        }

        {
            let data_container = self
                .get_data_container(SeirsPlugin)
                .expect("The SEIRS model has not been initialized");
            let mut state = data_container.state.borrow_mut();
            let state = state
                .as_mut()
                .expect("The SEIRS model has not been initialized");
            self.sample(|rng| state.advance_day(rng, parameters.beta));
        }
        schedule_day(self, day + 1);
    }

    fn run_seirs_model(&mut self) -> Result<StatusCounts, SeirsError> {
        self.execute();
        if let Some(error) = self.get_data_container_mut(SeirsPlugin).error.take() {
            return Err(error);
        }
        Ok(self.get_status_counts())
    }

    fn get_status_counts(&self) -> StatusCounts {
        get_state(self).status_counts()
    }

    fn get_agent(&self, id: AgentId) -> Option<Agent> {
        get_state(self).population().get(id).cloned()
    }

    fn get_day(&self) -> u32 {
        get_state(self).day()
    }

    fn with_grid<R>(&self, f: impl FnOnce(&GridIndex) -> R) -> R {
        f(get_state(self).grid())
    }

    fn check_grid_consistency(&self) -> bool {
        get_state(self).grid_is_consistent()
    }
}

/// Runs one replication with the given seed and writes its trajectory to
/// `output`. Returns the counts of the final day.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or the trajectory cannot
/// be written. Nothing is left at `output` in that case.
pub fn run_replication(
    parameters: Parameters,
    seed: u64,
    output: &Path,
) -> Result<StatusCounts, SeirsError> {
    info!(
        "Running replication with seed {seed}, writing to {}",
        output.display()
    );
    parameters.validate()?;
    let mut context = Context::new();
    context.init_random(seed);
    context.add_report::<TrajectoryRow>(output)?;
    context.init_seirs_model(parameters)?;
    let counts = context.run_seirs_model()?;
    context.finish_reports()?;
    info!("Replication with seed {seed} finished: {counts}");
    Ok(counts)
}
