//! The agents of a replication and their disease state.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::duration::StageDurations;

/// Identifies an agent by its index in the population.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfectionStatus {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
}

/// A single agent: its stage, how long it has been there, the dwell times
/// it was created with, and its grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub status: InfectionStatus,
    pub time_in_status: u32,
    pub durations: StageDurations,
    pub x: usize,
    pub y: usize,
}

impl Agent {
    /// Moves the agent to `status` and restarts its stage clock.
    pub fn transition_to(&mut self, status: InfectionStatus) {
        self.status = status;
        self.time_in_status = 0;
    }

    /// Applies the first deterministic transition whose dwell time has
    /// elapsed: Exposed → Infectious, Infectious → Recovered, Recovered →
    /// Susceptible. Returns true if a transition fired.
    pub fn progress(&mut self) -> bool {
        let next = match self.status {
            InfectionStatus::Exposed if self.time_in_status >= self.durations.exposed => {
                InfectionStatus::Infectious
            }
            InfectionStatus::Infectious if self.time_in_status >= self.durations.infectious => {
                InfectionStatus::Recovered
            }
            InfectionStatus::Recovered if self.time_in_status >= self.durations.recovered => {
                InfectionStatus::Susceptible
            }
            _ => return false,
        };
        self.transition_to(next);
        true
    }
}

/// Number of agents in each stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub susceptible: usize,
    pub exposed: usize,
    pub infectious: usize,
    pub recovered: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.exposed + self.infectious + self.recovered
    }

    pub fn add(&mut self, status: InfectionStatus) {
        match status {
            InfectionStatus::Susceptible => self.susceptible += 1,
            InfectionStatus::Exposed => self.exposed += 1,
            InfectionStatus::Infectious => self.infectious += 1,
            InfectionStatus::Recovered => self.recovered += 1,
        }
    }

    #[must_use]
    pub fn get(&self, status: InfectionStatus) -> usize {
        match status {
            InfectionStatus::Susceptible => self.susceptible,
            InfectionStatus::Exposed => self.exposed,
            InfectionStatus::Infectious => self.infectious,
            InfectionStatus::Recovered => self.recovered,
        }
    }
}

impl Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "S={} E={} I={} R={}",
            self.susceptible, self.exposed, self.infectious, self.recovered
        )
    }
}

/// The agent store. Agent ids are indices into it and never change.
#[derive(Clone, Debug, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Population {
        Population {
            agents: Vec::with_capacity(capacity),
        }
    }

    /// Appends an agent and returns its id.
    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        let id = AgentId(self.agents.len());
        self.agents.push(agent);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0)
    }

    /// # Panics
    ///
    /// Panics if `id` is not in the population.
    pub fn get_mut(&mut self, id: AgentId) -> &mut Agent {
        &mut self.agents[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> {
        self.agents
            .iter()
            .enumerate()
            .map(|(index, agent)| (AgentId(index), agent))
    }

    /// Every agent id, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> {
        (0..self.agents.len()).map(AgentId)
    }

    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for agent in &self.agents {
            counts.add(agent.status);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(status: InfectionStatus, durations: (u32, u32, u32)) -> Agent {
        Agent {
            status,
            time_in_status: 0,
            durations: StageDurations {
                exposed: durations.0,
                infectious: durations.1,
                recovered: durations.2,
            },
            x: 0,
            y: 0,
        }
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut population = Population::with_capacity(2);
        let first = population.add_agent(agent(InfectionStatus::Susceptible, (1, 1, 1)));
        let second = population.add_agent(agent(InfectionStatus::Infectious, (1, 1, 1)));
        assert_eq!(first, AgentId(0));
        assert_eq!(second, AgentId(1));
        assert_eq!(population.len(), 2);
        assert_eq!(
            population.get(second).unwrap().status,
            InfectionStatus::Infectious
        );
        assert!(population.get(AgentId(2)).is_none());
        assert_eq!(population.ids().collect::<Vec<_>>(), vec![first, second]);
    }

    #[test]
    fn status_counts_sum_to_population() {
        let mut population = Population::default();
        for status in [
            InfectionStatus::Susceptible,
            InfectionStatus::Susceptible,
            InfectionStatus::Exposed,
            InfectionStatus::Infectious,
            InfectionStatus::Recovered,
        ] {
            population.add_agent(agent(status, (1, 1, 1)));
        }
        let counts = population.status_counts();
        assert_eq!(counts.susceptible, 2);
        assert_eq!(counts.get(InfectionStatus::Exposed), 1);
        assert_eq!(counts.total(), population.len());
        assert_eq!(counts.to_string(), "S=2 E=1 I=1 R=1");
    }

    #[test]
    fn progress_fires_only_at_threshold() {
        let mut a = agent(InfectionStatus::Exposed, (2, 3, 4));
        a.time_in_status = 1;
        assert!(!a.progress());
        assert_eq!(a.status, InfectionStatus::Exposed);

        a.time_in_status = 2;
        assert!(a.progress());
        assert_eq!(a.status, InfectionStatus::Infectious);
        assert_eq!(a.time_in_status, 0);

        a.time_in_status = 3;
        assert!(a.progress());
        assert_eq!(a.status, InfectionStatus::Recovered);

        a.time_in_status = 4;
        assert!(a.progress());
        assert_eq!(a.status, InfectionStatus::Susceptible);
    }

    #[test]
    fn progress_moves_one_stage_at_a_time() {
        // Every threshold is met, but only one transition may fire.
        let mut a = agent(InfectionStatus::Exposed, (1, 1, 1));
        a.time_in_status = 10;
        assert!(a.progress());
        assert_eq!(a.status, InfectionStatus::Infectious);
    }

    #[test]
    fn susceptible_never_progresses() {
        let mut a = agent(InfectionStatus::Susceptible, (1, 1, 1));
        a.time_in_status = 100;
        assert!(!a.progress());
        assert_eq!(a.status, InfectionStatus::Susceptible);
        assert_eq!(a.time_in_status, 100);
    }
}
