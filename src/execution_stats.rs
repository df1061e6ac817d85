//! Wall time, CPU time and peak memory of a run.
//!
//! Create an `ExecutionProfilingCollector` before the work starts, call
//! `refresh` in a loop while it runs, and `compute_final_statistics` at the
//! end. The runner calls `refresh` from the coordinating thread while the
//! replications run on worker threads. Figures are also reported per agent-day, the unit of work of the
//! day loop.

// Loss of precision is allowable in this module's use cases.
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use bytesize::ByteSize;
use humantime::format_duration;
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::log::{debug, error, info};

/// How often `refresh` polls memory use.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Final statistics. The per agent-day figures are zero when no agent-days
/// were simulated.
#[derive(Debug, Serialize)]
pub struct ExecutionStatistics {
    pub max_memory_usage: u64,
    pub cpu_time: Duration,
    pub wall_time: Duration,

    pub replications: usize,
    pub agent_days: u64,
    pub wall_time_per_agent_day: Duration,
    pub agent_days_per_second: f64,
}

pub struct ExecutionProfilingCollector {
    start_time: Instant,
    last_refresh: Instant,
    /// CPU-milliseconds the process had used when the collector was created.
    start_cpu_time: u64,
    max_memory_usage: u64,
    system: System,
    /// `None` on platforms where `sysinfo` cannot see the current process.
    process_id: Option<Pid>,
}

impl ExecutionProfilingCollector {
    #[must_use]
    pub fn new() -> ExecutionProfilingCollector {
        let process_id = sysinfo::get_current_pid().ok();
        let now = Instant::now();
        let mut collector = ExecutionProfilingCollector {
            start_time: now,
            last_refresh: now,
            start_cpu_time: 0,
            max_memory_usage: 0,
            system: System::new(),
            process_id,
        };
        if let Some(process_id) = process_id {
            debug!("Process ID: {process_id}");
            collector.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = collector.system.process(process_id) {
                collector.max_memory_usage = process.memory();
                collector.start_cpu_time = process.accumulated_cpu_time();
            }
        }
        collector
    }

    /// Polls memory use if at least `REFRESH_INTERVAL` has passed since the
    /// last poll, so it can be called as often as the caller likes.
    #[inline]
    pub fn refresh(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.poll_memory();
            self.last_refresh = Instant::now();
        }
    }

    fn poll_memory(&mut self) {
        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
            }
        }
    }

    /// CPU-milliseconds used by the process since the collector was created.
    pub fn cpu_time(&mut self) -> u64 {
        let Some(pid) = self.process_id else {
            return 0;
        };
        self.update_system_info(ProcessRefreshKind::nothing().with_cpu());
        self.system.process(pid).map_or(0, |process| {
            process
                .accumulated_cpu_time()
                .saturating_sub(self.start_cpu_time)
        })
    }

    fn update_system_info(&mut self, process_refresh_kind: ProcessRefreshKind) {
        if let Some(pid) = self.process_id {
            if self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                process_refresh_kind,
            ) < 1
            {
                error!("could not refresh process statistics");
            }
        }
    }

    /// Computes the summary for `replications` runs of `population_size`
    /// agents over `num_days` days each.
    pub fn compute_final_statistics(
        &mut self,
        replications: usize,
        population_size: usize,
        num_days: u32,
    ) -> ExecutionStatistics {
        self.poll_memory();
        let cpu_time = Duration::from_millis(self.cpu_time());
        let wall_time = self.start_time.elapsed();

        let agent_days = replications as u64 * population_size as u64 * u64::from(num_days);
        let (wall_time_per_agent_day, agent_days_per_second) = if agent_days > 0 {
            let seconds = wall_time.as_secs_f64();
            (
                Duration::from_secs_f64(seconds / agent_days as f64),
                if seconds > 0.0 {
                    agent_days as f64 / seconds
                } else {
                    0.0
                },
            )
        } else {
            (Duration::ZERO, 0.0)
        };

        ExecutionStatistics {
            max_memory_usage: self.max_memory_usage,
            cpu_time,
            wall_time,
            replications,
            agent_days,
            wall_time_per_agent_day,
            agent_days_per_second,
        }
    }
}

impl Default for ExecutionProfilingCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats the statistics as an aligned table, one figure per line.
#[must_use]
pub fn format_execution_statistics(summary: &ExecutionStatistics) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.max_memory_usage == 0 {
        lines.push("Memory and CPU statistics are not available on your platform.".to_string());
    } else {
        lines.push(format!(
            "{:<25}{}",
            "Max memory usage:",
            ByteSize::b(summary.max_memory_usage)
        ));
        lines.push(format!("{:<25}{}", "CPU time:", format_duration(summary.cpu_time)));
    }
    lines.push(format!("{:<25}{}", "Wall time:", format_duration(summary.wall_time)));
    lines.push(format!("{:<25}{}", "Replications:", summary.replications));
    if summary.agent_days > 0 {
        lines.push(format!("{:<25}{}", "Agent-days:", summary.agent_days));
        lines.push(format!(
            "{:<25}{}",
            "Wall time per agent-day:",
            format_duration(summary.wall_time_per_agent_day)
        ));
        lines.push(format!(
            "{:<25}{:.0}",
            "Agent-days per second:", summary.agent_days_per_second
        ));
    }
    lines
}

/// Prints the statistics to standard error, keeping standard output clean.
pub fn print_execution_statistics(summary: &ExecutionStatistics) {
    eprintln!("━━━━ Execution Summary ━━━━");
    for line in format_execution_statistics(summary) {
        eprintln!("{line}");
    }
}

pub fn log_execution_statistics(summary: &ExecutionStatistics) {
    info!("Execution complete.");
    for line in format_execution_statistics(summary) {
        info!("{}", line.split_whitespace().collect::<Vec<_>>().join(" "));
    }
}
