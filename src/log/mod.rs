//! Diagnostic logging.
//!
//! This module re-exports the five `log` macros (`error!`, `warn!`, `info!`,
//! `debug!`, `trace!`) and owns the global logger configuration. Logging is
//! a diagnostic channel only; the trajectory itself is a report and never goes
//! through the logger.
//!
//! Logging is off by default. It is switched on from the command line with
//! `-v`/`-vv`/`-vvv` or `--log-level`, or from code:
//!
//! ```rust
//! use seirs_grid::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Per-day counts from the model, but only warnings from everything else.
//! set_log_level(LevelFilter::Warn);
//! set_module_filter("seirs_grid::model", LevelFilter::Debug);
//! ```
//!
//! Messages go to standard error, one line each, formatted as
//! `2026-01-01T12:00:00Z INFO seirs_grid::model - message`.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

#[cfg(all(feature = "logging", feature = "progress_bar"))]
mod progress_bar_encoder;

use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::error::SeirsError;
use crate::HashMap;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The global level plus per-module overrides, keyed by module path
/// (e.g. `"seirs_grid::model"`).
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_filters: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<log4rs::Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_filters: HashMap::default(),
            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn apply<I>(&mut self, global: Option<LevelFilter>, filters: I)
    where
        I: IntoIterator<Item = (String, LevelFilter)>,
    {
        let mut changed = false;
        if let Some(level) = global {
            changed |= self.global_log_level != level;
            self.global_log_level = level;
        }
        for (module, level) in filters {
            changed |= self.module_filters.insert(module, level) != Some(level);
        }
        // The first call always installs the logger, even if nothing changed.
        if changed || !self.is_installed() {
            self.set_config();
        }
    }
}

/// A parsed `--log-level` argument: an optional global level and any number
/// of `module=level` overrides.
#[derive(Debug, Default, PartialEq)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SeirsError;

    /// Parses `info`, `seirs_grid::model=debug` or a comma separated mix such
    /// as `warn,seirs_grid::model=trace`.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parse_level = |level: &str| {
            LevelFilter::from_str(level.trim())
                .map_err(|_| SeirsError::SeirsError(format!("Invalid log level '{level}'")))
        };
        let mut parsed = LogSpec::default();
        for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    if module.is_empty() {
                        return Err(SeirsError::SeirsError(format!(
                            "Missing module name in log filter '{part}'"
                        )));
                    }
                    parsed.modules.push((module.to_string(), parse_level(level)?));
                }
                None => {
                    if parsed.global.is_some() {
                        return Err(SeirsError::SeirsError(format!(
                            "More than one global log level in '{spec}'"
                        )));
                    }
                    parsed.global = Some(parse_level(part)?);
                }
            }
        }
        Ok(parsed)
    }
}

/// Maps a `-v` count to a level: 1 is info, 2 is debug, 3 or more is trace.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

// The public API

/// Turns on every log message. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns off logging for every module without an override.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for modules without an override.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().apply(Some(level), std::iter::empty());
}

/// Sets the level for `module_path` and everything below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    get_log_configuration().apply(None, [(module_path.to_string(), level)]);
}

/// Sets several module levels at once, rebuilding the logger only once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().apply(
        None,
        module_filters
            .iter()
            .map(|(module, level)| ((*module).to_string(), *level)),
    );
}

/// Removes the override for `module_path`; the global level applies again.
pub fn remove_module_filter(module_path: &str) {
    let mut log_configuration = get_log_configuration();
    if log_configuration.module_filters.remove(module_path).is_some() {
        log_configuration.set_config();
    }
}

/// Applies a parsed `--log-level` argument.
pub fn apply_log_spec(spec: &LogSpec) {
    get_log_configuration().apply(spec.global, spec.modules.iter().cloned());
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
