//! Stands in for the console logger when the `logging` feature is off. The
//! configuration is still tracked so the public API behaves the same.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn is_installed(&self) -> bool {
        true
    }

    pub(in crate::log) fn set_config(&mut self) {
        let most_verbose = self
            .module_filters
            .values()
            .copied()
            .fold(self.global_log_level, Ord::max);
        log::set_max_level(most_verbose);
    }
}
