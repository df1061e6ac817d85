use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::runtime::ConfigBuilder;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

#[cfg(feature = "progress_bar")]
use super::progress_bar_encoder::ProgressBarSafeEncoder;
use crate::log::LogConfiguration;

// ISO 8601 timestamp, color coded level, module path
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

const APPENDER_NAME: &str = "stderr";

impl LogConfiguration {
    pub(in crate::log) fn is_installed(&self) -> bool {
        self.root_handle.is_some()
    }

    /// Rebuilds the `log4rs` configuration from the current levels and
    /// installs it, initializing the global logger on first use.
    pub(in crate::log) fn set_config(&mut self) {
        let encoder = Box::new(PatternEncoder::new(LOG_PATTERN));
        #[cfg(feature = "progress_bar")]
        let encoder = Box::new(ProgressBarSafeEncoder::new(encoder));
        // Standard output is left to the model.
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(encoder)
            .build();
        let mut config: ConfigBuilder =
            Config::builder().appender(Appender::builder().build(APPENDER_NAME, Box::new(console)));

        for (module, level) in &self.module_filters {
            config = config.logger(Logger::builder().build(module.clone(), *level));
        }

        let root = Root::builder()
            .appender(APPENDER_NAME)
            .build(self.global_log_level);
        let new_config = match config.build(root) {
            Ok(config) => config,
            Err(e) => panic!("failed to build log config: {e}"),
        };

        match self.root_handle {
            Some(ref handle) => handle.set_config(new_config),
            None => match log4rs::init_config(new_config) {
                Ok(handle) => self.root_handle = Some(handle),
                // Another logger owns the global slot (e.g. in a host binary).
                Err(e) => eprintln!("could not install logger: {e}"),
            },
        }
    }
}
