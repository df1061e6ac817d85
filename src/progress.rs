//! Terminal progress bars.
//!
//! Two bars are provided, only one of which can be shown at a time:
//!
//! * a timeline bar that follows the simulated days of a single replication.
//!   Once initialized, `Context::execute` advances it before every plan and it
//!   finishes itself when the last day is reached.
//! * a replication bar that counts finished replications in batch mode.
//!
//! Both are process wide. Initializing the timeline bar a second time is
//! ignored with a warning.
use std::sync::OnceLock;

use progress_bar::{
    finalize_progress_bar, inc_progress_bar, init_progress_bar, set_progress_bar_action,
    set_progress_bar_progress, Color, Style,
};

use crate::log::{trace, warn};

/// The last simulated day, as a plan time.
static MAX_TIME: OnceLock<f64> = OnceLock::new();

/// Shows a bar running from day 0 to `num_days`.
pub fn init_timeline_progress_bar(num_days: u32) {
    trace!("initializing timeline progress bar for {num_days} days");
    let max_time = f64::from(num_days);
    if MAX_TIME.set(max_time).is_err() {
        warn!("timeline progress bar is already initialized");
        return;
    }
    init_progress_bar(num_days as usize);
    set_progress_bar_action("Day", Color::Blue, Style::Bold);
}

/// Moves the timeline bar to `current_time`. Does nothing if the bar was
/// never initialized.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn update_timeline_progress(current_time: f64) {
    let Some(&max_time) = MAX_TIME.get() else {
        return;
    };
    let current_time = current_time.min(max_time);
    set_progress_bar_progress(current_time.round() as usize);
    #[allow(clippy::float_cmp)]
    if current_time == max_time {
        finalize_progress_bar();
    }
}

/// Shows a bar counting finished replications out of `replications`.
pub fn init_replication_progress_bar(replications: usize) {
    trace!("initializing replication progress bar for {replications} replications");
    init_progress_bar(replications);
    set_progress_bar_action("Replications", Color::Green, Style::Bold);
}

pub fn increment_replication_progress() {
    inc_progress_bar();
}

pub fn finish_replication_progress() {
    finalize_progress_bar();
}
