//! The command line front end.
//!
//! ```text
//! seirs-grid <REPLICATION_ID> <OUTPUT> [--config FILE] [--replications N]
//!            [--log-level SPEC] [-v...] [--timeit] [--progress]
//! ```
//!
//! A single replication writes its trajectory to `OUTPUT`. With
//! `--replications N`, replications `REPLICATION_ID .. REPLICATION_ID + N`
//! run concurrently, one `Context` per thread, and replication `k` writes to
//! `<stem>_<k>.<ext>` next to `OUTPUT`.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use clap::{ArgAction, Args, Command, FromArgMatches as _};

use crate::error::SeirsError;
use crate::execution_stats::{
    log_execution_statistics, print_execution_statistics, ExecutionProfilingCollector,
};
use crate::log::{apply_log_spec, info, level_for_verbosity, set_log_level, LogSpec};
use crate::model::run_replication;
use crate::parameters::{load_parameters, Parameters};
use crate::population::StatusCounts;
use crate::random::replication_seed;

/// How long the coordinating thread sleeps between memory polls.
const MONITOR_INTERVAL: Duration = Duration::from_millis(10);

/// Command line arguments of the `seirs-grid` binary
#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Replication identifier; the random seed is derived from it
    pub replication_id: u64,

    /// Path of the CSV trajectory to write
    pub output: PathBuf,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of consecutive replications to run, starting at REPLICATION_ID
    #[arg(short = 'n', long, default_value_t = 1)]
    pub replications: u64,

    /// Log level, or comma separated `module=level` filters, e.g. `warn,seirs_grid::model=debug`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print execution statistics when the run finishes
    #[arg(long)]
    pub timeit: bool,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

fn create_cli() -> Command {
    let cli = Command::new("seirs-grid")
        .about("Spatially-explicit agent-based SEIRS model on a toroidal grid");
    BaseArgs::augment_args(cli)
}

/// Parses the process arguments and runs the requested replications.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or any replication fails.
pub fn run_with_args() -> Result<Vec<StatusCounts>, SeirsError> {
    let matches = create_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches).map_err(|e| SeirsError::from(e.to_string()))?;
    run_with_base_args(&args)
}

/// Parses `args` as if they were given on the command line. The first item
/// is the program name.
///
/// # Errors
///
/// Returns an error if the arguments do not parse.
pub fn parse_args<I, T>(args: I) -> Result<BaseArgs, SeirsError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = create_cli()
        .try_get_matches_from(args)
        .map_err(|e| SeirsError::from(e.to_string()))?;
    BaseArgs::from_arg_matches(&matches).map_err(|e| SeirsError::from(e.to_string()))
}

fn setup_logging(args: &BaseArgs) -> Result<(), SeirsError> {
    if args.verbose > 0 {
        set_log_level(level_for_verbosity(args.verbose));
    }
    if let Some(spec) = &args.log_level {
        let spec: LogSpec = spec.parse()?;
        apply_log_spec(&spec);
        if let Some(level) = spec.global {
            info!("Logging enabled at level {level}");
        }
        for (module, level) in &spec.modules {
            info!("Logging enabled for {module} at level {level}");
        }
    }
    Ok(())
}

/// Where replication `replication_id` writes its trajectory in batch mode:
/// `<stem>_<id>.<ext>` in the directory of `output`.
#[must_use]
pub fn replication_output_path(output: &Path, replication_id: u64) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match output.extension() {
        Some(extension) => format!("{stem}_{replication_id}.{}", extension.to_string_lossy()),
        None => format!("{stem}_{replication_id}"),
    };
    output.with_file_name(file_name)
}

/// Runs the replications described by `args`.
///
/// # Errors
///
/// Returns an error if the parameters cannot be loaded or any replication
/// fails. In batch mode the remaining replications still run and the error of
/// the lowest failing id is returned.
pub fn run_with_base_args(args: &BaseArgs) -> Result<Vec<StatusCounts>, SeirsError> {
    setup_logging(args)?;

    let parameters = match &args.config {
        Some(path) => {
            info!("Loading parameters from: {}", path.display());
            load_parameters(path)?
        }
        None => Parameters::default(),
    };
    parameters.validate()?;
    info!("Running model with parameters:\n{parameters}");

    if args.replications == 0 {
        return Err(SeirsError::from("--replications must be at least 1"));
    }
    if args.replication_id.checked_add(args.replications - 1).is_none() {
        return Err(SeirsError::from("replication ids overflow u64"));
    }

    let mut collector = ExecutionProfilingCollector::new();
    let results = run_monitored(&mut collector, || {
        if args.replications == 1 {
            #[cfg(feature = "progress_bar")]
            if args.progress {
                crate::progress::init_timeline_progress_bar(parameters.num_days);
            }
            run_replication(
                parameters,
                replication_seed(args.replication_id),
                &args.output,
            )
            .map(|counts| vec![counts])
        } else {
            run_batch(args, parameters)
        }
    })?;

    #[allow(clippy::cast_possible_truncation)]
    let statistics = collector.compute_final_statistics(
        args.replications as usize,
        parameters.population_size,
        parameters.num_days,
    );
    log_execution_statistics(&statistics);
    if args.timeit {
        print_execution_statistics(&statistics);
    }
    Ok(results)
}

/// Runs `work` on a scoped thread and polls `collector` until it returns, so
/// the memory figure is the peak over the whole run.
pub fn run_monitored<T, F>(collector: &mut ExecutionProfilingCollector, work: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    thread::scope(|scope| {
        let handle = scope.spawn(work);
        while !handle.is_finished() {
            collector.refresh();
            thread::sleep(MONITOR_INTERVAL);
        }
        match handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    })
}

fn run_batch(args: &BaseArgs, parameters: Parameters) -> Result<Vec<StatusCounts>, SeirsError> {
    let replications = args.replications;
    let workers = thread::available_parallelism()
        .map_or(1, usize::from)
        .min(usize::try_from(replications).unwrap_or(usize::MAX));
    info!("Running {replications} replications on {workers} threads");

    #[cfg(feature = "progress_bar")]
    if args.progress {
        #[allow(clippy::cast_possible_truncation)]
        crate::progress::init_replication_progress_bar(replications as usize);
    }

    let next = AtomicU64::new(0);
    let results: Mutex<Vec<(u64, Result<StatusCounts, SeirsError>)>> = Mutex::new(Vec::new());
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let offset = next.fetch_add(1, Ordering::Relaxed);
                if offset >= replications {
                    break;
                }
                let replication_id = args.replication_id + offset;
                let output = replication_output_path(&args.output, replication_id);
                let result =
                    run_replication(parameters, replication_seed(replication_id), &output);
                results
                    .lock()
                    .expect("Mutex poisoned")
                    .push((replication_id, result));
                #[cfg(feature = "progress_bar")]
                if args.progress {
                    crate::progress::increment_replication_progress();
                }
            });
        }
    });

    #[cfg(feature = "progress_bar")]
    if args.progress {
        crate::progress::finish_replication_progress();
    }

    let mut results = results.into_inner().expect("Mutex poisoned");
    results.sort_by_key(|(replication_id, _)| *replication_id);
    results.into_iter().map(|(_, result)| result).collect()
}
