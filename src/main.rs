use std::process::ExitCode;

use seirs_grid::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("seirs-grid: {error}");
            ExitCode::FAILURE
        }
    }
}
