//! reftrace binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match reftrace::cli::run() {
        Ok(code) => code,
        Err(e) => {
            reftrace::ui::output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
