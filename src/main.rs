//! Lottigen - Command-line tool for converting sprite sheets into Lottie animations

use std::process::ExitCode;

use lottigen::cli;

fn main() -> ExitCode {
    env_logger::init();
    cli::run()
}
