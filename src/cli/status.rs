//! Status command implementation

use std::process::ExitCode;

use crate::config::Config;
use crate::status::StatusStore;
use crate::tracker::{print_detailed_status, print_status};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the status command: completion report from the status store.
pub fn run_status(config: &Config, detailed: bool) -> ExitCode {
    let store = match StatusStore::load(&config.project.status_file) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if detailed {
        print_detailed_status(config, &store);
    } else {
        println!();
        print_status(config, &store);
    }

    ExitCode::from(EXIT_SUCCESS)
}
