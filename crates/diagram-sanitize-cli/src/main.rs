//! sanitize-diagram entry point.

use std::{env, process, str::FromStr};

use log::{LevelFilter, debug, info};

use diagram_sanitize::SanitizeError;
use diagram_sanitize_cli::{
    args::{self, ArgsError},
    error_adapter,
};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = match args::parse_from(env::args_os()) {
        Ok(args) => args,
        Err(ArgsError::Display(err)) => err.exit(),
        Err(err) => {
            println!("{err}");
            process::exit(1);
        }
    };

    // Initialize the logger with the specified log level
    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting sanitize-diagram");
    debug!(args:?; "Parsed arguments");

    match diagram_sanitize_cli::run(&args) {
        Ok(summary) => println!("{summary}"),
        Err(err @ SanitizeError::NotFound(_)) => {
            println!("{err}");
            process::exit(1);
        }
        Err(err) => {
            println!("{}", error_adapter::render(&err));
            process::exit(1);
        }
    }

    info!("Completed successfully");
}
