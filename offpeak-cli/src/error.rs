//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use offpeak::scheduler::SchedulerError;
use std::fmt;
use std::io;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Batch run failed
    Batch(SchedulerError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Batch(SchedulerError::InitialLimit(_)) => {
                eprintln!();
                eprintln!("The concurrency limit source failed before any task ran.");
                eprintln!("With the built-in time-of-day policy this points at a clock");
                eprintln!("problem; with --fixed-limit it should not happen at all.");
            }
            CliError::LoggingInit(_) => {
                eprintln!();
                eprintln!("Check that the log directory is writable, or drop --log-dir");
                eprintln!("to log to the console only.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(error) => write!(f, "Failed to initialize logging: {}", error),
            CliError::Batch(error) => write!(f, "Batch run failed: {}", error),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(error) => Some(error),
            CliError::Batch(error) => Some(error),
        }
    }
}
