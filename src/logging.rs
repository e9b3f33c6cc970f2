// src/logging.rs
//! Logger setup for the binary.
//!
//! `RUST_LOG` hands control to `env_logger`; otherwise a `fern` dispatch writes timestamped
//! lines to stderr and, when configured, to a log file.

use log::LevelFilter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    LogFile(#[from] std::io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), LoggingError> {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::try_init()?;
        return Ok(());
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
