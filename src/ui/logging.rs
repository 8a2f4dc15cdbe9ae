//! Logging utilities
//!
//! This module provides functionality to initialize logging for the
//! application. The terminal belongs to the UI, so logs go to a rotating
//! file in the user cache directory.

use anyhow::{Context, Result};
use directories::BaseDirs;
use env_logger::{Builder, Target, fmt::TimestampPrecision};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use log::LevelFilter;
use std::fs::{self, remove_file};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Name of the active log file.
const LOG_FILE_NAME: &str = "mock_chat.log";

/// Size at which the log file is rotated.
const LOG_FILE_LIMIT: usize = 1024 * 1024;

/// Rotated log files kept next to the active one.
const LOG_FILES_KEPT: usize = 3;

/// Path of the active log file.
///
/// # Errors
///
/// Returns an error if the user cache directory cannot be determined.
pub fn log_file_path() -> Result<PathBuf>
{
    let dirs = BaseDirs::new().context("Failed to determine the cache directory")?;
    Ok(dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Initializes the logging system for the application.
///
/// Sets up the log file, log level, and log format.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a logger is
/// already installed.
pub fn init_logging() -> Result<()>
{
    let log_path = log_file_path()?;

    if let Some(parent) = log_path.parent()
    {
        fs::create_dir_all(parent).context("Failed to create the log directory")?;
    }

    let log_file = FileRotate::new(
        &log_path,
        AppendCount::new(LOG_FILES_KEPT),
        ContentLimit::Bytes(LOG_FILE_LIMIT),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("mock_chat", LevelFilter::Debug)
        .format_timestamp(Some(TimestampPrecision::Millis))
        .target(Target::Pipe(Box::new(log_file)))
        .try_init()
        .context("Failed to install the logger")
}

/// Removes the log file.
///
/// A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_log_file() -> Result<()>
{
    let log_path = log_file_path()?;

    match remove_file(&log_path)
    {
        Err(err) if err.kind() != ErrorKind::NotFound =>
        {
            Err(err).context(format!("Failed to remove {}", log_path.display()))
        }
        _ => Ok(()),
    }
}
