use std::io;

use thiserror::Error;

/// Errors surfaced at startup or by the terminal front end.
///
/// Maze generation itself has no error states: it asserts on its preconditions.
#[derive(Error, Debug)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid grid dimensions {rows}x{cols}: rows and columns must be at least 1")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("invalid value '{value}' for {key}")]
    InvalidSetting { key: &'static str, value: String },

    #[error("could not initialise logging: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, Error>;
