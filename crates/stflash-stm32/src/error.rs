//! Error types for the command layer

use std::io;
use thiserror::Error;

/// Errors from parsing and running driver commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong number of arguments
    #[error("syntax error, usage: {usage}")]
    Syntax { usage: &'static str },

    /// Argument is not a number
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Bank declaration names another driver
    #[error("unknown flash driver '{0}'")]
    UnknownDriver(String),

    /// No bank with this id
    #[error("flash bank '{0}' not found")]
    NoSuchBank(String),

    /// No command with this name in the group
    #[error("unknown command '{group} {name}'")]
    UnknownCommand { group: String, name: String },

    /// Flash operation failed
    #[error(transparent)]
    Flash(#[from] stflash_core::Error),

    /// Writing command output failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
