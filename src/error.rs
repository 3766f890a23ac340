use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// An enum for describing and handling various errors encountered while
/// reading history, loading configuration, or writing changelogs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse config file {0}: {1}")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error("unrecognized link-style: {0}")]
    LinkStyle(String),

    #[error("`git {cmd}` failed: {stderr}")]
    Git { cmd: String, stderr: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to compile commit pattern")]
    Regex(#[from] regex::Error),

    #[error("failed to convert date/time to string format")]
    TimeFormat(#[from] time::error::Format),
}
