use thiserror::Error;

use crate::profiles::Profile;

/// Errors raised by the firmware core
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chord '{0}': {1}")]
    InvalidChord(String, &'static str),

    #[error("unknown key label '{0}'")]
    UnknownKey(String),

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("profile {0:?} cannot carry mapping overrides")]
    OverrideNotAllowed(Profile),

    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("bad bench command '{0}': {1}")]
    BenchCommand(String, &'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
