//! Load errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::materialize::MaterializeError;

/// The stage of a load an error was raised in.
///
/// Reading the environment cannot fail, so it has no phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Construct,
    Files,
    Flags,
    Materialize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Construct => "construct",
            Phase::Files => "files",
            Phase::Flags => "flags",
            Phase::Materialize => "materialize",
        };
        f.write_str(name)
    }
}

/// Error returned by [`MergeEngine`](crate::MergeEngine) construction and loading.
///
/// Every error is terminal for the load that raised it; the target object
/// must be discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("invalid delimiter {0:?}: delimiter must contain exactly 1 character")]
    InvalidDelimiter(String),

    #[error("option `{name}` must be a string list, found {found}")]
    OptionType { name: String, found: &'static str },

    #[error("failed reading config file {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed decoding {format} config file {}", path.display())]
    FileDecode {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed reading flag `{name}`: {message}")]
    FlagRead { name: String, message: String },

    #[error("invalid value {value:?} for `{key}`: expected {expected}")]
    TypeConversion { key: String, value: String, expected: &'static str },

    #[error("failed materializing configuration")]
    Unmarshal {
        #[source]
        source: MaterializeError,
    },
}

impl LoadError {
    /// Which load phase produced this error.
    pub fn phase(&self) -> Phase {
        match self {
            LoadError::InvalidDelimiter(_) => Phase::Construct,
            LoadError::OptionType { .. } | LoadError::FileRead { .. } | LoadError::FileDecode { .. } => {
                Phase::Files
            }
            LoadError::FlagRead { .. } => Phase::Flags,
            LoadError::TypeConversion { .. } | LoadError::Unmarshal { .. } => Phase::Materialize,
        }
    }
}

impl From<MaterializeError> for LoadError {
    fn from(err: MaterializeError) -> Self {
        match err {
            MaterializeError::Conversion { key, value, expected } => {
                LoadError::TypeConversion { key, value, expected }
            }
            other => LoadError::Unmarshal { source: other },
        }
    }
}
