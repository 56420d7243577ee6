use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a submission
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A template references a name found in neither the general settings nor the configuration
    #[error("key '{0}' unknown")]
    MissingVariable(String),

    #[error("unknown queue '{0}', expected one of ultrashort, short, medium, long")]
    UnknownQueue(String),

    #[error("unknown method '{name}'. Available: {available}")]
    UnknownVariant { name: String, available: String },

    #[error("{}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' failed: {reason}")]
    ExternalCommand { command: String, reason: String },

    #[error(transparent)]
    Template(#[from] tinytemplate::error::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A multiple folder method produced nothing that could be written
    #[error("method '{0}' did not write any job folder")]
    NoFolders(String),
}

impl SubmitError {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SubmitError::FileSystem { path: path.into(), source }
    }
}
