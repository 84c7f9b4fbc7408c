use std::io;
use std::path::PathBuf;

use registrar_lib::error::AuthError;
use registrar_lib::error::Error as LibError;
use registrar_lib::error::FieldError;
use registrar_lib::error::SyncError;

/// Errors surfaced by the console.
///
/// Command-level failures are printed and the console keeps running; only
/// startup failures end the process.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Lib(#[from] LibError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad command line inside the console.
    #[error("{0}")]
    Usage(String),
}

impl ConsoleError {
    pub fn usage(message: impl Into<String>) -> Self {
        ConsoleError::Usage(message.into())
    }

    /// Whether the console should ask the user to sign in again.
    pub fn is_auth(&self) -> bool {
        match self {
            ConsoleError::Sync(e) => e.is_auth(),
            ConsoleError::Auth(_) => true,
            ConsoleError::Lib(e) => e.is_auth(),
            _ => false,
        }
    }
}
