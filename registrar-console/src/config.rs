//! Configuration file management
//!
//! # Configuration Format
//!
//! ```toml
//! [server]
//! url = "http://localhost:8000"  # Records service URL
//! timeout_secs = 30              # Per-request timeout
//!
//! [ui]
//! page_size = 5                  # 5, 10, 15 or 20
//! locale = "ru"                  # ru or en
//! ```

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use registrar_lib::render::Locale;
use registrar_lib::table::PageSize;
use serde::Deserialize;
use serde::Serialize;

use crate::args::Cli;
use crate::error::ConsoleError;

/// Console configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: ServerConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Service URL (e.g., http://localhost:8000)
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Rows per page
    #[serde(default)]
    pub page_size: PageSize,

    /// Language of Yes/No labels
    #[serde(default)]
    pub locale: Locale,
}

fn default_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConsoleConfig {
    /// Loads the config file, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConsoleError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConsoleError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `--config`, else the platform default location.
    pub fn resolve(cli: &Cli) -> Result<Self, ConsoleError> {
        let path: Option<PathBuf> = cli.config.clone().or_else(crate::paths::config_file);
        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_cli(cli)?;
        Ok(config)
    }

    /// Command-line flags win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConsoleError> {
        if let Some(url) = &cli.url {
            self.server.url = url.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.server.timeout_secs = timeout;
        }
        if let Some(size) = cli.page_size {
            self.ui.page_size = PageSize::try_from(size)?;
        }
        if let Some(locale) = cli.locale {
            self.ui.locale = locale;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}
