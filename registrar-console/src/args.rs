use std::path::PathBuf;

use clap::Parser;
use registrar_lib::render::Locale;

/// Registrar - administrative console for the academic records service
#[derive(Parser, Debug)]
#[command(name = "registrar")]
#[command(version)]
#[command(about = "Browse and edit users, students, groups and subjects", long_about = None)]
pub struct Cli {
    /// Server URL (e.g., http://localhost:8000)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Bearer token issued by the server
    #[arg(long = "token", env = "REGISTRAR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Sign in with this login; the password is read from stdin
    #[arg(short = 'l', long = "login", conflicts_with = "token")]
    pub login: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Rows per page: 5, 10, 15 or 20
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Yes/No labels: ru or en
    #[arg(long = "locale")]
    pub locale: Option<Locale>,

    /// Request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Debug-level logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
