//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "registrar";
const APPLICATION: &str = "registrar";

const LATEST_LOG: &str = "latest.log";
const CONFIG_FILE: &str = "config.toml";

/// Maximum number of archived log files to keep.
const MAX_OLD_LOGS: usize = 25;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Cache directory; logs live here.
///
/// - Linux: `$XDG_CACHE_HOME/registrar` or `~/.cache/registrar`
/// - macOS: `~/Library/Caches/dev.registrar.registrar`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Config directory.
///
/// - Linux: `$XDG_CONFIG_HOME/registrar` or `~/.config/registrar`
/// - macOS: `~/Library/Application Support/dev.registrar.registrar`
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default location of `config.toml`.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Path of the current session's log.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(LATEST_LOG))
}

/// Archives the previous `latest.log` under a timestamp and prunes old logs.
///
/// Call at startup, before the logger opens the new file.
pub fn rotate_logs() -> io::Result<()> {
    match cache_dir() {
        Some(cache) => rotate_logs_in(&cache),
        None => Ok(()),
    }
}

fn rotate_logs_in(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let latest = dir.join(LATEST_LOG);
    if latest.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        fs::rename(&latest, dir.join(format!("{}.log", timestamp)))?;
    }

    prune_logs(dir, MAX_OLD_LOGS)
}

/// Deletes the oldest archived logs so at most `keep` remain.
fn prune_logs(dir: &Path, keep: usize) -> io::Result<()> {
    let mut archived: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != LATEST_LOG
        })
        .collect();

    if archived.len() <= keep {
        return Ok(());
    }

    archived.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());
    let excess = archived.len() - keep;
    for entry in archived.into_iter().take(excess) {
        if let Err(e) = fs::remove_file(entry.path()) {
            log::debug!("Could not remove old log {}: {}", entry.path().display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("registrar-paths-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_rotate_archives_latest() {
        let dir = scratch_dir("rotate");
        fs::write(dir.join(LATEST_LOG), "previous run").unwrap();

        rotate_logs_in(&dir).unwrap();

        assert!(!dir.join(LATEST_LOG).exists());
        let archived: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(archived.len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = scratch_dir("prune");
        for i in 0..5 {
            fs::write(dir.join(format!("2026010{}_000000.log", i)), "x").unwrap();
        }
        fs::write(dir.join("notes.txt"), "not a log").unwrap();

        prune_logs(&dir, 2).unwrap();

        let logs = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".log"))
            .count();
        assert_eq!(logs, 2);
        assert!(dir.join("notes.txt").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
