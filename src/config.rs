//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::{Path, PathBuf};

/// Environment variable overriding the database location
pub const DATABASE_PATH_VAR: &str = "FITLOG_DATABASE_PATH";

/// Log directive applied on top of `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "fitlog=info";

/// Get the database path from environment or use `<project>/data/fitlog.db`
pub fn database_path() -> PathBuf {
    match std::env::var(DATABASE_PATH_VAR) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(&exe_dir)
        }
    }
}

/// Resolve the default database file relative to the executable's directory
pub fn default_database_path(exe_dir: &Path) -> PathBuf {
    let mut path = exe_dir.to_path_buf();

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project_root) = path.parent().and_then(|p| p.parent()) {
            path = project_root.to_path_buf();
        }
    }

    path.push("data");
    path.push("fitlog.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_from_target_dir() {
        let path = default_database_path(Path::new("/work/fitlog/target/release"));
        assert_eq!(path, PathBuf::from("/work/fitlog/data/fitlog.db"));
    }

    #[test]
    fn test_default_path_from_install_dir() {
        let path = default_database_path(Path::new("/opt/fitlog/bin"));
        assert_eq!(path, PathBuf::from("/opt/fitlog/bin/data/fitlog.db"));
    }
}
