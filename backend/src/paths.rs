//! Cross-platform data path resolution.
//!
//! Determines where the JSON todo store lives based on platform conventions
//! and Docker detection.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the JSON todo store inside the data directory.
pub const TODOS_FILE: &str = "todos.json";

/// Represents the resolved paths for application data storage.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Directory holding application data
    pub data_dir: PathBuf,
    /// Path to the JSON todo store
    pub todos_path: PathBuf,
}

/// Configuration for path resolution.
#[derive(Debug, Default)]
pub struct PathConfig {
    /// Explicit data directory (todos.json will be inside)
    pub data_dir: Option<PathBuf>,
    /// Explicit path to the todos file
    pub todos_path: Option<PathBuf>,
}

impl DataPaths {
    /// Resolve data paths based on configuration.
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit todos_path if provided
    /// 2. Explicit data_dir if provided
    /// 3. Default directory (platform-specific or Docker-detected)
    pub fn resolve(config: PathConfig) -> anyhow::Result<Self> {
        let data_dir = match config.data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir(),
        };

        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
            info!("Created data directory: {}", data_dir.display());
        }

        let todos_path = match config.todos_path {
            Some(path) => {
                if path != data_dir.join(TODOS_FILE) {
                    info!(
                        "Using custom todos path: {} (overriding default in {})",
                        path.display(),
                        data_dir.display()
                    );
                }
                path
            }
            None => data_dir.join(TODOS_FILE),
        };

        info!("Todos file: {}", todos_path.display());

        Ok(Self {
            data_dir,
            todos_path,
        })
    }

    /// Determine the default data directory based on platform and environment.
    fn default_data_dir() -> PathBuf {
        if Self::is_docker() {
            info!("Docker environment detected, using ./data/ for storage");
            return PathBuf::from("./data");
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", "minimart") {
            let data_dir = proj_dirs.data_dir().to_path_buf();
            info!(
                "Using platform-specific data directory: {}",
                data_dir.display()
            );
            data_dir
        } else {
            warn!("Could not determine user data directory, falling back to ./data/");
            PathBuf::from("./data")
        }
    }

    /// Detect if running inside a Docker container.
    fn is_docker() -> bool {
        if Path::new("/.dockerenv").exists() {
            return true;
        }

        if let Ok(cgroup) = std::fs::read_to_string("/proc/self/cgroup") {
            if cgroup.contains("docker") || cgroup.contains("containerd") {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir() {
        let data_dir = DataPaths::default_data_dir();
        assert!(!data_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_resolve_with_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(PathConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            todos_path: None,
        })
        .unwrap();
        assert_eq!(paths.todos_path, temp_dir.path().join(TODOS_FILE));
    }

    #[test]
    fn test_todos_path_overrides_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(PathConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            todos_path: Some(PathBuf::from("/override/todos.json")),
        })
        .unwrap();
        assert_eq!(paths.todos_path, PathBuf::from("/override/todos.json"));
        assert_eq!(paths.data_dir, temp_dir.path());
    }

    #[test]
    fn test_missing_data_dir_is_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        DataPaths::resolve(PathConfig {
            data_dir: Some(nested.clone()),
            todos_path: None,
        })
        .unwrap();
        assert!(nested.is_dir());
    }
}
