use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Stores references to all the paths relevant to cyanbar, and abstracts access to these files and directories
#[derive(Debug, Clone)]
pub struct CyanbarPaths {
    pub pid_file: PathBuf,
    pub lock_file: PathBuf,
    pub control_file: PathBuf,
    pub log_file: PathBuf,
    pub log_dir: PathBuf,
    pub config_file: PathBuf,
}

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME").map(PathBuf::from).context("$HOME is not set")
}

impl CyanbarPaths {
    /// Keep the pid, lock and control files in `state_dir` instead of the home directory.
    pub fn from_state_dir<P: AsRef<Path>>(state_dir: P, config_file: Option<PathBuf>) -> Result<Self> {
        let state_dir = state_dir.as_ref();
        if !state_dir.exists() {
            std::fs::create_dir_all(state_dir).with_context(|| format!("Failed to create {}", state_dir.display()))?;
        }
        Self::with_file_names(state_dir, ".cyanbar", config_file)
    }

    pub fn default(config_file: Option<PathBuf>) -> Result<Self> {
        Self::with_file_names(&home_dir()?, ".cyanbar", config_file)
    }

    fn with_file_names(dir: &Path, prefix: &str, config_file: Option<PathBuf>) -> Result<Self> {
        let log_dir = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|_| home_dir().map(|home| home.join(".cache")))?
            .join("cyanbar");

        let config_file = match config_file {
            Some(config_file) => config_file,
            None => std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| home_dir().map(|home| home.join(".config")))?
                .join("cyanbar")
                .join("cyanbar.json"),
        };

        Ok(CyanbarPaths {
            pid_file: dir.join(format!("{}.pid", prefix)),
            lock_file: dir.join(format!("{}.lock", prefix)),
            control_file: dir.join(format!("{}_pipeinst", prefix)),
            log_file: log_dir.join("cyanbar.log"),
            log_dir,
            config_file,
        })
    }

    pub fn get_pid_file(&self) -> &Path {
        self.pid_file.as_path()
    }

    pub fn get_lock_file(&self) -> &Path {
        self.lock_file.as_path()
    }

    pub fn get_control_file(&self) -> &Path {
        self.control_file.as_path()
    }

    pub fn get_log_file(&self) -> &Path {
        self.log_file.as_path()
    }

    pub fn get_log_dir(&self) -> &Path {
        self.log_dir.as_path()
    }

    pub fn get_config_file(&self) -> &Path {
        self.config_file.as_path()
    }
}

impl std::fmt::Display for CyanbarPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lock-file: {}, control-file: {}, config-file: {}, log-file: {}",
            self.lock_file.display(),
            self.control_file.display(),
            self.config_file.display(),
            self.log_file.display()
        )
    }
}
