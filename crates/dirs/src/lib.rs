use std::env;
use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirError {
    #[error("Directory not found: {0}")]
    DirNotFound(String),
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type DirResult<T> = Result<T, DirError>;

/// Application name used to namespace directories.
pub static APP_NAME: &str = "qcluster";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirType {
    Data,
    Config,
    Cache,
}

impl Display for DirType {
    /// Pretty-print the default directory path hint for this dir type.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "~/{}/{}", self.rel_path(), APP_NAME)
    }
}

impl DirType {
    /// XDG environment variable key for this directory type.
    fn xdg_key(&self) -> &'static str {
        match self {
            DirType::Data => "XDG_DATA_HOME",
            DirType::Config => "XDG_CONFIG_HOME",
            DirType::Cache => "XDG_CACHE_HOME",
        }
    }

    /// Relative default path under HOME when XDG is not set.
    fn rel_path(&self) -> &'static str {
        match self {
            DirType::Data => ".local/share",
            DirType::Config => ".config",
            DirType::Cache => ".cache",
        }
    }

    /// Pick the directory from an explicit XDG value or a home directory.
    fn resolve(&self, xdg: Option<OsString>, home: Option<PathBuf>) -> DirResult<PathBuf> {
        match (xdg.filter(|v| !v.is_empty()), home) {
            (Some(dir), _) => Ok(PathBuf::from(dir).join(APP_NAME)),
            (None, Some(home)) => Ok(home.join(self.rel_path()).join(APP_NAME)),
            (None, None) => Err(DirError::DirNotFound(self.to_string())),
        }
    }

    /// Resolve the directory path from XDG or fallback environment hints.
    pub fn get_dir(&self) -> DirResult<PathBuf> {
        #[allow(deprecated)]
        let home = env::home_dir()
            .or_else(|| env::var_os("HOME").map(PathBuf::from))
            .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from));
        self.resolve(env::var_os(self.xdg_key()), home)
    }

    /// Ensure the directory exists, creating it asynchronously if needed.
    pub async fn ensure_dir_async(&self) -> DirResult<PathBuf> {
        let dir = self.get_dir()?;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Ensure the directory exists, creating it if needed.
    pub fn ensure_dir(&self) -> DirResult<PathBuf> {
        let dir = self.get_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Ensure a nested directory below this one exists.
    pub fn ensure_subdir<P: AsRef<Path>>(&self, rel: P) -> DirResult<PathBuf> {
        let dir = self.get_dir()?.join(rel);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
