//! Error types for configuration loading and per-item execution.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Whole-run errors. Nothing is executed when one of these is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: no backup items are configured")]
    Empty,

    #[error("Failed to read config file '{path}': {cause}")]
    Read { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    Parse {
        path: PathBuf,
        cause: toml::de::Error,
    },

    #[error("No configured item is named '{0}'")]
    UnknownItem(String),
}

/// Errors that abandon a single item. The run carries on with the next one.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("item '{item}' is missing a required field: {field}")]
    Resolution { item: String, field: &'static str },

    #[error("item name '{0}' cannot be used as a folder name")]
    InvalidName(String),

    #[error("could not create directory '{path}': {cause}")]
    DirectoryCreation { path: PathBuf, cause: io::Error },

    #[error("archiver exited with status {status} while writing '{output}'")]
    ArchiveExit { output: PathBuf, status: i32 },

    #[error("archiver did not complete while writing '{output}'")]
    ArchiveIncomplete { output: PathBuf },

    #[error("archiver could not be launched for '{output}': {cause}")]
    ArchiveLaunch { output: PathBuf, cause: LaunchError },

    #[error("copy to '{dest}' failed: {cause}")]
    Copy { dest: PathBuf, cause: io::Error },
}

impl ItemError {
    /// Raw exit status reported by the archiver, if there was one.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            ItemError::ArchiveExit { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The archiver capability could not be started at all.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to spawn '{program}': {cause}")]
    Spawn { program: String, cause: io::Error },

    #[error("failed to wait for '{program}': {cause}")]
    Wait { program: String, cause: io::Error },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_only_for_archive_exit() {
        let err = ItemError::ArchiveExit {
            output: PathBuf::from("/b/x.zip"),
            status: 2,
        };
        assert_eq!(err.exit_status(), Some(2));
        assert!(err.to_string().contains("status 2"));
        assert!(err.to_string().contains("/b/x.zip"));

        let err = ItemError::ArchiveIncomplete {
            output: PathBuf::from("/b/x.zip"),
        };
        assert_eq!(err.exit_status(), None);
    }

    #[test]
    fn test_empty_config_message() {
        assert!(
            ConfigError::Empty
                .to_string()
                .contains("Invalid configuration file")
        );
    }
}
