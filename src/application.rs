//! Configuration file for this application.
//!
//! The configuration is a TOML document holding the global defaults, the
//! archiver and naming settings, and the ordered list of backup items. This
//! module turns it into the typed values the orchestrator consumes.

use crate::capability::{Archiver, BuiltinZip, SevenZip};
use crate::constants::{CONFIG_NAME, DEFAULT_ARCHIVER_TIMEOUT_SECS, PKG_NAME, SEVEN_ZIP_PROGRAM};
use crate::error::{ConfigError, Result};
use crate::item::{BackupItemConfig, GlobalDefaults, Password};
use crate::naming::NameClock;
use crate::orchestrator::Orchestrator;
use crate::path_util::expand_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// The whole configuration document.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Application {
    /// Destination for items with `use_default_path`.
    #[serde(default)]
    pub default_backup_path: PathBuf,
    /// Password for items with `use_default_password`.
    #[serde(default)]
    pub default_password: Password,
    #[serde(default)]
    pub archiver: ArchiverSettings,
    #[serde(default)]
    pub naming: NamingSettings,
    /// Backup items, in the order they run.
    #[serde(default)]
    pub items: Vec<BackupItemConfig>,
}

/// Which archiver writes the zip files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiverKind {
    #[default]
    Builtin,
    SevenZip,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArchiverSettings {
    #[serde(default)]
    pub kind: ArchiverKind,
    /// Executable used when `kind = "seven-zip"`.
    #[serde(default = "default_program")]
    pub program: String,
    /// Upper bound for one external archiver call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ArchiverSettings {
    fn default() -> Self {
        Self {
            kind: ArchiverKind::default(),
            program: default_program(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NamingSettings {
    #[serde(default)]
    pub clock: NameClock,
}

fn default_program() -> String {
    SEVEN_ZIP_PROGRAM.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_ARCHIVER_TIMEOUT_SECS
}

impl Application {
    /// Reads and parses the configuration file at `path`.
    ///
    /// `~` and `$HOME` prefixes in every configured path are expanded.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from: {}", path.display());
        let toml_str = fs::read_to_string(path).map_err(|cause| ConfigError::Read {
            path: path.to_path_buf(),
            cause,
        })?;
        Self::parse(&toml_str, path)
    }

    fn parse(toml_str: &str, path: &Path) -> Result<Self> {
        let mut app: Application = toml::from_str(toml_str).map_err(|cause| ConfigError::Parse {
            path: path.to_path_buf(),
            cause,
        })?;
        app.expand_paths();
        Ok(app)
    }

    fn expand_paths(&mut self) {
        if !self.default_backup_path.as_os_str().is_empty() {
            self.default_backup_path = expand_path(&self.default_backup_path);
        }
        for item in &mut self.items {
            if !item.source_path.as_os_str().is_empty() {
                item.source_path = expand_path(&item.source_path);
            }
            if let Some(dest) = item.dest_path.as_mut() {
                *dest = expand_path(dest);
            }
        }
    }

    /// Run-wide defaults, read-only for the rest of the run.
    pub fn defaults(&self) -> GlobalDefaults {
        GlobalDefaults {
            default_backup_path: self.default_backup_path.clone(),
            default_password: self.default_password.clone(),
        }
    }

    /// Fails when the document configures no items.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(())
    }

    /// Builds the archiver selected by the `[archiver]` table.
    pub fn archiver(&self) -> Box<dyn Archiver> {
        match self.archiver.kind {
            ArchiverKind::Builtin => Box::new(BuiltinZip),
            ArchiverKind::SevenZip => Box::new(SevenZip::new(
                self.archiver.program.clone(),
                Duration::from_secs(self.archiver.timeout_secs),
            )),
        }
    }

    /// An orchestrator wired to this configuration's archiver and naming.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.archiver()).with_name_clock(self.naming.clock)
    }

    /// A commented starting point for a new configuration file.
    pub fn sample() -> Self {
        let mut docs = BackupItemConfig::new("Documents", "~/Documents");
        docs.use_default_path = true;
        docs.should_zip = true;
        docs.compression_level = 9;
        Self {
            default_backup_path: PathBuf::from("~/Backups"),
            items: vec![docs],
            ..Self::default()
        }
    }
}

/// Returns the absolute path to the default configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_NAME)
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PKG_NAME)
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(PKG_NAME)
}

/// Writes `data` to `file_path` in TOML format.
///
/// Creates the parent directory if it does not exist.
pub fn write_config(data: &Application, file_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(file_path)?;
    let mut writer = io::BufWriter::new(file);
    let toml_str = toml::to_string_pretty(data)?;
    writer.write_all(toml_str.as_bytes())?;
    writer.flush()?;
    Ok(())
}
