//! Configured backup items and the global defaults they fall back to.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Compression level used when an item does not set one.
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 5;

/// A password string that never prints its value.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret. Only archivers should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Run-wide fallbacks, created once from the configuration root and only read afterwards.
#[derive(Debug, Clone)]
pub struct GlobalDefaults {
    pub default_backup_path: PathBuf,
    pub default_password: Password,
}

/// One configured backup unit, exactly as the loader produced it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BackupItemConfig {
    /// Logical name, used as the prefix of every run name.
    pub name: String,
    /// File or directory to back up.
    pub source_path: PathBuf,
    /// Destination directory, ignored when `use_default_path` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_path: Option<PathBuf>,
    #[serde(default, deserialize_with = "flag")]
    pub use_default_path: bool,
    /// Archive to zip when set, plain recursive copy otherwise.
    #[serde(default, deserialize_with = "flag")]
    pub should_zip: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_password_protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Password>,
    #[serde(default, deserialize_with = "flag")]
    pub use_default_password: bool,
    /// Passed to the archiver untouched.
    #[serde(default = "default_level")]
    pub compression_level: i64,
}

impl BackupItemConfig {
    /// A plain copy item writing to `dest_path`, with every other option off.
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            dest_path: None,
            use_default_path: false,
            should_zip: false,
            is_password_protected: false,
            password: None,
            use_default_password: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

fn default_level() -> i64 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Accepts native booleans as well as the `"true"` / `"false"` strings older
/// configuration files used.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(de::Error::invalid_value(
                Unexpected::Str(&s),
                &"true or false",
            )),
        },
    }
}
