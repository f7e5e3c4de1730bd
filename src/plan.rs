//! Merging an item with the global defaults into a self-contained plan.

use crate::error::ItemError;
use crate::item::{BackupItemConfig, GlobalDefaults, Password};
use crate::report::Action;
use std::path::PathBuf;

/// Everything one item's execution needs, with all fallbacks already applied.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    pub item_name: String,
    pub source_path: PathBuf,
    /// Directory the run folder is created in.
    pub dest_dir: PathBuf,
    /// Present iff the item is password protected.
    pub password: Option<Password>,
    pub should_zip: bool,
    pub compression_level: i64,
    pub run_name: String,
}

impl ResolvedPlan {
    pub fn is_password_protected(&self) -> bool {
        self.password.is_some()
    }

    pub fn action(&self) -> Action {
        if self.should_zip {
            Action::Archive
        } else {
            Action::Copy
        }
    }

    /// `<dest_dir>/<run_name>`
    pub fn run_dir(&self) -> PathBuf {
        self.dest_dir.join(&self.run_name)
    }

    /// `<dest_dir>/<run_name>/<run_name>.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.run_dir().join(format!("{}.zip", self.run_name))
    }
}

/// Resolves `item` against `defaults`.
///
/// `use_default_path` always wins over an explicit `dest_path`. The password is
/// only looked at when the item is password protected.
///
/// # Errors
/// Returns [`ItemError::InvalidName`] when the item name could leave the
/// destination directory, and [`ItemError::Resolution`] when the source path,
/// the destination directory or a required password ends up empty.
pub fn resolve(
    item: &BackupItemConfig,
    defaults: &GlobalDefaults,
    run_name: String,
) -> Result<ResolvedPlan, ItemError> {
    let missing = |field| ItemError::Resolution {
        item: item.name.clone(),
        field,
    };

    if !is_folder_name(&item.name) {
        return Err(ItemError::InvalidName(item.name.clone()));
    }
    if item.source_path.as_os_str().is_empty() {
        return Err(missing("source_path"));
    }

    let dest_dir = if item.use_default_path {
        defaults.default_backup_path.clone()
    } else {
        item.dest_path.clone().unwrap_or_default()
    };
    if dest_dir.as_os_str().is_empty() {
        return Err(missing(if item.use_default_path {
            "default_backup_path"
        } else {
            "dest_path"
        }));
    }

    let password = if item.is_password_protected {
        let password = if item.use_default_password {
            defaults.default_password.clone()
        } else {
            item.password.clone().unwrap_or_default()
        };
        if password.is_empty() {
            return Err(missing(if item.use_default_password {
                "default_password"
            } else {
                "password"
            }));
        }
        Some(password)
    } else {
        None
    };

    Ok(ResolvedPlan {
        item_name: item.name.clone(),
        source_path: item.source_path.clone(),
        dest_dir,
        password,
        should_zip: item.should_zip,
        compression_level: item.compression_level,
        run_name,
    })
}

/// The run folder is named after the item, so the name must stay one path component.
fn is_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
