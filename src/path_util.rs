use std::path::{Path, PathBuf};

/// Expands a leading `~` or `$HOME` to the user's home directory.
///
/// Paths without such a prefix, or when no home directory is known, are
/// returned unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let Some(input) = path.to_str() else {
        return path.to_path_buf();
    };
    let rest = if input == "~" || input == "$HOME" {
        ""
    } else if let Some(rest) = input.strip_prefix("~/") {
        rest
    } else if let Some(rest) = input.strip_prefix("$HOME/") {
        rest
    } else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
