//! Tilde (`~`) expansion for configured paths.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory; other paths are returned as-is.
pub fn expand_tilde_path(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            let rest = path.strip_prefix("~").unwrap_or(Path::new(""));
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
