use std::path::{Path, PathBuf};

/// Expands a leading `~` in a command-line path to the user's home directory.
/// Paths without a leading `~`, or when no home directory is known, pass through.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
