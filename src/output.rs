use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConverterError, Result};

/// File the generated program is written to inside the output directory.
pub const OUTPUT_FILE: &str = "main.py";

/// Writes `content` verbatim to `<destination>/<filename>`, replacing any existing file.
/// The content is not checked in any way.
pub fn write_output(destination: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let path = destination.join(filename);
    fs::write(&path, content).map_err(|e| ConverterError::write(&path, e))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote generated program");
    Ok(path)
}
