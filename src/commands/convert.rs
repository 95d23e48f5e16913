use std::path::{Path, PathBuf};

use crate::archive;
use crate::completion::CompletionService;
use crate::error::{ConverterError, Result};
use crate::output::{self, OUTPUT_FILE};
use crate::templates;

/// Where a finished conversion put its files.
#[derive(Debug)]
pub struct Conversion {
    pub output_dir: PathBuf,
    pub program: PathBuf,
    pub assets: Vec<PathBuf>,
}

/// Converts a `.sb3` archive into a Pygame project under `output_dir`.
///
/// Extracts the archive, sends its `project.json` to `completion` with the
/// conversion instruction, and saves the reply as `main.py`. The reply is
/// written unchecked; nothing verifies that it is valid Python.
pub async fn convert(
    archive_path: &Path,
    output_dir: &Path,
    completion: &dyn CompletionService,
) -> Result<Conversion> {
    // Zip extraction is blocking I/O.
    let (src, dst) = (archive_path.to_path_buf(), output_dir.to_path_buf());
    let materialized =
        join_blocking(tokio::task::spawn_blocking(move || archive::materialize(&src, &dst))).await?;

    tracing::info!(bytes = materialized.manifest.len(), "sending project.json for conversion");
    let program = completion
        .complete(templates::conversion_prompt(), &materialized.manifest)
        .await?;

    let program = output::write_output(output_dir, OUTPUT_FILE, &program)?;

    Ok(Conversion {
        output_dir: output_dir.to_path_buf(),
        program,
        assets: materialized.assets,
    })
}

/// Awaits a blocking task, reporting a panicked or cancelled task as an internal failure.
async fn join_blocking<T>(handle: tokio::task::JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|e| ConverterError::Internal(format!("extraction task failed: {e}")))?
}
