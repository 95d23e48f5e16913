use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ConverterError, Result};

/// Name of the entry holding the Scratch project description.
pub const MANIFEST_ENTRY: &str = "project.json";

/// Subdirectory of the output directory that receives every other entry.
pub const ASSETS_DIR: &str = "assets";

/// Result of unpacking a project archive.
#[derive(Debug)]
pub struct Materialized {
    /// Decoded text of the manifest entry.
    pub manifest: String,
    /// Paths of the extracted files, relative to the assets directory.
    pub assets: Vec<PathBuf>,
}

/// Opens `archive_path`, returns the manifest text, and extracts every other
/// entry under `<destination>/assets`, overwriting files that already exist.
///
/// The manifest is read before anything touches disk, so an archive without
/// a usable manifest leaves the destination alone. Failures halfway through
/// extraction leave the already written assets in place.
pub fn materialize(archive_path: &Path, destination: &Path) -> Result<Materialized> {
    if !archive_path.exists() {
        return Err(ConverterError::InputNotFound(archive_path.to_path_buf()));
    }

    let file = fs::File::open(archive_path)
        .map_err(|e| ConverterError::InvalidArchive(format!("{}: {e}", archive_path.display())))?;
    let mut archive = zip::ZipArchive::new(file)?;

    let manifest = read_manifest(&mut archive)?;

    let assets_dir = destination.join(ASSETS_DIR);
    fs::create_dir_all(&assets_dir).map_err(|e| ConverterError::write(&assets_dir, e))?;

    let mut assets = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.name() == MANIFEST_ENTRY {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping entry outside the assets directory");
            continue;
        };
        let out_path = assets_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| ConverterError::write(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConverterError::write(parent, e))?;
        }
        let mut out_file =
            fs::File::create(&out_path).map_err(|e| ConverterError::write(&out_path, e))?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| ConverterError::write(&out_path, e))?;

        tracing::debug!(path = %out_path.display(), "extracted asset");
        assets.push(relative.to_path_buf());
    }

    tracing::info!(
        archive = %archive_path.display(),
        assets = assets.len(),
        "materialized project archive"
    );
    Ok(Materialized { manifest, assets })
}

fn read_manifest<R>(archive: &mut zip::ZipArchive<R>) -> Result<String>
where
    R: std::io::Read + std::io::Seek,
{
    let mut entry = archive.by_name(MANIFEST_ENTRY).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            ConverterError::InvalidArchive(format!("archive has no {MANIFEST_ENTRY}"))
        }
        other => other.into(),
    })?;

    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ConverterError::InvalidArchive(format!("cannot read {MANIFEST_ENTRY}: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|e| ConverterError::InvalidArchive(format!("{MANIFEST_ENTRY} is not UTF-8: {e}")))
}
