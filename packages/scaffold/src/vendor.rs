// ABOUTME: Access to the vendored webapp skeleton and template engine libraries
// ABOUTME: Safe tar.gz extraction with leading-component stripping, and jar copies

use anyhow::Context;
use flate2::read::GzDecoder;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::debug;

use crate::error::{ScaffoldError, ScaffoldResult};

/// Webapp skeleton: WEB-INF with web.xml, filters and their jars.
pub const SKELETON_ARCHIVE: &str = "marmot.tar.gz";
/// Velocity and velocity-tools jars, wrapped in one top-level directory.
pub const VELOCITY_ARCHIVE: &str = "velocity.tar.gz";
pub const FREEMARKER_JAR: &str = "freemarker-2.3.23.jar";

/// Path of a vendored file, failing when the installation does not have it.
pub fn vendored(vendor_dir: &Path, file_name: &str) -> ScaffoldResult<PathBuf> {
    let path = vendor_dir.join(file_name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ScaffoldError::VendorMissing { path })
    }
}

/// Entry path relative to the destination, with `strip` leading components
/// removed. `None` for entries that are consumed entirely by the strip.
fn relative_entry_path(entry: &Path, strip: usize, destination: &Path) -> ScaffoldResult<Option<PathBuf>> {
    let mut relative = PathBuf::new();
    let mut skipped = 0;

    for component in entry.components() {
        match component {
            Component::Normal(part) => {
                if skipped < strip {
                    skipped += 1;
                } else {
                    relative.push(part);
                }
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ScaffoldError::UnsafeArchiveEntry {
                    entry: entry.display().to_string(),
                    destination: destination.to_path_buf(),
                });
            }
        }
    }

    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Extract a `.tar.gz` into `destination`, dropping `strip` leading path
/// components from every entry. Returns the number of entries written.
pub fn extract_tar_gz(archive: &Path, destination: &Path, strip: usize) -> ScaffoldResult<usize> {
    let file = fs::File::open(archive).map_err(|e| ScaffoldError::io(archive, e))?;
    let mut archive_reader = Archive::new(GzDecoder::new(file));
    fs::create_dir_all(destination).map_err(|e| ScaffoldError::io(destination, e))?;

    let entries = archive_reader
        .entries()
        .with_context(|| format!("Failed to read archive {}", archive.display()))?;

    let mut written = 0;
    for entry in entries {
        let mut entry =
            entry.with_context(|| format!("Corrupt entry in {}", archive.display()))?;
        let entry_path = entry
            .path()
            .with_context(|| format!("Invalid entry path in {}", archive.display()))?
            .into_owned();

        let Some(relative) = relative_entry_path(&entry_path, strip, destination)? else {
            continue;
        };
        let target = destination.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
        }
        entry
            .unpack(&target)
            .with_context(|| format!("Failed to extract {}", target.display()))?;
        written += 1;
    }

    debug!(
        "Extracted {} entries from {:?} into {:?}",
        written, archive, destination
    );
    Ok(written)
}

/// Copy `source` into `directory`, keeping its file name.
pub fn copy_into(source: &Path, directory: &Path) -> ScaffoldResult<PathBuf> {
    let file_name = source
        .file_name()
        .with_context(|| format!("{} has no file name", source.display()))?;
    fs::create_dir_all(directory).map_err(|e| ScaffoldError::io(directory, e))?;
    let target = directory.join(file_name);
    fs::copy(source, &target).map_err(|e| ScaffoldError::io(&target, e))?;
    Ok(target)
}
