#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs::File,
    io::Cursor,
    path::{Path, PathBuf},
};

use zip::ZipArchive;

/// Why a submission's archive could not be turned into a source directory.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The archive could not be read or is not a recognized package format.
    #[error("unreadable or unrecognized archive: {0}")]
    Unreadable(String),
    /// The archive or directory holds no files at all.
    #[error("submission is empty")]
    Empty,
    /// The archive inflates past the configured ceiling.
    #[error("archive exceeds {limit} bytes uncompressed")]
    TooLarge {
        /// The configured uncompressed-size ceiling.
        limit: u64,
    },
    /// An entry tries to escape the extraction directory.
    #[error("unsafe path in archive: {0}")]
    UnsafePath(String),
    /// Filesystem trouble in the scratch directory.
    #[error("scratch I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns one submission — a `.zip` archive or an already-extracted directory
/// — into a directory of source files under `scratch`.
///
/// Every submission gets its own scratch directory, so concurrent pipelines
/// never share a write location. Directories are copied rather than used in
/// place; the student's original files are never touched.
pub fn extract_submission(
    source: &Path,
    scratch: &Path,
    max_uncompressed: u64,
) -> Result<PathBuf, ExtractError> {
    let dest = scratch.join("src");
    std::fs::create_dir_all(&dest)?;

    if source.is_dir() {
        let copied = copy_tree(source, &dest)?;
        if copied == 0 {
            return Err(ExtractError::Empty);
        }
        return Ok(dest);
    }

    let bytes = std::fs::read(source)?;
    extract_zip(&bytes, &dest, max_uncompressed)?;
    Ok(dest)
}

/// Returns true when an archive entry name could escape the extraction
/// directory. Checked per path component, so names like `notes..txt` stay
/// legal while `..` as a component, absolute paths, and backslash-separated
/// names (zip entries always use `/`) are rejected.
fn is_unsafe_entry_name(raw_name: &str) -> bool {
    use std::path::Component;

    if raw_name.contains('\\') {
        return true;
    }

    let path = Path::new(raw_name);
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
}

/// Extracts a zip archive into `dest`, guarding against zip-slip paths and a
/// runaway uncompressed size.
fn extract_zip(zip_bytes: &[u8], dest: &Path, max_uncompressed: u64) -> Result<(), ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    if archive.is_empty() {
        return Err(ExtractError::Empty);
    }

    let mut total_uncompressed = 0u64;
    let mut extracted_any = false;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

        total_uncompressed += entry.size();
        if total_uncompressed > max_uncompressed {
            return Err(ExtractError::TooLarge {
                limit: max_uncompressed,
            });
        }

        let raw_name = entry.name().to_string();
        if is_unsafe_entry_name(&raw_name) {
            return Err(ExtractError::UnsafePath(raw_name));
        }

        let outpath = dest.join(&raw_name);
        if raw_name.ends_with('/') {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
            extracted_any = true;
        }
    }

    if !extracted_any {
        return Err(ExtractError::Empty);
    }

    Ok(())
}

/// Recursively copies `from` into `to`, returning how many files landed.
fn copy_tree(from: &Path, to: &Path) -> Result<usize, ExtractError> {
    let mut copied = 0;

    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let path = entry.path();
        let target = to.join(entry.file_name());

        if path.is_dir() {
            std::fs::create_dir_all(&target)?;
            copied += copy_tree(&path, &target)?;
        } else {
            std::fs::copy(&path, &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}
