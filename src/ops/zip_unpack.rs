//! Source archive unpacking.
//!
//! Accepts a source archive, a directory containing `MANIFEST.json`, or the
//! manifest file itself, and locates the main document and default inputs
//! it names. Archives are extracted into a temporary directory owned by the
//! returned [`UnpackedArchive`].

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::manifest::{Manifest, MANIFEST_FILENAME};
use crate::ops::errors::PackError;
use crate::util::archive::{ArchiveCodec, ArchiveFormat};
use crate::util::fs::is_really_within;

const TEMP_PREFIX: &str = "wdlpack_run_zip_";

/// An unpacked source archive.
///
/// When the source had to be extracted, the extracted tree is deleted when
/// this value is dropped (or by [`UnpackedArchive::close`]). Directory and
/// manifest inputs are never deleted.
#[derive(Debug)]
pub struct UnpackedArchive {
    /// Absolute directory holding `MANIFEST.json`.
    pub dir: PathBuf,
    /// Main document named by the manifest.
    pub main_wdl: PathBuf,
    /// Default inputs file, if the manifest names one.
    pub input_file: Option<PathBuf>,
    pub manifest: Manifest,
    extracted: Option<TempDir>,
}

impl UnpackedArchive {
    /// Whether the tree lives in a temporary directory owned by this value.
    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }

    /// Delete the extracted tree now, reporting any failure.
    pub fn close(self) -> Result<()> {
        if let Some(dir) = self.extracted {
            let path = dir.path().to_path_buf();
            dir.close()
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Unpack a source archive, directory, or `MANIFEST.json` file.
pub fn unpack(source: &Path) -> Result<UnpackedArchive> {
    let mut manifest_path = source.to_path_buf();
    if manifest_path.is_dir() {
        manifest_path.push(MANIFEST_FILENAME);
    }

    let extracted = if manifest_path.file_name() == Some(OsStr::new(MANIFEST_FILENAME)) {
        None
    } else {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .context("failed to create temporary directory")?;
        extract_archive(source, dir.path())?;
        manifest_path = dir.path().join(MANIFEST_FILENAME);
        Some(dir)
    };

    let manifest = read_manifest(&manifest_path).ok_or_else(|| PackError::InvalidManifest {
        path: source.to_path_buf(),
    })?;

    let manifest_dir = match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = std::path::absolute(manifest_dir)
        .with_context(|| format!("failed to resolve {}", manifest_dir.display()))?;

    let main_wdl = dir.join(&manifest.main_workflow_url);
    let input_file = manifest.input_file().map(|url| dir.join(url));

    let valid = |path: &Path| path.is_file() && is_really_within(path, &dir);
    if !valid(&main_wdl) || input_file.as_deref().is_some_and(|path| !valid(path)) {
        return Err(PackError::ManifestFilesInvalid {
            path: source.to_path_buf(),
        }
        .into());
    }

    tracing::debug!(
        "unpacked {} (main document {})",
        source.display(),
        main_wdl.display()
    );

    Ok(UnpackedArchive {
        dir,
        main_wdl,
        input_file,
        manifest,
        extracted,
    })
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let unreadable = |reason: String| PackError::UnreadableArchive {
        path: archive.to_path_buf(),
        reason,
    };

    let format = ArchiveFormat::detect(archive)
        .ok_or_else(|| unreadable("unrecognised archive format".to_string()))?;
    format
        .extract(archive, dest)
        .map_err(|e| unreadable(format!("{:#}", e)))?;
    Ok(())
}

fn read_manifest(path: &Path) -> Option<Manifest> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Manifest::from_value(&value),
        Err(e) => {
            tracing::debug!("cannot parse {}: {}", path.display(), e);
            None
        }
    }
}
