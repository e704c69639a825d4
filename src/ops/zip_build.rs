//! Source archive building.
//!
//! Packages a workflow document, all of its imports, optional default inputs
//! and a generated `MANIFEST.json` into one archive file.
//!
//! Imports drawn from outside the main document's directory (or by URI) are
//! stored under [`QUARANTINE_DIR`](crate::ops::zip_paths::QUARANTINE_DIR)
//! and the import statements referring to them are rewritten to match.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::core::manifest::{Manifest, DEFAULT_INPUT_FILENAME, MANIFEST_FILENAME};
use crate::core::Document;
use crate::ops::collect::collect_documents;
use crate::ops::events::{EventSink, PackEvent};
use crate::ops::rewrite::rewrite_imports;
use crate::ops::zip_paths::build_zip_paths;
use crate::util::archive::{ArchiveCodec, ArchiveFormat};
use crate::util::fs::{ensure_dir, write_string};

const TEMP_PREFIX: &str = "wdlpack_zip_";

/// Options for building a source archive.
#[derive(Debug, Clone, Default)]
pub struct ZipOptions {
    /// Default inputs, embedded as `default_input.json`.
    pub inputs: Option<Map<String, Value>>,

    /// Opaque metadata, embedded in the manifest under `meta`.
    pub meta: Option<Map<String, Value>>,

    /// Compression format.
    pub format: ArchiveFormat,
}

impl ZipOptions {
    pub fn new(format: ArchiveFormat) -> Self {
        ZipOptions {
            format,
            ..Default::default()
        }
    }

    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Build a source archive of `top_doc` at `archive`.
///
/// The archive is assembled in temporary directories and only moved to
/// `archive` once complete; on failure nothing is written there.
pub fn build_archive(
    top_doc: &Arc<Document>,
    archive: &Path,
    sink: &mut dyn EventSink,
    opts: &ZipOptions,
) -> Result<()> {
    build_archive_with(top_doc, archive, sink, opts, &opts.format)
}

/// Like [`build_archive`], compressing with `codec` instead of `opts.format`.
pub fn build_archive_with(
    top_doc: &Arc<Document>,
    archive: &Path,
    sink: &mut dyn EventSink,
    opts: &ZipOptions,
    codec: &dyn ArchiveCodec,
) -> Result<()> {
    let staging = build_source_dir(top_doc, sink)?;
    let basename = top_doc.pos.basename();

    let mut manifest = Manifest::new(basename);
    if let Some(meta) = opts.meta.as_ref().filter(|m| !m.is_empty()) {
        manifest = manifest.with_meta(meta.clone());
    }
    if let Some(inputs) = opts.inputs.as_ref().filter(|m| !m.is_empty()) {
        let text = serde_json::to_string_pretty(inputs).context("failed to serialize inputs")?;
        write_string(&staging.path().join(DEFAULT_INPUT_FILENAME), &text)?;
        manifest = manifest.with_input_file(DEFAULT_INPUT_FILENAME);
    }
    let manifest_json = manifest
        .to_json_pretty()
        .context("failed to serialize manifest")?;
    write_string(&staging.path().join(MANIFEST_FILENAME), &manifest_json)?;
    sink.emit(PackEvent::Manifest {
        manifest: serde_json::to_value(&manifest).context("failed to serialize manifest")?,
    });

    let tmp_dir = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .context("failed to create temporary directory")?;
    let tmp_archive = tmp_dir
        .path()
        .join(format!("{}{}", basename, codec.extension()));
    sink.emit(PackEvent::Archiving {
        staging_dir: staging.path().to_path_buf(),
    });
    codec.compress_dir(staging.path(), &tmp_archive)?;

    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    move_into_place(&tmp_archive, archive)?;
    sink.emit(PackEvent::ArchiveWritten {
        archive: archive.to_path_buf(),
        from: tmp_archive,
    });

    Ok(())
}

/// Write every document in the closure of `top_doc`, with rewritten imports,
/// into a fresh temporary directory.
pub fn build_source_dir(top_doc: &Arc<Document>, sink: &mut dyn EventSink) -> Result<TempDir> {
    let docs = collect_documents(top_doc);
    let zip_paths = build_zip_paths(top_doc.pos.dirname(), &docs, sink)?;
    ensure!(
        zip_paths.keys().eq(docs.keys()),
        "archive paths do not cover every collected document"
    );
    ensure!(
        zip_paths.get(top_doc.abspath()).map(String::as_str) == Some(top_doc.pos.basename()),
        "main document {} is not at the archive root",
        top_doc.abspath()
    );

    let dir = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .context("failed to create staging directory")?;

    for (abspath, doc) in &docs {
        let source_lines = rewrite_imports(doc, &zip_paths, sink)?;
        let archive_path = zip_paths
            .get(abspath)
            .with_context(|| format!("no archive path derived for {}", abspath))?;

        let mut contents = String::new();
        for line in &source_lines {
            contents.push_str(line);
            contents.push('\n');
        }
        write_string(&dir.path().join(archive_path), &contents)?;
    }

    Ok(dir)
}

/// Move a finished archive to its destination.
///
/// Falls back to copying into a temporary file beside the destination and
/// renaming that when a plain rename is impossible (e.g. across filesystems).
fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    let rename_err = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    tracing::debug!(
        "rename {} -> {} failed ({}), copying instead",
        from.display(),
        to.display(),
        rename_err
    );

    let dest_dir = to
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dest_dir)
        .with_context(|| format!("failed to create temporary file in {}", dest_dir.display()))?;
    let mut input =
        File::open(from).with_context(|| format!("failed to open {}", from.display()))?;
    io::copy(&mut input, staged.as_file_mut())
        .with_context(|| format!("failed to copy {}", from.display()))?;
    staged
        .persist(to)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move archive to {}", to.display()))?;
    Ok(())
}
