//! Document graph loading.
//!
//! Builds [`Document`] graphs by scanning source text for import statements
//! and loading each imported document in turn. This recognises import
//! statements only (the `import` keyword at the start of a line followed by
//! a double-quoted URI, which may sit on a later line); it does not parse
//! anything else in the workflow language.
//!
//! Where source text comes from is abstracted by [`SourceReader`]: local
//! files through [`FsReader`], or the contents of a workflow bundle through
//! [`crate::ops::bundle::BundleReader`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

use crate::core::{Document, Import, SourcePos, SourceSpan};
use crate::ops::errors::PackError;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*(import)\s+"([^"\n]*)""#).unwrap());

/// Source text together with the canonical identity it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    pub abspath: String,
}

/// Resolves import URIs to source text.
pub trait SourceReader {
    /// Read the document named by `uri`. `importer` is the importing document
    /// (`None` for the root).
    fn read(&mut self, uri: &str, importer: Option<&Document>) -> Result<SourceText>;
}

/// Reads documents from the local filesystem.
///
/// Relative URIs resolve against the importer's directory (or the current
/// directory for the root). `file://` URIs are accepted; any other scheme is
/// rejected with [`PackError::UnsupportedImport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl FsReader {
    fn resolve(uri: &str, importer: Option<&Document>) -> Result<PathBuf> {
        if uri.starts_with("file://") {
            let url = Url::parse(uri).with_context(|| format!("invalid file URI: {}", uri))?;
            return url
                .to_file_path()
                .map_err(|()| anyhow::anyhow!("file URI has no local path: {}", uri));
        }
        if uri.contains("://") {
            return Err(PackError::UnsupportedImport {
                uri: uri.to_string(),
            }
            .into());
        }

        let path = Path::new(uri);
        Ok(match importer {
            Some(importer) if path.is_relative() => Path::new(importer.pos.dirname()).join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl SourceReader for FsReader {
    fn read(&mut self, uri: &str, importer: Option<&Document>) -> Result<SourceText> {
        let path = Self::resolve(uri, importer)?;
        let canonical = path
            .canonicalize()
            .with_context(|| format!("failed to find document: {}", path.display()))?;
        let text = crate::util::fs::read_to_string(&canonical)?;
        Ok(SourceText {
            text,
            abspath: canonical.to_string_lossy().into_owned(),
        })
    }
}

/// An import statement found by [`scan_imports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub uri: String,
    pub span: SourceSpan,
}

/// Find import statements in source text.
pub fn scan_imports(text: &str) -> Vec<ImportStatement> {
    IMPORT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let keyword = caps.get(1)?;
            let literal = caps.get(2)?;
            Some(ImportStatement {
                uri: literal.as_str().to_string(),
                span: SourceSpan::new(line_of(text, keyword.start()), line_of(text, literal.end())),
            })
        })
        .collect()
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Loads a document and everything it imports.
///
/// Documents are memoised by absolute identity, so a file imported from
/// several places is loaded once and shared.
pub struct Loader<R: SourceReader> {
    reader: R,
    loaded: HashMap<String, Arc<Document>>,
}

impl<R: SourceReader> Loader<R> {
    pub fn new(reader: R) -> Self {
        Loader {
            reader,
            loaded: HashMap::new(),
        }
    }

    /// Load the root document named by `uri` and its import closure.
    pub fn load(&mut self, uri: &str) -> Result<Arc<Document>> {
        let mut stack = Vec::new();
        self.load_document(uri, None, &mut stack)
    }

    /// Consume the loader, returning its reader.
    pub fn into_reader(self) -> R {
        self.reader
    }

    fn load_document(
        &mut self,
        uri: &str,
        importer: Option<&Document>,
        stack: &mut Vec<String>,
    ) -> Result<Arc<Document>> {
        let source = self.reader.read(uri, importer)?;
        if let Some(doc) = self.loaded.get(&source.abspath) {
            return Ok(Arc::clone(doc));
        }
        if stack.contains(&source.abspath) {
            return Err(PackError::ImportCycle {
                abspath: source.abspath,
            }
            .into());
        }

        tracing::debug!("loading {}", source.abspath);
        let mut doc = Document::new(
            SourcePos::new(uri, source.abspath.clone()),
            &source.text,
            Vec::new(),
        );

        stack.push(source.abspath.clone());
        for statement in scan_imports(&source.text) {
            let imported = self
                .load_document(&statement.uri, Some(&doc), stack)
                .with_context(|| {
                    format!(
                        "failed to import \"{}\" at {} of {}",
                        statement.uri, statement.span, source.abspath
                    )
                })?;
            doc.imports
                .push(Import::new(statement.uri, statement.span, imported));
        }
        stack.pop();

        let doc = Arc::new(doc);
        self.loaded.insert(source.abspath, Arc::clone(&doc));
        Ok(doc)
    }
}

/// Load a document and its imports from the local filesystem.
pub fn load(path: &Path) -> Result<Arc<Document>> {
    Loader::new(FsReader).load(&path.to_string_lossy())
}
