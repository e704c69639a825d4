//! Test utilities for wdlpack unit tests.
//!
//! [`DocBuilder`] assembles in-memory [`Document`] graphs without touching
//! the filesystem; [`fixtures`] writes realistic source trees to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use wdlpack::test_support::DocBuilder;
//!
//! let lib = DocBuilder::new("/w/lib.wdl").build();
//! let main = DocBuilder::new("/w/main.wdl")
//!     .line("version 1.0")
//!     .import("lib.wdl", &lib)
//!     .build();
//! ```

pub mod fixtures;

use std::sync::Arc;

use crate::core::{Document, Import, SourcePos, SourceSpan};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Builder for in-memory documents.
///
/// Each `import*` call appends a one-line import statement and records the
/// matching edge, so spans are always consistent with the source lines.
#[derive(Debug, Clone)]
pub struct DocBuilder {
    pos: SourcePos,
    lines: Vec<String>,
    imports: Vec<Import>,
}

impl DocBuilder {
    /// Start a document with the given absolute identity. Its uri defaults to
    /// the basename.
    pub fn new(abspath: &str) -> Self {
        let uri = crate::core::document::basename(abspath).to_string();
        DocBuilder {
            pos: SourcePos::new(uri, abspath),
            lines: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Append a plain source line.
    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Append `import "<uri>"` referring to `doc`.
    pub fn import(self, uri: &str, doc: &Arc<Document>) -> Self {
        let text = format!("import \"{}\"", uri);
        self.push_import(text, uri, doc)
    }

    /// Append `import "<uri>" as <alias>` referring to `doc`.
    pub fn import_as(self, uri: &str, alias: &str, doc: &Arc<Document>) -> Self {
        let text = format!("import \"{}\" as {}", uri, alias);
        self.push_import(text, uri, doc)
    }

    fn push_import(mut self, text: String, uri: &str, doc: &Arc<Document>) -> Self {
        self.lines.push(text);
        let span = SourceSpan::line(self.lines.len());
        self.imports.push(Import::new(uri, span, Arc::clone(doc)));
        self
    }

    /// Finish without wrapping in `Arc`, for tests that add edges by hand.
    pub fn build_unlinked(self) -> Document {
        let mut source_text = self.lines.join("\n");
        source_text.push('\n');
        Document {
            pos: self.pos,
            source_text,
            source_lines: self.lines,
            imports: self.imports,
        }
    }

    pub fn build(self) -> Arc<Document> {
        Arc::new(self.build_unlinked())
    }
}

/// Count documents and import edges reachable from `root`, counting each
/// document once.
pub fn graph_shape(root: &Arc<Document>) -> (usize, usize) {
    let closure = crate::ops::collect_documents(root);
    let edges = closure.values().map(|doc| doc.imports.len()).sum();
    (closure.len(), edges)
}
