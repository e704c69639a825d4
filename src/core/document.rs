//! Workflow documents and their import edges.
//!
//! A [`Document`] is the read-only view of a parsed workflow source file that
//! the packaging pipeline needs: where it came from, its source lines, and the
//! import statements it contains. Documents are shared through [`Arc`] so that
//! a file imported from several places is represented once.

use std::fmt;
use std::sync::Arc;

/// Where a document was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePos {
    /// The URI the document was requested by (as written by the importer,
    /// or as given on the command line for the root).
    pub uri: String,

    /// Canonical absolute identity: a `/`-separated absolute path for local
    /// files, or the resolved URI for remote ones.
    pub abspath: String,
}

impl SourcePos {
    pub fn new(uri: impl Into<String>, abspath: impl Into<String>) -> Self {
        SourcePos {
            uri: uri.into(),
            abspath: abspath.into(),
        }
    }

    /// Final component of the absolute identity.
    pub fn basename(&self) -> &str {
        basename(&self.abspath)
    }

    /// Directory part of the absolute identity, without a trailing `/`.
    pub fn dirname(&self) -> &str {
        dirname(&self.abspath)
    }
}

/// Line range of a statement in its document's source (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub line: usize,
    pub end_line: usize,
}

impl SourceSpan {
    pub fn new(line: usize, end_line: usize) -> Self {
        SourceSpan { line, end_line }
    }

    /// A span covering a single line.
    pub fn line(line: usize) -> Self {
        SourceSpan {
            line,
            end_line: line,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == self.end_line {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "lines {}-{}", self.line, self.end_line)
        }
    }
}

/// An import statement: a reference from one document to another.
#[derive(Debug, Clone)]
pub struct Import {
    /// The URI literal exactly as written between the quotes in source.
    pub uri: String,

    /// Position of the whole import statement in the importer.
    pub pos: SourceSpan,

    /// The imported document.
    pub doc: Arc<Document>,
}

impl Import {
    pub fn new(uri: impl Into<String>, pos: SourceSpan, doc: Arc<Document>) -> Self {
        Import {
            uri: uri.into(),
            pos,
            doc,
        }
    }
}

/// A workflow source file with its import edges.
#[derive(Debug, Clone)]
pub struct Document {
    pub pos: SourcePos,
    /// The source text exactly as read.
    pub source_text: String,
    pub source_lines: Vec<String>,
    pub imports: Vec<Import>,
}

impl Document {
    /// Create a document from its full source text.
    pub fn new(pos: SourcePos, source_text: &str, imports: Vec<Import>) -> Self {
        Document {
            pos,
            source_text: source_text.to_string(),
            source_lines: split_lines(source_text),
            imports,
        }
    }

    /// Canonical absolute identity of this document.
    pub fn abspath(&self) -> &str {
        &self.pos.abspath
    }
}

/// Split source text into lines, dropping the terminators.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Final `/`-separated component of `path`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything before the final `/` of `path` (empty if there is none).
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}
