//! Packaging error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Broad classification of a [`PackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; retrying with different input can succeed.
    Input,
    /// Parsed position metadata disagrees with the source text, or path
    /// derivation produced an inconsistent layout.
    Internal,
}

/// Error raised while building or unpacking a source archive.
///
/// Filesystem failures are not represented here; they propagate as
/// `anyhow::Error` with path context. Operations return these through
/// `anyhow` as well, so use `downcast_ref::<PackError>()` to classify.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PackError {
    #[error("unreadable source archive {}", .path.display())]
    #[diagnostic(code(wdlpack::unpack::unreadable))]
    UnreadableArchive { path: PathBuf, reason: String },

    #[error("missing or invalid MANIFEST.json in {}", .path.display())]
    #[diagnostic(code(wdlpack::unpack::manifest))]
    InvalidManifest { path: PathBuf },

    #[error("MANIFEST.json refers to missing or invalid files in {}", .path.display())]
    #[diagnostic(code(wdlpack::unpack::manifest_files))]
    ManifestFilesInvalid { path: PathBuf },

    #[error("unknown archive format `{name}`")]
    #[diagnostic(
        code(wdlpack::format),
        help("supported formats: zip, tar, gztar")
    )]
    UnknownFormat { name: String },

    #[error("workflow bundle is corrupt: {reason}")]
    #[diagnostic(code(wdlpack::bundle::corrupt))]
    BundleCorrupt { reason: String },

    #[error("import cycle through {abspath}")]
    #[diagnostic(code(wdlpack::load::cycle))]
    ImportCycle { abspath: String },

    #[error("cannot read `{uri}`: only local files and file:// URIs are supported")]
    #[diagnostic(code(wdlpack::load::unsupported))]
    UnsupportedImport { uri: String },

    #[error("import \"{uri}\" not found at {span} of {document}")]
    #[diagnostic(code(wdlpack::rewrite::literal_not_found))]
    ImportLiteralNotFound {
        document: String,
        uri: String,
        span: String,
    },

    #[error("archive path `{archive_path}` assigned to both {first} and {second}")]
    #[diagnostic(code(wdlpack::layout::collision))]
    ArchivePathCollision {
        archive_path: String,
        first: String,
        second: String,
    },
}

impl PackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::ImportLiteralNotFound { .. } | PackError::ArchivePathCollision { .. } => {
                ErrorKind::Internal
            }
            _ => ErrorKind::Input,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            PackError::UnreadableArchive { reason, .. } => diag
                .with_context(reason.clone())
                .with_suggestion("Check that the file is a zip or tar archive built by `wdlpack zip`"),

            PackError::InvalidManifest { path } => diag
                .with_location(path.clone())
                .with_context("MANIFEST.json must be a JSON object with a string `mainWorkflowURL`"),

            PackError::ManifestFilesInvalid { path } => diag
                .with_location(path.clone())
                .with_context(
                    "mainWorkflowURL and inputFileURLs[0] must name files inside the archive",
                ),

            PackError::UnknownFormat { .. } => {
                diag.with_suggestion("Use one of: zip, tar, gztar")
            }

            PackError::BundleCorrupt { .. } => {
                diag.with_suggestion("Regenerate the bundle with `wdlpack bundle`")
            }

            PackError::ImportCycle { .. } => {
                diag.with_suggestion("Break the cycle by removing one of the import statements")
            }

            PackError::UnsupportedImport { .. } => diag
                .with_suggestion("Download the imported document and import it by relative path"),

            PackError::ImportLiteralNotFound { .. } | PackError::ArchivePathCollision { .. } => {
                diag.with_context("this is an internal consistency error; no archive was written")
            }
        }
    }
}

/// Classify an error returned by one of the packaging operations.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<PackError>().map(PackError::kind)
}
