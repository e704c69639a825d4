//! High-level operations.
//!
//! This module contains the implementation of wdlpack commands.

pub mod bundle;
pub mod collect;
pub mod errors;
pub mod events;
pub mod rewrite;
pub mod zip_build;
pub mod zip_paths;
pub mod zip_unpack;

pub use bundle::{build_bundle, Bundle, BundleReader};
pub use collect::{collect_documents, DocumentClosure};
pub use errors::{error_kind, ErrorKind, PackError};
pub use events::{EventSink, JsonSink, PackEvent, TracingSink};
pub use rewrite::rewrite_imports;
pub use zip_build::{build_archive, build_archive_with, ZipOptions};
pub use zip_paths::{build_zip_paths, ZipPaths, QUARANTINE_DIR};
pub use zip_unpack::{unpack, UnpackedArchive};
