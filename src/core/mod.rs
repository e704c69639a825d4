//! Core data structures for wdlpack.
//!
//! This module contains the foundational types used throughout wdlpack:
//! - Documents, import edges and source positions
//! - The `MANIFEST.json` schema
//! - The document loader

pub mod document;
pub mod loader;
pub mod manifest;

pub use document::{Document, Import, SourcePos, SourceSpan};
pub use loader::{load, FsReader, Loader, SourceReader, SourceText};
pub use manifest::{Manifest, DEFAULT_INPUT_FILENAME, MANIFEST_FILENAME};
