//! wdlpack - source archives and bundles for multi-file workflows
//!
//! This crate packages a workflow document together with every document it
//! imports into a self-contained archive with a `MANIFEST.json`, and unpacks
//! such archives again with path safety checks.

pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for wdlpack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides in-memory document builders and on-disk
/// source tree fixtures.
#[cfg(test)]
pub mod test_support;

pub use self::core::{Document, Import, Manifest, SourcePos, SourceSpan};
pub use ops::{build_archive, unpack, PackError, ZipOptions};
pub use util::context::GlobalContext;
