//! Archive path derivation.
//!
//! Every document in the closure gets a unique path inside the archive.
//! Documents under the main document's directory keep their relative layout;
//! anything else (sibling directories, remote URIs) is relocated under
//! [`QUARANTINE_DIR`], keeping whatever directory structure it does not share
//! with the main directory.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::ops::collect::DocumentClosure;
use crate::ops::errors::PackError;
use crate::ops::events::{EventSink, PackEvent};

/// Archive subdirectory holding documents from outside the main directory.
pub const QUARANTINE_DIR: &str = "__outside_wdl";

/// Archive path for every document, keyed by absolute identity.
pub type ZipPaths = BTreeMap<String, String>;

/// Compute the path inside the archive at which to store each document.
///
/// `main_dir` is the directory of the main document; a trailing `/` is
/// optional.
pub fn build_zip_paths(
    main_dir: &str,
    docs: &DocumentClosure,
    sink: &mut dyn EventSink,
) -> Result<ZipPaths> {
    let main_dir = format!("{}/", main_dir.trim_end_matches('/'));
    let normalized_main_dir = normalize_uri(&main_dir);

    let mut paths = ZipPaths::new();
    let mut owners: HashMap<String, &str> = HashMap::new();
    let mut outside = false;

    for abspath in docs.keys() {
        let archive_path = match abspath.strip_prefix(main_dir.as_str()) {
            Some(relative) => relative.to_string(),
            None => {
                outside = true;
                quarantine_path(abspath, &normalized_main_dir)
            }
        };

        if let Some(first) = owners.insert(archive_path.clone(), abspath) {
            return Err(PackError::ArchivePathCollision {
                archive_path,
                first: first.to_string(),
                second: abspath.clone(),
            }
            .into());
        }

        sink.emit(PackEvent::Placed {
            archive_path: archive_path.clone(),
            abspath: abspath.clone(),
        });
        paths.insert(abspath.clone(), archive_path);
    }

    if outside {
        sink.emit(PackEvent::OutsideImports {
            quarantine_dir: QUARANTINE_DIR.to_string(),
        });
    }

    Ok(paths)
}

/// Place an out-of-tree document under the quarantine directory.
fn quarantine_path(abspath: &str, normalized_main_dir: &str) -> String {
    let normalized = normalize_uri(abspath);
    let prefix = common_dir_prefix(&normalized, normalized_main_dir);
    format!("{}/{}", QUARANTINE_DIR, &normalized[prefix.len()..])
}

/// Treat URI scheme separators like any other path text.
fn normalize_uri(path: &str) -> String {
    path.replace("://", "_")
}

/// Longest common prefix of `a` and `b` that ends with `/` (or is empty).
fn common_dir_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let common = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()));

    match a[..common].rfind('/') {
        Some(idx) => &a[..=idx],
        None => "",
    }
}
