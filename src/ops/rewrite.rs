//! Import statement rewriting.
//!
//! Import URIs are rewritten in place by substituting the quoted literal
//! within the statement's recorded line span. The rest of the source text,
//! including formatting and comments, is left exactly as it was.

use anyhow::Result;

use crate::core::document::dirname;
use crate::core::Document;
use crate::ops::errors::PackError;
use crate::ops::events::{EventSink, PackEvent};
use crate::ops::zip_paths::ZipPaths;
use crate::util::fs::relative_uri;

/// Return a copy of `doc`'s source lines with every import URI pointing at
/// the imported document's location in the archive.
pub fn rewrite_imports(
    doc: &Document,
    zip_paths: &ZipPaths,
    sink: &mut dyn EventSink,
) -> Result<Vec<String>> {
    let mut source_lines = doc.source_lines.clone();
    let own_path = archive_path(zip_paths, doc.abspath())?;
    let own_dir = dirname(own_path);

    for import in &doc.imports {
        let target = archive_path(zip_paths, import.doc.abspath())?;
        let new_uri = relative_uri(own_dir, target);
        let old_pattern = format!("\"{}\"", import.uri);
        let new_pattern = format!("\"{}\"", new_uri);

        let not_found = || PackError::ImportLiteralNotFound {
            document: doc.abspath().to_string(),
            uri: import.uri.clone(),
            span: import.pos.to_string(),
        };

        let lo = import.pos.line.saturating_sub(1);
        let hi = import.pos.end_line;
        let span = source_lines.get_mut(lo..hi).ok_or_else(not_found)?;

        let mut found = false;
        for (offset, line) in span.iter_mut().enumerate() {
            if !line.contains(&old_pattern) {
                continue;
            }
            found = true;
            let rewritten = line.replace(&old_pattern, &new_pattern);
            if rewritten != *line {
                sink.emit(PackEvent::ImportRewritten {
                    document: doc.abspath().to_string(),
                    line: lo + offset + 1,
                    before: line.clone(),
                    after: rewritten.clone(),
                });
                *line = rewritten;
            }
        }

        if !found {
            return Err(not_found().into());
        }
    }

    Ok(source_lines)
}

fn archive_path<'a>(zip_paths: &'a ZipPaths, abspath: &str) -> Result<&'a str> {
    zip_paths
        .get(abspath)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("no archive path derived for {}", abspath))
}
