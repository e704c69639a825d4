//! Import closure collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::Document;

/// All documents reachable from a root, keyed by absolute identity.
pub type DocumentClosure = BTreeMap<String, Arc<Document>>;

/// Collect the root document and everything it transitively imports.
///
/// A document imported from several places appears once and is expanded
/// once.
pub fn collect_documents(root: &Arc<Document>) -> DocumentClosure {
    let mut closure = DocumentClosure::new();
    let mut queue = vec![Arc::clone(root)];

    while let Some(doc) = queue.pop() {
        if closure.contains_key(doc.abspath()) {
            continue;
        }
        for import in &doc.imports {
            if !closure.contains_key(import.doc.abspath()) {
                queue.push(Arc::clone(&import.doc));
            }
        }
        closure.insert(doc.abspath().to_string(), doc);
    }

    closure
}
