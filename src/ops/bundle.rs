//! Workflow bundles.
//!
//! A bundle packages a workflow document, the documents it imports and
//! optional default inputs into a single text file. The text is YAML
//! prefixed with [`YAML_MAGIC`], inlining each source file together with a
//! layout tree recording how the files import each other. The compact form
//! gzips that text and base64-encodes it, which keeps bundles small enough
//! to pass through environment variables.
//!
//! Bundles are read back through [`BundleReader`], a [`SourceReader`] that
//! lets the regular [`Loader`](crate::core::loader::Loader) rebuild the
//! document graph without touching the filesystem.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::document::basename;
use crate::core::loader::{SourceReader, SourceText};
use crate::core::Document;
use crate::ops::errors::PackError;

/// Prefix of the plain YAML form.
pub const YAML_MAGIC: &str = "#wdl_bundle\n";

/// Prefix of the compact form (base64 of the gzip header).
pub const COMPACT_MAGIC: &str = "H4sI";

/// A decoded workflow bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    pub layout: Layout,
    pub sources: Vec<BundleSource>,
}

/// One node of the import tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// The import URI as written by the importer (the basename for the root).
    #[serde(rename = "ref")]
    pub reference: String,
    /// Index into [`Bundle::sources`].
    pub source: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Layout>,
}

/// An inlined source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSource {
    pub abspath: String,
    pub source_text: String,
}

/// Bundle `doc`, everything it imports, and optional default inputs.
pub fn build_bundle(doc: &Arc<Document>, input: Option<Map<String, Value>>) -> Bundle {
    let mut sources = Vec::new();
    let layout = build_layout(doc, basename(&doc.pos.uri), &mut sources);
    Bundle {
        input: input.filter(|m| !m.is_empty()),
        layout,
        sources,
    }
}

fn build_layout(doc: &Document, reference: &str, sources: &mut Vec<BundleSource>) -> Layout {
    let source = match sources.iter().position(|s| s.abspath == doc.abspath()) {
        Some(existing) => existing,
        None => {
            sources.push(BundleSource {
                abspath: doc.abspath().to_string(),
                source_text: doc.source_text.clone(),
            });
            sources.len() - 1
        }
    };
    let imports = doc
        .imports
        .iter()
        .map(|imp| build_layout(&imp.doc, &imp.uri, sources))
        .collect();
    Layout {
        reference: reference.to_string(),
        source,
        imports,
    }
}

/// Encode a bundle as text, optionally in compact form.
pub fn encode(bundle: &Bundle, compress: bool) -> Result<String> {
    let yaml = serde_yaml::to_string(bundle).context("failed to serialize bundle")?;
    let text = format!("{}{}", YAML_MAGIC, yaml);
    if !compress {
        return Ok(text);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .context("failed to compress bundle")?;
    let compressed = encoder.finish().context("failed to compress bundle")?;
    Ok(STANDARD.encode(compressed))
}

/// Whether `text` looks like a bundle.
pub fn detect(text: &str) -> bool {
    text.starts_with(YAML_MAGIC) || text.starts_with(COMPACT_MAGIC)
}

/// Decode bundle text in either form.
pub fn decode(text: &str) -> Result<Bundle> {
    let text = text.trim();
    let corrupt = |reason: &str| PackError::BundleCorrupt {
        reason: reason.to_string(),
    };

    let inflated;
    let yaml = if text.starts_with(COMPACT_MAGIC) {
        let bytes = STANDARD
            .decode(text)
            .map_err(|_| corrupt("invalid base64 in compact bundle"))?;
        let mut decoded = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut decoded)
            .map_err(|_| corrupt("compressed bundle cannot be inflated"))?;
        inflated = decoded;
        inflated.as_str()
    } else {
        text
    };

    if !yaml.starts_with(YAML_MAGIC) {
        return Err(corrupt("missing #wdl_bundle header").into());
    }
    let bundle: Bundle = serde_yaml::from_str(yaml).map_err(|e| PackError::BundleCorrupt {
        reason: e.to_string(),
    })?;
    if bundle.layout.source != 0 || bundle.sources.is_empty() {
        return Err(corrupt("layout root is not the first source").into());
    }
    Ok(bundle)
}

/// Reads documents out of a decoded [`Bundle`].
///
/// The first read returns the main document; each later read resolves the
/// import URI within the importer's layout node.
#[derive(Debug)]
pub struct BundleReader {
    bundle: Bundle,
    imports_by_abspath: HashMap<String, Vec<Layout>>,
}

impl BundleReader {
    pub fn new(bundle: Bundle) -> Self {
        BundleReader {
            bundle,
            imports_by_abspath: HashMap::new(),
        }
    }

    /// The embedded default inputs, if any.
    pub fn input(&self) -> Option<&Map<String, Value>> {
        self.bundle.input.as_ref()
    }

    fn source(&self, index: usize) -> Result<&BundleSource> {
        self.bundle.sources.get(index).ok_or_else(|| {
            PackError::BundleCorrupt {
                reason: format!("layout refers to missing source {}", index),
            }
            .into()
        })
    }
}

impl SourceReader for BundleReader {
    fn read(&mut self, uri: &str, importer: Option<&Document>) -> Result<SourceText> {
        let Some(importer) = importer else {
            let main = self.source(self.bundle.layout.source)?;
            let text = SourceText {
                text: main.source_text.clone(),
                abspath: main.abspath.clone(),
            };
            self.imports_by_abspath
                .insert(text.abspath.clone(), self.bundle.layout.imports.clone());
            return Ok(text);
        };

        let layout = self
            .imports_by_abspath
            .get(importer.abspath())
            .and_then(|imports| imports.iter().find(|l| l.reference == uri))
            .cloned()
            .ok_or_else(|| PackError::BundleCorrupt {
                reason: format!("no layout entry for \"{}\" in {}", uri, importer.abspath()),
            })?;

        let source = self.source(layout.source)?;
        let text = SourceText {
            text: source.source_text.clone(),
            abspath: source.abspath.clone(),
        };
        match self.imports_by_abspath.entry(text.abspath.clone()) {
            Entry::Occupied(known) if *known.get() != layout.imports => {
                return Err(PackError::BundleCorrupt {
                    reason: format!("inconsistent layout for {}", text.abspath),
                }
                .into());
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(layout.imports);
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::{self, Loader};
    use crate::test_support::{graph_shape, WorkflowFixture};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn nested_root(tmp: &TempDir) -> Arc<Document> {
        WorkflowFixture::nested().write_to(tmp.path()).unwrap();
        loader::load(&tmp.path().join("flows/main.wdl")).unwrap()
    }

    #[test]
    fn test_build_bundle_layout() {
        let tmp = TempDir::new().unwrap();
        let root = nested_root(&tmp);

        let bundle = build_bundle(&root, None);
        assert_eq!(bundle.sources.len(), 4);
        assert!(bundle.sources[0].abspath.ends_with("flows/main.wdl"));
        assert_eq!(bundle.layout.reference, "main.wdl");
        assert_eq!(bundle.layout.source, 0);

        let refs: Vec<_> = bundle
            .layout
            .imports
            .iter()
            .map(|l| l.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["tasks/align.wdl", "../shared/qc.wdl"]);

        // common.wdl appears twice in the tree but once in sources.
        let common_via_align = bundle.layout.imports[0].imports[0].source;
        let common_via_qc = bundle.layout.imports[1].imports[0].source;
        assert_eq!(common_via_align, common_via_qc);
        assert!(bundle.layout.imports[0].imports[0].imports.is_empty());
    }

    #[test]
    fn test_encode_decode() {
        let tmp = TempDir::new().unwrap();
        let root = nested_root(&tmp);
        let input = json!({"main.sample": "NA12878"}).as_object().unwrap().clone();
        let bundle = build_bundle(&root, Some(input));

        let plain = encode(&bundle, false).unwrap();
        assert!(plain.starts_with(YAML_MAGIC));
        assert!(detect(&plain));
        assert_eq!(decode(&plain).unwrap(), bundle);

        let compact = encode(&bundle, true).unwrap();
        assert!(compact.starts_with(COMPACT_MAGIC));
        assert!(!compact.contains('\n'));
        assert!(detect(&compact));
        assert_eq!(decode(&format!("  {}\n", compact)).unwrap(), bundle);
    }

    #[test]
    fn test_source_text_is_kept_verbatim() {
        let tmp = TempDir::new().unwrap();
        let text = "version 1.0\r\n\r\nworkflow w {}\r\n";
        fs::write(tmp.path().join("main.wdl"), text).unwrap();
        let root = loader::load(&tmp.path().join("main.wdl")).unwrap();

        let bundle = build_bundle(&root, None);
        assert_eq!(bundle.sources[0].source_text, text);

        let decoded = decode(&encode(&bundle, true).unwrap()).unwrap();
        assert_eq!(decoded.sources[0].source_text, text);
    }

    #[test]
    fn test_empty_input_is_omitted() {
        let tmp = TempDir::new().unwrap();
        let bundle = build_bundle(&nested_root(&tmp), Some(Map::new()));
        assert!(bundle.input.is_none());
        assert!(!encode(&bundle, false).unwrap().contains("input:"));
    }

    #[test]
    fn test_decode_rejects_corruption() {
        for text in [
            "version 1.0\nworkflow w {}\n",
            "H4sI!!!not base64",
            "H4sIAAAAAAAA",
            "#wdl_bundle\nlayout: [unterminated",
            "#wdl_bundle\nlayout:\n  ref: main.wdl\n  source: 1\nsources: []\n",
        ] {
            let err = decode(text).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<PackError>(),
                    Some(PackError::BundleCorrupt { .. })
                ),
                "{:?} was not reported as corrupt",
                text
            );
        }
    }

    #[test]
    fn test_reader_rebuilds_graph() {
        let tmp = TempDir::new().unwrap();
        let root = nested_root(&tmp);
        let input = json!({"main.threads": 4}).as_object().unwrap().clone();
        let text = encode(&build_bundle(&root, Some(input.clone())), true).unwrap();

        // The source tree is gone; everything comes from the bundle.
        drop(tmp);

        let mut loader = Loader::new(BundleReader::new(decode(&text).unwrap()));
        let reloaded = loader.load("main.wdl").unwrap();
        assert_eq!(graph_shape(&reloaded), graph_shape(&root));
        assert_eq!(reloaded.abspath(), root.abspath());
        assert_eq!(reloaded.source_lines, root.source_lines);
        assert_eq!(loader.into_reader().input(), Some(&input));
    }

    #[test]
    fn test_reader_reports_incomplete_layout() {
        let bundle = Bundle {
            input: None,
            layout: Layout {
                reference: "main.wdl".to_string(),
                source: 0,
                imports: Vec::new(),
            },
            sources: vec![BundleSource {
                abspath: "/w/main.wdl".to_string(),
                source_text: "import \"lib.wdl\"".to_string(),
            }],
        };

        let err = Loader::new(BundleReader::new(bundle))
            .load("main.wdl")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("no layout entry for \"lib.wdl\""));
    }
}
