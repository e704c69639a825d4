//! `MANIFEST.json` schema.
//!
//! The manifest sits at the root of a source archive and names the main
//! workflow document, optionally a default inputs file, and optional opaque
//! metadata. Its layout roughly follows the multi-file workflow manifests
//! used by the Amazon Genomics CLI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File name of the manifest inside an archive.
pub const MANIFEST_FILENAME: &str = "MANIFEST.json";

/// File name used for embedded default inputs.
pub const DEFAULT_INPUT_FILENAME: &str = "default_input.json";

/// Source archive manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Main document, relative to the manifest's directory.
    #[serde(rename = "mainWorkflowURL")]
    pub main_workflow_url: String,

    /// Opaque metadata, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Input files, relative to the manifest's directory. Only the first
    /// entry is used.
    #[serde(
        rename = "inputFileURLs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub input_file_urls: Vec<String>,
}

impl Manifest {
    pub fn new(main_workflow_url: impl Into<String>) -> Self {
        Manifest {
            main_workflow_url: main_workflow_url.into(),
            meta: None,
            input_file_urls: Vec::new(),
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(Value::Object(meta));
        self
    }

    pub fn with_input_file(mut self, url: impl Into<String>) -> Self {
        self.input_file_urls.push(url.into());
        self
    }

    /// Validate a parsed manifest document.
    ///
    /// Only `mainWorkflowURL` is required. `inputFileURLs` is honoured when it
    /// is an array whose first element is a non-empty string, and ignored
    /// otherwise.
    /// Returns `None` if the value is not an object with a string
    /// `mainWorkflowURL`.
    pub fn from_value(value: &Value) -> Option<Manifest> {
        let object = value.as_object()?;
        let main_workflow_url = object.get("mainWorkflowURL")?.as_str()?.to_string();

        let input_file_urls = match object.get("inputFileURLs").and_then(Value::as_array) {
            Some(urls)
                if urls
                    .first()
                    .and_then(Value::as_str)
                    .is_some_and(|url| !url.is_empty()) =>
            {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }
            _ => Vec::new(),
        };

        Some(Manifest {
            main_workflow_url,
            meta: object.get("meta").cloned(),
            input_file_urls,
        })
    }

    /// The default inputs file, if any.
    pub fn input_file(&self) -> Option<&str> {
        self.input_file_urls.first().map(String::as_str)
    }

    /// Serialize with two-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
