//! Test fixtures for common test scenarios.
//!
//! Source trees are written to a real directory so that the loader, the
//! archive builder and the unpacker can be exercised end to end.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A set of workflow source files to be written under a base directory.
#[derive(Debug, Clone, Default)]
pub struct WorkflowFixture {
    /// Files keyed by path relative to the base directory.
    pub files: BTreeMap<PathBuf, String>,
}

impl WorkflowFixture {
    /// Create a new empty fixture.
    pub fn new() -> Self {
        WorkflowFixture::default()
    }

    /// A main workflow in `flows/` importing one task file next to it and
    /// one from a sibling `shared/` directory, which in turn imports a file
    /// back inside `flows/`.
    ///
    /// ```text
    /// flows/main.wdl
    /// flows/tasks/align.wdl
    /// flows/common.wdl
    /// shared/qc.wdl          (imports ../flows/common.wdl)
    /// ```
    pub fn nested() -> Self {
        WorkflowFixture::new()
            .with_file(
                "flows/main.wdl",
                r#"version 1.0

# Main workflow
import "tasks/align.wdl" as align
import "../shared/qc.wdl"
    as qc

workflow main {
    call align.run
    call qc.check
}
"#,
            )
            .with_file(
                "flows/tasks/align.wdl",
                r#"version 1.0

import "../common.wdl"

task run {
    command <<< echo align >>>
}
"#,
            )
            .with_file(
                "flows/common.wdl",
                r#"version 1.0

struct Sample {
    String name
}
"#,
            )
            .with_file(
                "shared/qc.wdl",
                r#"version 1.0

import "../flows/common.wdl" as common

task check {
    command <<< echo qc >>>
}
"#,
            )
    }

    /// A single document with no imports.
    pub fn single() -> Self {
        WorkflowFixture::new().with_file(
            "hello.wdl",
            "version 1.0\n\nworkflow hello {\n}\n",
        )
    }

    /// Add a source file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write this fixture under `base_path`.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<()> {
        for (relative, content) in &self.files {
            let path = base_path.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}
