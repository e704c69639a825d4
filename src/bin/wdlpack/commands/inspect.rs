//! `wdlpack inspect` command
//!
//! Accepts anything `wdlpack zip` or `wdlpack bundle` produced.

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::cli::InspectArgs;
use wdlpack::core::{FsReader, Loader};
use wdlpack::ops::bundle::{self, BundleReader};
use wdlpack::ops::{collect_documents, unpack, UnpackedArchive};
use wdlpack::util::diagnostic::suggestions;
use wdlpack::util::fs::relative_path;
use wdlpack::util::ArchiveFormat;
use wdlpack::GlobalContext;

/// Unpack a source archive named on the command line.
pub fn unpack_source(source: &Path) -> Result<UnpackedArchive> {
    if !source.exists() {
        anyhow::bail!(
            "{} does not exist\n{}",
            source.display(),
            suggestions::NOT_AN_ARCHIVE
        );
    }
    unpack(source)
}

pub fn execute(args: InspectArgs, ctx: &GlobalContext) -> Result<()> {
    let source = ctx.resolve(&args.source);

    if source.is_file() && ArchiveFormat::detect(&source).is_none() {
        if let Ok(text) = fs::read_to_string(&source) {
            if bundle::detect(&text) {
                return inspect_bundle(&text);
            }
        }
    }

    let unpacked = unpack_source(&source)?;
    println!("manifest directory: {}", unpacked.dir.display());
    println!("main document:      {}", unpacked.manifest.main_workflow_url);
    match unpacked.manifest.input_file() {
        Some(input) => println!("input file:         {}", input),
        None => println!("input file:         (none)"),
    }
    if let Some(meta) = &unpacked.manifest.meta {
        println!("meta:               {}", meta);
    }

    let root = Loader::new(FsReader).load(&unpacked.main_wdl.to_string_lossy())?;
    let base = unpacked.dir.canonicalize()?;
    println!("documents:");
    for abspath in collect_documents(&root).keys() {
        println!("  {}", relative_path(&base, Path::new(abspath)).display());
    }

    unpacked.close()
}

fn inspect_bundle(text: &str) -> Result<()> {
    let decoded = bundle::decode(text)?;
    let main_ref = decoded.layout.reference.clone();

    let mut loader = Loader::new(BundleReader::new(decoded));
    let root = loader.load(&main_ref)?;

    println!("bundle main document: {}", main_ref);
    println!("documents:");
    for abspath in collect_documents(&root).keys() {
        println!("  {}", abspath);
    }
    if let Some(input) = loader.into_reader().input() {
        println!("input: {}", serde_json::Value::Object(input.clone()));
    }
    Ok(())
}
