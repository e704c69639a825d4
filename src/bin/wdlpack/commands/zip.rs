//! `wdlpack zip` command

use std::io;

use anyhow::Result;

use crate::cli::{MessageFormat, ZipArgs};
use crate::commands::{load_main, read_json_object};
use wdlpack::ops::{build_archive, JsonSink, TracingSink, ZipOptions};
use wdlpack::util::ArchiveCodec;
use wdlpack::GlobalContext;

pub fn execute(args: ZipArgs, ctx: &GlobalContext) -> Result<()> {
    let main = ctx.resolve(&args.main);
    let root = load_main(&main)?;

    let format = args.format.unwrap_or_else(|| ctx.default_format());
    let mut opts = ZipOptions::new(format);
    if let Some(path) = &args.input {
        opts = opts.with_inputs(read_json_object(&ctx.resolve(path))?);
    }
    if let Some(path) = &args.meta {
        opts = opts.with_meta(read_json_object(&ctx.resolve(path))?);
    }

    let output = match &args.output {
        Some(path) => ctx.resolve(path),
        None => {
            let stem = main
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "workflow".to_string());
            ctx.default_output(&format!("{}{}", stem, format.extension()))
        }
    };

    match args.message_format {
        MessageFormat::Human => build_archive(&root, &output, &mut TracingSink, &opts),
        MessageFormat::Json => {
            let mut sink = JsonSink::new(io::stdout().lock());
            build_archive(&root, &output, &mut sink, &opts)
        }
    }
}
