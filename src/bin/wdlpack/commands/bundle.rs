//! `wdlpack bundle` command

use anyhow::Result;

use crate::cli::BundleArgs;
use crate::commands::{load_main, read_json_object};
use wdlpack::ops::bundle::{build_bundle, encode};
use wdlpack::util::fs::write_string;
use wdlpack::GlobalContext;

pub fn execute(args: BundleArgs, ctx: &GlobalContext) -> Result<()> {
    let root = load_main(&ctx.resolve(&args.main))?;
    let input = match &args.input {
        Some(path) => Some(read_json_object(&ctx.resolve(path))?),
        None => None,
    };

    let compress = args.compress || ctx.config().bundle.compress;
    let text = encode(&build_bundle(&root, input), compress)?;

    match &args.output {
        Some(path) => {
            let path = ctx.resolve(path);
            write_string(&path, &text)?;
            tracing::info!("wrote bundle {}", path.display());
        }
        None if text.ends_with('\n') => print!("{}", text),
        None => println!("{}", text),
    }

    Ok(())
}
