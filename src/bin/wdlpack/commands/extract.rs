//! `wdlpack extract` command

use anyhow::Result;

use crate::cli::ExtractArgs;
use crate::commands::inspect::unpack_source;
use wdlpack::util::fs::{copy_dir_all, ensure_dir, list_files};
use wdlpack::GlobalContext;

pub fn execute(args: ExtractArgs, ctx: &GlobalContext) -> Result<()> {
    let unpacked = unpack_source(&ctx.resolve(&args.source))?;
    let dest = ctx.resolve(&args.dest);

    ensure_dir(&dest)?;
    copy_dir_all(&unpacked.dir, &dest)?;
    tracing::info!(
        "extracted {} files to {}",
        list_files(&unpacked.dir)?.len(),
        dest.display()
    );

    let main = dest.join(&unpacked.manifest.main_workflow_url);
    println!("{}", main.display());

    unpacked.close()
}
