//! wdlpack CLI - Source archives for multi-file workflows

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wdlpack::ops::PackError;
use wdlpack::util::diagnostic;
use wdlpack::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("wdlpack=debug")
    } else {
        EnvFilter::new("wdlpack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(color)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(color);

    // Execute command
    match cli.command {
        Commands::Zip(args) => commands::zip::execute(args, &ctx),
        Commands::Inspect(args) => commands::inspect::execute(args, &ctx),
        Commands::Extract(args) => commands::extract::execute(args, &ctx),
        Commands::Bundle(args) => commands::bundle::execute(args, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, with the typed diagnostic when there is one.
fn report(err: &anyhow::Error, color: bool) {
    let Some(pack_error) = err.downcast_ref::<PackError>() else {
        eprintln!("error: {:#}", err);
        return;
    };

    let mut diag = pack_error.to_diagnostic();
    for cause in err
        .chain()
        .take_while(|cause| cause.downcast_ref::<PackError>().is_none())
    {
        diag = diag.with_context(cause.to_string());
    }
    diagnostic::emit(&diag, color);
}
