//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use wdlpack::util::ArchiveFormat;

/// wdlpack - Source archives and bundles for multi-file workflows
#[derive(Parser)]
#[command(name = "wdlpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a source archive from a workflow and everything it imports
    Zip(ZipArgs),

    /// Show what a source archive contains
    Inspect(InspectArgs),

    /// Unpack a source archive into a directory
    Extract(ExtractArgs),

    /// Write a single-file bundle of a workflow and its imports
    Bundle(BundleArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// How build progress is reported.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct ZipArgs {
    /// Top-level workflow document
    pub main: PathBuf,

    /// Archive to write (defaults to <main>.<ext> in the output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file of default inputs to embed
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// JSON file of metadata to embed in the manifest
    #[arg(long)]
    pub meta: Option<PathBuf>,

    /// Archive format: zip, tar or gztar
    #[arg(long)]
    pub format: Option<ArchiveFormat>,

    /// Progress output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Source archive, extracted directory, or MANIFEST.json
    pub source: PathBuf,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Source archive, extracted directory, or MANIFEST.json
    pub source: PathBuf,

    /// Directory to write the source tree into
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct BundleArgs {
    /// Top-level workflow document
    pub main: PathBuf,

    /// JSON file of default inputs to embed
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Emit the compact (gzip + base64) form
    #[arg(long)]
    pub compress: bool,

    /// File to write (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
