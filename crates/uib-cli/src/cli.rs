//! CLI argument definitions for `uib`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use uib_core::ModeAssignment;
use uib_model::{InstanceId, NodeRef, PropId, Root};

#[derive(Parser)]
#[command(
    name = "uib",
    version,
    about = "Inspect and edit UI builder documents",
    long_about = "Inspect and edit UI builder documents.\n\n\
                  Rebuilds screen and component trees from ownership pointers,\n\
                  resolves bindings, props and design tokens, checks document\n\
                  consistency and applies edit batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// TOML settings file with default active modes.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the materialized tree of a screen or component.
    Tree(TreeArgs),

    /// Resolve the properties of an element or instance.
    Resolve(ResolveArgs),

    /// Resolve the effective value of one prop on an instance.
    Prop(PropArgs),

    /// Resolve a design token (or shadow preset) under the active modes.
    Token(TokenArgs),

    /// Check a document for structural and referential problems.
    ///
    /// Exits with status 1 when any error-severity issue is found.
    Check(CheckArgs),

    /// Apply a JSON array of edits as one all-or-nothing batch.
    ///
    /// The new document goes to stdout (or --output) and the edit report to
    /// stderr. A rejected batch writes nothing.
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// JSON document to read.
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    /// Tree root, as screen:<id> or component:<id>.
    #[arg(long = "root", value_name = "ROOT")]
    pub root: Root,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    /// Node to resolve, as element:<id> or instance:<id>.
    #[arg(long = "node", value_name = "NODE")]
    pub node: NodeRef,

    /// Resolve the node as it appears inside this instance's expansion.
    #[arg(long = "within", value_name = "INSTANCE")]
    pub within: Option<InstanceId>,

    /// Only show this property.
    #[arg(long = "property", value_name = "NAME")]
    pub property: Option<String>,

    #[command(flatten)]
    pub modes: ModeArgs,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(Args)]
pub struct PropArgs {
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    #[arg(long = "instance", value_name = "ID")]
    pub instance: InstanceId,

    #[arg(long = "prop", value_name = "ID")]
    pub prop: PropId,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(Args)]
pub struct TokenArgs {
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    /// Token id (preset id with --preset).
    #[arg(value_name = "ID")]
    pub id: String,

    /// Look up a shadow preset instead of a token.
    #[arg(long = "preset")]
    pub preset: bool,

    #[command(flatten)]
    pub modes: ModeArgs,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    /// JSON file holding an array of edits.
    #[arg(value_name = "EDITS")]
    pub edits: PathBuf,

    /// Write the new document here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ModeArgs {
    /// Active mode for a group, as GROUP=MODE. Repeatable; overrides the
    /// settings file.
    #[arg(long = "mode", value_name = "GROUP=MODE")]
    pub modes: Vec<ModeAssignment>,
}

#[derive(Args)]
pub struct FormatArgs {
    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: FormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
