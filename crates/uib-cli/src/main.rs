//! `uib`: inspect and edit UI builder documents.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use uib_cli::commands::{
    OutputFormat, ResolveTarget, load_document, run_apply, run_check, run_prop, run_resolve,
    run_token, run_tree,
};
use uib_cli::config::Settings;
use uib_cli::logging::{LogConfig, LogFormat, init_logging};
use uib_cli::render::edit_summary;

mod cli;

use crate::cli::{Cli, Command, FormatArg, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let settings = Settings::load_optional(cli.config.as_deref())?;
    match &cli.command {
        Command::Tree(args) => {
            let store = load_document(&args.doc)?;
            print!("{}", run_tree(&store, &args.root));
            Ok(0)
        }
        Command::Resolve(args) => {
            let store = load_document(&args.doc)?;
            let modes = settings.active_modes(&args.modes.modes)?;
            let target = ResolveTarget {
                node: args.node.clone(),
                within: args.within.clone(),
                property: args.property.clone(),
            };
            let output = run_resolve(&store, &target, &modes, output_format(args.output.format))?;
            println!("{output}");
            Ok(0)
        }
        Command::Prop(args) => {
            let store = load_document(&args.doc)?;
            let output = run_prop(
                &store,
                &args.instance,
                &args.prop,
                output_format(args.output.format),
            )?;
            println!("{output}");
            Ok(0)
        }
        Command::Token(args) => {
            let store = load_document(&args.doc)?;
            let modes = settings.active_modes(&args.modes.modes)?;
            let output = run_token(
                &store,
                &args.id,
                args.preset,
                &modes,
                output_format(args.output.format),
            )?;
            println!("{output}");
            Ok(0)
        }
        Command::Check(args) => {
            let store = load_document(&args.doc)?;
            let (output, report) = run_check(&store, output_format(args.output.format))?;
            println!("{output}");
            Ok(if report.has_errors() { 1 } else { 0 })
        }
        Command::Apply(args) => {
            let store = load_document(&args.doc)?;
            let (next, report) = run_apply(&store, &args.edits)?;
            eprint!("{}", edit_summary(&report));
            match &args.output {
                Some(path) => next
                    .save(path)
                    .with_context(|| format!("write document {}", path.display()))?,
                None => println!(
                    "{}",
                    next.to_json_string_pretty().context("encode document")?
                ),
            }
            Ok(0)
        }
    }
}

fn output_format(arg: FormatArg) -> OutputFormat {
    match arg {
        FormatArg::Table => OutputFormat::Table,
        FormatArg::Json => OutputFormat::Json,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default()
        .with_level_filter(cli.verbosity.tracing_level_filter())
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config = config.with_format(match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    });
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
