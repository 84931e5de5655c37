//! # pattr
//!
//! Attribute-driven reactive pages, rendered from the command line.
//!
//! ## Name Origin
//!
//! **pattr** is short for *pattern + attribute*: pages describe their
//! behavior in attribute patterns, and this tool brings them to life
//! outside the browser to render, script and inspect them.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pattr")]
#[command(about = "Render and inspect attribute-driven reactive pages", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level: error, warn, info, debug or trace (default from config, else warn)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file path (default: pattr.config.json next to the page, then in CWD)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hydrate a page, apply scripted changes and print the resulting HTML
    Render(commands::render::RenderArgs),

    /// Hydrate a page and print its scope tree
    Scopes(commands::scopes::ScopesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let page = match &cli.command {
        Commands::Render(args) => &args.page,
        Commands::Scopes(args) => &args.page,
    };
    let config = config::load_config(cli.config.as_deref(), page.parent());
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Scopes(args) => commands::scopes::run(args, &config),
    };
    match result {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!(
            "\x1b[33mWarning:\x1b[0m Unknown log level '{}', using warn",
            level
        );
        tracing::Level::WARN
    });
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .init();
}
