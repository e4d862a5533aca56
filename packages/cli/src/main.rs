mod commands;
mod config;
mod render;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, init, show, EditArgs, InitArgs, ShowArgs};
use tracing_subscriber::EnvFilter;

/// Livedit CLI - edit page content with undo history
#[derive(Parser, Debug)]
#[command(name = "livedit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new livedit project
    Init(InitArgs),

    /// Open an interactive editing session
    Edit(EditArgs),

    /// Print the saved document
    Show(ShowArgs),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never mix with the session output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd.display().to_string(),
        Err(err) => {
            eprintln!("{} cannot read current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Edit(args) => edit(args, &cwd).await,
        Command::Show(args) => show(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
