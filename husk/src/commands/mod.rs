mod bundle;
mod check;
mod completions;

use bundle::BundleCommand;
use check::CheckCommand;
use clap::{Parser, Subcommand};
use completions::CompletionsCommand;
use eyre::Result;

/// Extension trait for exiting on manifest errors with pretty formatting.
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for husk_manifest::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "husk")]
#[command(version)]
#[command(about = "Bundle a backend's public declaration surface from husk.toml")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Bundle(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and write the bundled declaration document
    Bundle(BundleCommand),

    /// Validate husk.toml without bundling
    Check(CheckCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
