use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use husk::ops::bundle::{self, BundleParams};
use husk_manifest::HuskToml;

use super::UnwrapOrExit;

#[derive(Args)]
pub struct BundleCommand {
    /// Path to husk.toml (defaults to ./husk.toml)
    #[arg(short, long, default_value = "husk.toml")]
    pub config: PathBuf,

    /// Output path (overrides the manifest setting)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only bundle these handler files (by file stem); failures to match
    /// the framework base become fatal for the named files
    #[arg(long = "include-handler")]
    pub include_handler: Vec<String>,

    /// Skip these handler files (by file stem)
    #[arg(long = "exclude-handler")]
    pub exclude_handler: Vec<String>,

    /// Only bundle these entity files (by file stem)
    #[arg(long = "include-entity")]
    pub include_entity: Vec<String>,

    /// Skip these entity files (by file stem)
    #[arg(long = "exclude-entity")]
    pub exclude_entity: Vec<String>,

    /// Print the document to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl BundleCommand {
    pub fn run(&self) -> Result<()> {
        let husk_toml = HuskToml::open(&self.config).unwrap_or_exit();

        let params = BundleParams {
            output_override: self.output.clone(),
            include_handlers: self.include_handler.clone(),
            exclude_handlers: self.exclude_handler.clone(),
            include_entities: self.include_entity.clone(),
            exclude_entities: self.exclude_entity.clone(),
            dry_run: self.dry_run,
        };
        let report = bundle::run(husk_toml.manifest(), husk_toml.dir(), &params)?;

        if let Some(document) = &report.document {
            print!("{document}");
            return Ok(());
        }

        println!(
            "Bundled {} declarations from {} units ({} bytes)",
            report.declarations, report.units, report.bytes
        );
        if let Some(path) = &report.output_path {
            println!("Output: {}", path.display());
        }
        Ok(())
    }
}
