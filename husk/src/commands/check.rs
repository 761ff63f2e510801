use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use husk_manifest::HuskToml;

use super::UnwrapOrExit;

#[derive(Args)]
pub struct CheckCommand {
    /// Path to husk.toml (defaults to ./husk.toml)
    #[arg(short, long, default_value = "husk.toml")]
    pub config: PathBuf,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let husk_toml = HuskToml::open(&self.config).unwrap_or_exit();
        let manifest = husk_toml.manifest();

        println!("{} OK", self.config.display());
        println!("  root: {}", manifest.project.root.display());
        println!("  output: {}", manifest.project.output.display());
        println!(
            "  handlers: {} (base {} from {})",
            manifest.handlers.dir.display(),
            manifest.handlers.base,
            manifest.handlers.module
        );
        println!(
            "  entities: {} (base {} from {})",
            manifest.entities.dir.display(),
            manifest.entities.base,
            manifest.entities.module
        );
        println!("  extra entries: {}", manifest.extras.len());
        Ok(())
    }
}
