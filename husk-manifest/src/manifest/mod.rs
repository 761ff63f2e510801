//! Manifest types and parsing for husk.toml files.

mod file;
mod parse;
mod validate;

use std::path::PathBuf;

pub use file::HuskToml;
use serde::Deserialize;

/// Root manifest for husk.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Source root and output location.
    pub project: ProjectConfig,

    /// Where handler classes live and what framework base anchors them.
    pub handlers: SurfaceConfig,

    /// Where persisted-entity classes live and their base anchor.
    pub entities: SurfaceConfig,

    /// Extra (file, names) pairs to expose verbatim: named constants and
    /// enumerations outside the handler/entity surface.
    #[serde(default, rename = "extra")]
    pub extras: Vec<ExtraConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Source root, relative to the manifest's directory.
    pub root: PathBuf,

    /// Output path of the bundled declaration document, relative to the
    /// manifest's directory.
    pub output: PathBuf,
}

/// One extraction surface: a directory of entry classes plus the
/// framework base type their ancestor chains must reach.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Directory scanned for entry files, relative to the source root.
    pub dir: PathBuf,

    /// Exported name of the framework base type.
    pub base: String,

    /// Module specifier the base type is imported from.
    pub module: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtraConfig {
    /// Source file, relative to the source root.
    pub file: PathBuf,

    /// Exported names to bundle from that file.
    pub names: Vec<String>,
}
