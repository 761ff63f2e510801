//! Manifest types and parsing for `husk.toml` files.

mod error;
mod manifest;

pub use error::{Error, Result, SourceContext};
pub use manifest::{ExtraConfig, HuskToml, Manifest, ProjectConfig, SurfaceConfig};
