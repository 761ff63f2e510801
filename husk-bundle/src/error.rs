use std::path::PathBuf;

use thiserror::Error;

/// Fatal engine errors. Oracle-resolution failures are not here: a
/// reference that resolves to nothing is dropped as ambient, by design.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Configuration error: a required named construct cannot be located
    /// by its configured locator. Nothing is written.
    #[error("cannot locate '{name}' among the declarations of {file}")]
    MissingExtraEntry { file: PathBuf, name: String },

    /// Structural-assumption violation: an explicitly requested entry's
    /// root does not match the expected framework base type.
    #[error(
        "class '{class}' in {unit} does not ultimately extend '{base}' from '{module}'"
    )]
    RootMismatch {
        unit: PathBuf,
        class: String,
        base: String,
        module: String,
    },
}
