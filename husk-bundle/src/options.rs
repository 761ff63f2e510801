//! Engine inputs, decoupled from the manifest format.

use husk_project::UnitId;

/// Identifies a framework base type: the package module it is imported
/// from plus its exported name, e.g. `("@framework/rpc", "Route")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnchor {
    pub module: String,
    pub name: String,
}

impl TypeAnchor {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

/// One handler or entity source unit designated for extraction.
#[derive(Debug, Clone, Copy)]
pub struct EntryUnit {
    pub unit: UnitId,
    /// Explicitly requested (named in an include filter). A requested
    /// class that fails the root predicate is a fatal error; a scanned one
    /// is skipped silently.
    pub requested: bool,
}

/// Extra (unit, names) pairs to expose verbatim: named constants and
/// enumerations listed in the manifest.
#[derive(Debug, Clone)]
pub struct ExtraEntry {
    pub unit: UnitId,
    pub names: Vec<String>,
}

/// All designated entry points of one run.
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    pub handlers: Vec<EntryUnit>,
    pub entities: Vec<EntryUnit>,
    pub extras: Vec<ExtraEntry>,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub handler_base: TypeAnchor,
    pub entity_base: TypeAnchor,
}
