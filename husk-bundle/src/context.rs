//! Per-run engine state.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

use husk_project::UnitId;
use husk_syntax::{Declaration, Span};

use crate::ledger::SymbolLedger;

/// A declaration's provenance: originating unit path plus parse-time byte
/// span. This is the at-most-once emission key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProvenanceKey {
    pub path: PathBuf,
    pub span: Span,
}

/// All state owned by one bundling run. Nothing here is process-global, so
/// concurrent runs (a test suite, say) cannot interfere with each other.
#[derive(Debug, Default)]
pub struct BundleContext {
    pub ledger: SymbolLedger,
    /// Units contributing at least one retained declaration, in discovery
    /// order; this is the serialization order of the output.
    pub tracked: IndexSet<UnitId>,
    /// Declarations inlined by entry extraction or closure building.
    pub retained: IndexSet<ProvenanceKey>,
    /// Seed whitelists: names each entry/extra unit must keep exporting.
    pub entry_exports: IndexMap<UnitId, Vec<String>>,
    /// Synthesized alias declarations, serialized after all project units.
    pub aliases: Vec<Declaration>,
}

impl BundleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, unit: UnitId) {
        self.tracked.insert(unit);
    }

    /// Record a declaration as retained. Returns `true` the first time
    /// this provenance is seen.
    pub fn retain(&mut self, key: ProvenanceKey) -> bool {
        self.retained.insert(key)
    }

    pub fn is_retained(&self, key: &ProvenanceKey) -> bool {
        self.retained.contains(key)
    }

    pub fn add_entry_export(&mut self, unit: UnitId, name: impl Into<String>) {
        self.entry_exports.entry(unit).or_default().push(name.into());
    }
}
