//! Run-scoped dedup state for the closure builder.

use std::collections::HashSet;

use husk_project::SymbolId;

/// Tracks already-processed symbol identities and already-emitted
/// anonymous-type renderings. The two sets are independent: symbols break
/// cycles in the declaration graph, renderings dedup structural aliases
/// that have no symbol to key on.
#[derive(Debug, Default)]
pub struct SymbolLedger {
    processed: HashSet<SymbolId>,
    renderings: HashSet<String>,
}

impl SymbolLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a symbol as processed. Returns `true` the first time.
    pub fn mark_symbol(&mut self, symbol: SymbolId) -> bool {
        self.processed.insert(symbol)
    }

    pub fn symbol_seen(&self, symbol: &SymbolId) -> bool {
        self.processed.contains(symbol)
    }

    /// Mark an anonymous rendering as emitted. Returns `true` the first
    /// time.
    pub fn mark_rendering(&mut self, rendering: &str) -> bool {
        self.renderings.insert(rendering.to_string())
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }
}
