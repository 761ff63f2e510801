//! The type-resolution oracle ports.
//!
//! Three ports, mirroring what the engine is handed by its host: resolve a
//! reference node to a type, resolve a type to its symbol, and enumerate a
//! symbol's originating declarations. The engine never sees how resolution
//! works; a test can hand it a fixture implementation over a fabricated
//! graph.

use husk_syntax::{Span, TypeName};

use crate::index::UnitId;

/// Stable identity of a resolved symbol for one run.
///
/// Identity is the originating declaration position, optionally narrowed
/// to a single member. Two references resolving to the same position are
/// the same symbol, which is what makes the ledger a cycle breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId {
    unit: usize,
    stmt: usize,
    member: Option<usize>,
}

impl SymbolId {
    pub fn new(unit: UnitId, stmt: usize, member: Option<usize>) -> Self {
        Self {
            unit: unit.index(),
            stmt,
            member,
        }
    }
}

/// What kind of node a resolution site points at. Member-level sites
/// (enum members, the function type inside an alias) are smaller than what
/// must be reproduced; the accumulator widens them to their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Class,
    Interface,
    Alias,
    Enum,
    Const,
    EnumMember,
    FunctionAlias,
}

/// An originating declaration of a resolved symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclSite {
    pub unit: UnitId,
    pub stmt: usize,
    pub member: Option<usize>,
    pub kind: SiteKind,
    pub span: Span,
}

/// An opaque resolved type: the answer of the resolve-type port, consumed
/// by the resolve-symbol and get-declarations ports.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    symbol: Option<SymbolId>,
    rendering: String,
    sites: Vec<DeclSite>,
}

impl TypeHandle {
    /// A type backed by named declarations.
    pub fn declared(symbol: SymbolId, rendering: impl Into<String>, sites: Vec<DeclSite>) -> Self {
        Self {
            symbol: Some(symbol),
            rendering: rendering.into(),
            sites,
        }
    }

    /// An anonymous/structural type with no symbol, identified only by its
    /// textual rendering.
    pub fn anonymous(rendering: impl Into<String>) -> Self {
        Self {
            symbol: None,
            rendering: rendering.into(),
            sites: Vec::new(),
        }
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    pub fn rendering(&self) -> &str {
        &self.rendering
    }

    pub fn sites(&self) -> &[DeclSite] {
        &self.sites
    }
}

/// The injected type-resolution capability: resolve-type, resolve-symbol,
/// and get-declarations ports.
pub trait TypeOracle {
    /// Resolve a named reference occurring in `from`. `None` means the
    /// name is a runtime built-in, a package type, or unresolvable; the
    /// engine drops those.
    fn resolve_type(&self, from: UnitId, name: &TypeName) -> Option<TypeHandle>;

    /// Resolve a type to its symbol identity, if it has one.
    fn resolve_symbol(&self, handle: &TypeHandle) -> Option<SymbolId> {
        handle.symbol()
    }

    /// The originating declarations behind a type's symbol.
    fn declarations(&self, handle: &TypeHandle) -> Vec<DeclSite> {
        handle.sites().to_vec()
    }
}
