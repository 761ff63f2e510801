//! The parsed-project abstraction the bundling engine operates on.
//!
//! [`ProjectIndex`] owns every loaded source unit for one run. Resolution
//! is exposed through the [`TypeOracle`] trait (resolve a reference to a
//! type, a type to its symbol, a symbol to its originating declarations),
//! so the engine can be driven by a hand-built project in tests. The
//! production implementation, [`ProjectOracle`], does pure name
//! resolution over import and re-export edges; it never compares types.

mod error;
mod index;
mod oracle;
mod resolve;

pub use error::{Error, Result};
pub use index::{ProjectIndex, UnitId};
pub use oracle::{DeclSite, SiteKind, SymbolId, TypeHandle, TypeOracle};
pub use resolve::ProjectOracle;
