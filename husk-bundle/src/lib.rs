//! The declaration-bundling engine.
//!
//! Given entry units (handler classes, entity classes, explicitly listed
//! constants/enums), the engine computes the minimal self-contained
//! type-declaration surface reachable from them and serializes it into one
//! document:
//!
//! 1. Entry extraction shapes handler/entity contracts in place.
//! 2. The closure builder walks type references outward through the
//!    injected oracle, inlining every reachable declaration once.
//! 3. The export pruner shrinks every contributing unit's export surface
//!    to its whitelist and deletes dead statements, to a global fixpoint.
//! 4. The assembler strips imports, promotes survivors to exported, and
//!    concatenates unit blocks with provenance-keyed deduplication.
//!
//! Single-threaded and synchronous by design: every phase completes before
//! the next starts, and the whole working set stays in memory. All run
//! state lives in a per-run [`BundleContext`], so concurrent runs in one
//! process cannot interfere.

mod assemble;
mod closure;
mod context;
mod error;
mod extract;
mod ledger;
mod options;
mod prune;

pub use assemble::BundleOutput;
pub use context::{BundleContext, ProvenanceKey};
pub use error::BundleError;
pub use ledger::SymbolLedger;
pub use options::{BundleOptions, EntrySet, EntryUnit, ExtraEntry, TypeAnchor};

use husk_project::{ProjectIndex, TypeOracle};
use tracing::{debug, info};

/// Run the whole pipeline over an already-loaded project.
///
/// The index must contain the entry units and everything reachable from
/// them through relative imports; the oracle must have been built over
/// that same index (or be a test fixture). On success the returned output
/// owns the serialized declaration document.
pub fn bundle<O: TypeOracle>(
    index: &mut ProjectIndex,
    oracle: &O,
    entries: &EntrySet,
    options: &BundleOptions,
) -> Result<BundleOutput, BundleError> {
    let mut ctx = BundleContext::new();

    let handlers = extract::extract_handlers(
        index,
        oracle,
        &entries.handlers,
        &options.handler_base,
        &mut ctx,
    )?;
    let entities = extract::extract_entities(
        index,
        oracle,
        &entries.entities,
        &options.entity_base,
        &mut ctx,
    )?;
    let extras = extract::extract_extras(index, &entries.extras, &mut ctx)?;
    debug!(
        handlers = handlers.entry_stmts.len(),
        entities = entities.entry_stmts.len(),
        extras = extras.entry_stmts.len(),
        "entry extraction complete"
    );

    {
        let mut builder = closure::ClosureBuilder::new(index, oracle, &mut ctx);
        for &(unit, stmt) in handlers
            .entry_stmts
            .iter()
            .chain(entities.entry_stmts.iter())
        {
            builder.retain_entry(unit, stmt);
        }
        for (unit, name) in handlers.pending.iter().chain(entities.pending.iter()) {
            builder.reference_without_site(*unit, name);
        }
        for &(unit, stmt) in &extras.entry_stmts {
            builder.schedule_statement(unit, stmt);
        }
        builder.run();
    }
    debug!(
        retained = ctx.retained.len(),
        units = ctx.tracked.len(),
        aliases = ctx.aliases.len(),
        "closure complete"
    );

    let pruned = prune::prune_to_fixpoint(index, &ctx);
    debug!(passes = pruned.passes, "export pruning reached fixpoint");

    let output = assemble::assemble(index, &mut ctx, &pruned.units);
    info!(
        units = output.units,
        declarations = output.declarations,
        bytes = output.buffer.len(),
        "declaration surface assembled"
    );
    Ok(output)
}
