//! Output assembler: the final serialization pass.
//!
//! Imports and re-exports are dropped (cross-file edges are meaningless
//! once the closure is inlined into one document), every surviving
//! declaration is promoted to exported, and unit blocks are concatenated
//! in discovery order under a path header. Emission is deduplicated by
//! (path, start, end) provenance, since entry extraction and closure
//! building can both schedule the same declaration. Sibling order within
//! a unit is preserved.

use std::collections::HashSet;

use indexmap::IndexSet;

use husk_core::header_path;
use husk_project::{ProjectIndex, UnitId};
use husk_syntax::{render_declaration, DeclarationKind, Modifiers, Statement};

use crate::context::{BundleContext, ProvenanceKey};

/// Header of the synthetic unit owning the synthesized aliases.
const ALIAS_HEADER: &str = "// <aliases>";

/// The serialized declaration document plus a few counters for reporting.
#[derive(Debug)]
pub struct BundleOutput {
    pub buffer: Vec<u8>,
    pub units: usize,
    pub declarations: usize,
}

pub fn assemble(
    index: &mut ProjectIndex,
    ctx: &mut BundleContext,
    units: &IndexSet<UnitId>,
) -> BundleOutput {
    let root = index.root().to_owned();
    let mut seen: HashSet<ProvenanceKey> = HashSet::new();
    let mut out = String::new();
    let mut unit_count = 0;
    let mut decl_count = 0;

    for &unit in units {
        let path = index.path(unit).to_owned();
        let mut block = String::new();

        for stmt in index.unit_mut(unit).statements.iter_mut() {
            let Statement::Decl(decl) = stmt else {
                continue;
            };
            let key = ProvenanceKey {
                path: path.clone(),
                span: decl.span,
            };
            if !seen.insert(key) {
                continue;
            }
            decl.set_exported(true);
            apply_declare_policy(decl);
            block.push_str(&render_declaration(decl));
            decl_count += 1;
        }

        // A unit pruned down to nothing contributes nothing, not even its
        // header.
        if block.is_empty() {
            continue;
        }
        unit_count += 1;
        out.push_str("// ");
        out.push_str(&header_path(&root, &path));
        out.push('\n');
        out.push_str(&block);
    }

    if !ctx.aliases.is_empty() {
        out.push_str(ALIAS_HEADER);
        out.push('\n');
        for alias in &mut ctx.aliases {
            alias.set_exported(true);
            out.push_str(&render_declaration(alias));
            decl_count += 1;
        }
        unit_count += 1;
    }

    BundleOutput {
        buffer: out.into_bytes(),
        units: unit_count,
        declarations: decl_count,
    }
}

/// The emitted dialect: classes and constants carry `declare`; enums,
/// aliases, and interfaces do not.
fn apply_declare_policy(decl: &mut husk_syntax::Declaration) {
    match decl.kind {
        DeclarationKind::Class(_) | DeclarationKind::Const(_) => {
            decl.modifiers.insert(Modifiers::DECLARE);
        }
        DeclarationKind::Enum(_) | DeclarationKind::Alias(_) | DeclarationKind::Interface(_) => {
            decl.modifiers.remove(Modifiers::DECLARE);
        }
    }
}
