//! Export pruner + fixpoint cleaner.
//!
//! Two nested "repeat until stable" loops, kept as separate functions so
//! each termination argument stays simple:
//!
//! - the outer pass rebuilds the load graph over the tracked units,
//!   recomputes every unit's export whitelist from what its importers
//!   actually consume, un-exports everything else, and re-runs the inner
//!   cleaner; it repeats until a full pass changes no unit's rendered
//!   text;
//! - the inner cleaner deletes statements of one unit that are neither
//!   exported nor referenced from a surviving statement of the same unit,
//!   and drops import names nothing references, until no deletion occurs.
//!
//! Both loops only ever shrink export and statement sets, which is the
//! whole termination argument. Deleting one unused export can cascade
//! dead code through an arbitrary chain of units; only the outer global
//! fixpoint catches the tail.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tracing::debug;

use husk_project::{ProjectIndex, UnitId};
use husk_syntax::{render_unit, SourceUnit, Statement, TypeExpr};

use crate::context::BundleContext;

/// Result of the outer fixpoint: passes taken plus the final load-graph
/// units, in discovery order. The assembler serializes exactly these.
#[derive(Debug)]
pub struct PruneOutcome {
    pub passes: usize,
    pub units: IndexSet<UnitId>,
}

/// Run outer passes until a full pass leaves every unit's rendered text
/// unchanged.
pub fn prune_to_fixpoint(index: &mut ProjectIndex, ctx: &BundleContext) -> PruneOutcome {
    let mut passes = 0;
    loop {
        passes += 1;
        let universe = load_graph(index, ctx);
        let whitelists = compute_whitelists(index, ctx, &universe);
        let mut changed = false;

        for &unit in &universe {
            let before = render_unit(index.unit(unit));
            let whitelist = whitelists.get(&unit);
            apply_whitelist(index.unit_mut(unit), whitelist);
            clean_unit(index.unit_mut(unit));
            if render_unit(index.unit(unit)) != before {
                changed = true;
            }
        }

        debug!(passes, changed, units = universe.len(), "export pruning pass");
        if !changed {
            return PruneOutcome { passes, units: universe };
        }
    }
}

/// The load graph: every unit reachable from the tracked units over the
/// currently surviving relative import and re-export edges. Rebuilt from
/// scratch at the start of every outer iteration, so edges deleted by the
/// previous pass stop contributing.
fn load_graph(index: &ProjectIndex, ctx: &BundleContext) -> IndexSet<UnitId> {
    let mut universe: IndexSet<UnitId> = ctx.tracked.iter().copied().collect();
    let mut cursor = 0;
    while cursor < universe.len() {
        let unit = universe[cursor];
        cursor += 1;
        for stmt in &index.unit(unit).statements {
            let specifier = match stmt {
                Statement::Import(import) => Some(&import.specifier),
                Statement::Export(export) => export.specifier.as_ref(),
                Statement::Decl(_) => None,
            };
            let Some(specifier) = specifier else { continue };
            if let Some(target) = index
                .resolve_specifier(unit, specifier)
                .and_then(|path| index.id_of(&path))
            {
                universe.insert(target);
            }
        }
    }
    universe
}

/// Compute every unit's whitelist: the names its importers in the load
/// graph actually consume, plus the entry/extra seeds.
fn compute_whitelists(
    index: &ProjectIndex,
    ctx: &BundleContext,
    universe: &IndexSet<UnitId>,
) -> HashMap<UnitId, IndexSet<String>> {
    let mut whitelists: HashMap<UnitId, IndexSet<String>> = HashMap::new();

    for (unit, names) in &ctx.entry_exports {
        whitelists
            .entry(*unit)
            .or_default()
            .extend(names.iter().cloned());
    }

    for &importer in universe {
        let used = referenced_names(index.unit(importer));
        for stmt in &index.unit(importer).statements {
            match stmt {
                Statement::Import(import) => {
                    let Some(target) = index
                        .resolve_specifier(importer, &import.specifier)
                        .and_then(|path| index.id_of(&path))
                    else {
                        continue;
                    };
                    for name in &import.names {
                        if used.contains(name.local()) {
                            whitelists
                                .entry(target)
                                .or_default()
                                .insert(name.name.clone());
                        }
                    }
                }
                Statement::Export(export) => {
                    let Some(specifier) = &export.specifier else {
                        continue;
                    };
                    let Some(target) = index
                        .resolve_specifier(importer, specifier)
                        .and_then(|path| index.id_of(&path))
                    else {
                        continue;
                    };
                    // A surviving re-export consumes its source names; if
                    // this pass prunes it, the next recomputation sees the
                    // shrunken list. That is the cascade.
                    for name in &export.names {
                        whitelists
                            .entry(target)
                            .or_default()
                            .insert(name.name.clone());
                    }
                }
                Statement::Decl(_) => {}
            }
        }
    }

    whitelists
}

/// Un-export local declarations not in the whitelist and trim named
/// re-exports down to it.
fn apply_whitelist(unit: &mut SourceUnit, whitelist: Option<&IndexSet<String>>) {
    let keep = |name: &str| whitelist.is_some_and(|w| w.contains(name));
    for stmt in &mut unit.statements {
        match stmt {
            Statement::Decl(decl) => {
                if decl.is_exported() && !keep(&decl.name) {
                    decl.set_exported(false);
                }
            }
            Statement::Export(export) => {
                export.names.retain(|name| keep(name.exposed()));
            }
            Statement::Import(_) => {}
        }
    }
}

/// Inner fixpoint: delete now-dead statements of one unit until stable.
fn clean_unit(unit: &mut SourceUnit) {
    loop {
        let mut removed = false;

        // Names each declaration statement references, by statement.
        let per_stmt: Vec<(usize, HashSet<String>)> = unit
            .statements
            .iter()
            .enumerate()
            .filter_map(|(i, stmt)| {
                stmt.as_decl().map(|decl| {
                    let mut names = HashSet::new();
                    decl.for_each_type(&mut |expr| {
                        if let TypeExpr::Name(n) | TypeExpr::TypeOf(n) = expr {
                            names.insert(n.head().to_string());
                        }
                    });
                    (i, names)
                })
            })
            .collect();
        // Names kept alive by bare export lists.
        let bare_exports: HashSet<String> = unit
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Statement::Export(e) if e.specifier.is_none() => Some(e.names.clone()),
                _ => None,
            })
            .flatten()
            .map(|name| name.name)
            .collect();

        let live = |idx: usize, name: &str| {
            bare_exports.contains(name)
                || per_stmt
                    .iter()
                    .any(|(other, names)| *other != idx && names.contains(name))
        };

        let mut surviving = Vec::with_capacity(unit.statements.len());
        for (idx, stmt) in unit.statements.drain(..).enumerate() {
            match stmt {
                Statement::Decl(decl) => {
                    if decl.is_exported() || live(idx, &decl.name) {
                        surviving.push(Statement::Decl(decl));
                    } else {
                        removed = true;
                    }
                }
                Statement::Export(export) => {
                    if export.names.is_empty() {
                        removed = true;
                    } else {
                        surviving.push(Statement::Export(export));
                    }
                }
                Statement::Import(mut import) => {
                    let used: HashSet<&String> = per_stmt
                        .iter()
                        .flat_map(|(_, names)| names.iter())
                        .collect();
                    let before = import.names.len();
                    import
                        .names
                        .retain(|name| used.contains(&name.local().to_string()));
                    if import.names.len() != before {
                        removed = true;
                    }
                    if !import.names.is_empty() {
                        surviving.push(Statement::Import(import));
                    } else {
                        removed = true;
                    }
                }
            }
        }
        unit.statements = surviving;

        if !removed {
            return;
        }
    }
}

/// Names referenced from any declaration statement of the unit.
fn referenced_names(unit: &SourceUnit) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in &unit.statements {
        if let Statement::Decl(decl) = stmt {
            decl.for_each_type(&mut |expr| {
                if let TypeExpr::Name(n) | TypeExpr::TypeOf(n) = expr {
                    names.insert(n.head().to_string());
                }
            });
        }
    }
    names
}
