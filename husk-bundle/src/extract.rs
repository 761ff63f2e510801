//! Entry extractors: handler-contract and entity-contract policies.
//!
//! Both policies share the same skeleton: check the class's ultimate
//! ancestor against the configured framework anchor, merge the relevant
//! members down the ancestor chain (first occurrence by name wins), strip
//! everything that is not contract (bodies, decorators, constructors,
//! heritage), and rewrite the class in place. Member type annotations are
//! queued for the closure builder, each against the unit its member was
//! actually declared in, so inherited signatures resolve through the
//! right imports.

use std::collections::HashSet;

use tracing::debug;

use husk_project::{ProjectIndex, SiteKind, TypeOracle, UnitId};
use husk_syntax::{ClassDecl, Member, Modifiers, TypeExpr, TypeName};

use crate::context::BundleContext;
use crate::error::BundleError;
use crate::options::{EntryUnit, ExtraEntry, TypeAnchor};

/// What extraction hands to the closure builder.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Entry declarations to retain (already shaped in place).
    pub entry_stmts: Vec<(UnitId, usize)>,
    /// Member type references to walk, paired with their declaring unit.
    pub pending: Vec<(UnitId, TypeName)>,
}

pub fn extract_handlers<O: TypeOracle>(
    index: &mut ProjectIndex,
    oracle: &O,
    entries: &[EntryUnit],
    base: &TypeAnchor,
    ctx: &mut BundleContext,
) -> Result<ExtractOutcome, BundleError> {
    extract_classes(index, oracle, entries, base, ctx, MemberPolicy::HandlerMethods)
}

pub fn extract_entities<O: TypeOracle>(
    index: &mut ProjectIndex,
    oracle: &O,
    entries: &[EntryUnit],
    base: &TypeAnchor,
    ctx: &mut BundleContext,
) -> Result<ExtractOutcome, BundleError> {
    extract_classes(index, oracle, entries, base, ctx, MemberPolicy::EntityProperties)
}

/// Locate the explicitly listed extra constants/enums. A missing name is a
/// fatal configuration error.
pub fn extract_extras(
    index: &ProjectIndex,
    extras: &[ExtraEntry],
    ctx: &mut BundleContext,
) -> Result<ExtractOutcome, BundleError> {
    let mut outcome = ExtractOutcome::default();
    for extra in extras {
        for name in &extra.names {
            let Some((stmt, _)) = index.unit(extra.unit).declaration(name) else {
                return Err(BundleError::MissingExtraEntry {
                    file: index.path(extra.unit).to_owned(),
                    name: name.clone(),
                });
            };
            ctx.add_entry_export(extra.unit, name);
            outcome.entry_stmts.push((extra.unit, stmt));
        }
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberPolicy {
    /// Non-private, non-static instance methods; first parameter only;
    /// bodies and decorators stripped.
    HandlerMethods,
    /// Non-private, non-static instance properties with declared types.
    EntityProperties,
}

fn extract_classes<O: TypeOracle>(
    index: &mut ProjectIndex,
    oracle: &O,
    entries: &[EntryUnit],
    base: &TypeAnchor,
    ctx: &mut BundleContext,
    policy: MemberPolicy,
) -> Result<ExtractOutcome, BundleError> {
    let mut outcome = ExtractOutcome::default();

    // Analysis first, rewriting after: rewriting a base class in place
    // would sever the extends chain for subclasses examined later.
    let mut shaped: Vec<(UnitId, usize, Vec<Member>)> = Vec::new();
    for entry in entries {
        let unit = entry.unit;
        let class_stmts: Vec<usize> = index
            .unit(unit)
            .statements
            .iter()
            .enumerate()
            .filter(|(_, stmt)| stmt.as_decl().is_some_and(|d| d.as_class().is_some()))
            .map(|(i, _)| i)
            .collect();

        for stmt in class_stmts {
            let anchor = root_anchor(index, oracle, unit, stmt);
            if anchor.as_ref() != Some(base) {
                let class_name = index.unit(unit).statements[stmt]
                    .as_decl()
                    .map(|d| d.name.clone())
                    .unwrap_or_default();
                if entry.requested {
                    return Err(BundleError::RootMismatch {
                        unit: index.path(unit).to_owned(),
                        class: class_name,
                        base: base.name.clone(),
                        module: base.module.clone(),
                    });
                }
                debug!(class = %class_name, "root predicate failed, skipping");
                continue;
            }

            let merged = merge_members(index, oracle, unit, stmt, policy, &mut outcome.pending);
            shaped.push((unit, stmt, merged));
        }
    }

    for (unit, stmt, merged) in shaped {
        let decl = index.unit_mut(unit).statements[stmt]
            .as_decl_mut()
            .expect("class statement");
        let name = decl.name.clone();
        decl.decorators.clear();
        decl.set_exported(true);
        decl.modifiers.remove(Modifiers::ABSTRACT);
        let class = decl.as_class_mut().expect("class declaration");
        class.extends = None;
        class.implements.clear();
        class.members = merged;

        ctx.add_entry_export(unit, name);
        outcome.entry_stmts.push((unit, stmt));
    }
    Ok(outcome)
}

/// Merge contract members down the ancestor chain, subclass first; the
/// first occurrence of a name wins and duplicates are dropped.
fn merge_members<O: TypeOracle>(
    index: &ProjectIndex,
    oracle: &O,
    unit: UnitId,
    stmt: usize,
    policy: MemberPolicy,
    pending: &mut Vec<(UnitId, TypeName)>,
) -> Vec<Member> {
    let mut merged = Vec::new();
    let mut seen = HashSet::new();
    let mut visited = HashSet::new();
    let mut cursor = Some((unit, stmt));

    while let Some((u, s)) = cursor {
        if !visited.insert((u.index(), s)) {
            break;
        }
        let Some(class) = index.unit(u).statements[s].as_decl().and_then(|d| d.as_class())
        else {
            break;
        };
        for member in &class.members {
            match (policy, member) {
                (MemberPolicy::HandlerMethods, Member::Method(method)) => {
                    if method.modifiers.is_hidden()
                        || method.modifiers.intersects(
                            Modifiers::STATIC | Modifiers::GETTER | Modifiers::SETTER,
                        )
                    {
                        continue;
                    }
                    if !seen.insert(method.name.clone()) {
                        continue;
                    }
                    let mut kept = method.clone();
                    kept.decorators.clear();
                    kept.modifiers = Modifiers::empty();
                    kept.has_body = false;
                    kept.params.truncate(1);
                    if let Some(param) = kept.params.first_mut() {
                        param.decorators.clear();
                        param.modifiers = Modifiers::empty();
                    }
                    queue_member_types(&Member::Method(kept.clone()), u, pending);
                    merged.push(Member::Method(kept));
                }
                (MemberPolicy::EntityProperties, Member::Property(property)) => {
                    if property.modifiers.is_hidden()
                        || property.modifiers.contains(Modifiers::STATIC)
                        || property.type_ann.is_none()
                    {
                        continue;
                    }
                    if !seen.insert(property.name.clone()) {
                        continue;
                    }
                    let mut kept = property.clone();
                    kept.decorators.clear();
                    kept.modifiers &= Modifiers::READONLY;
                    queue_member_types(&Member::Property(kept.clone()), u, pending);
                    merged.push(Member::Property(kept));
                }
                _ => {}
            }
        }
        cursor = parent_class_site(index, oracle, u, s);
    }
    merged
}

fn queue_member_types(member: &Member, unit: UnitId, pending: &mut Vec<(UnitId, TypeName)>) {
    member.for_each_type(&mut |expr| match expr {
        TypeExpr::Name(name) | TypeExpr::TypeOf(name) => pending.push((unit, name.clone())),
        _ => {}
    });
}

/// Walk the `extends` chain to its ultimate ancestor and return the
/// package anchor it is imported from, if any. Malformed cyclic chains
/// abort the walk instead of hanging the run.
fn root_anchor<O: TypeOracle>(
    index: &ProjectIndex,
    oracle: &O,
    unit: UnitId,
    stmt: usize,
) -> Option<TypeAnchor> {
    let mut visited = HashSet::new();
    let mut cursor = (unit, stmt);
    loop {
        if !visited.insert((cursor.0.index(), cursor.1)) {
            return None;
        }
        let class = index
            .unit(cursor.0)
            .statements
            .get(cursor.1)?
            .as_decl()?
            .as_class()?;
        let parent = extends_name(class)?;

        match project_parent_site(oracle, cursor.0, &parent) {
            Some(next) => cursor = next,
            None => return import_anchor(index, cursor.0, &parent),
        }
    }
}

/// One step up the chain, staying inside the project.
fn parent_class_site<O: TypeOracle>(
    index: &ProjectIndex,
    oracle: &O,
    unit: UnitId,
    stmt: usize,
) -> Option<(UnitId, usize)> {
    let class = index.unit(unit).statements.get(stmt)?.as_decl()?.as_class()?;
    let parent = extends_name(class)?;
    project_parent_site(oracle, unit, &parent)
}

fn project_parent_site<O: TypeOracle>(
    oracle: &O,
    unit: UnitId,
    parent: &TypeName,
) -> Option<(UnitId, usize)> {
    let handle = oracle.resolve_type(unit, parent)?;
    oracle
        .declarations(&handle)
        .into_iter()
        .find(|site| site.kind == SiteKind::Class)
        .map(|site| (site.unit, site.stmt))
}

fn extends_name(class: &ClassDecl) -> Option<TypeName> {
    match class.extends.as_ref()? {
        TypeExpr::Name(name) => Some(name.clone()),
        TypeExpr::Paren(inner, _) => match inner.as_ref() {
            TypeExpr::Name(name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// The anchor of a name that resolves outside the project: the import
/// statement binding it, as (module specifier, exported name).
fn import_anchor(index: &ProjectIndex, unit: UnitId, name: &TypeName) -> Option<TypeAnchor> {
    let head = name.head();
    for stmt in &index.unit(unit).statements {
        if let husk_syntax::Statement::Import(import) = stmt {
            for imported in &import.names {
                if imported.local() == head {
                    return Some(TypeAnchor::new(import.specifier.clone(), &imported.name));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use husk_project::ProjectOracle;

    use super::*;

    const FRAMEWORK: &str = "@framework/rpc";
    const ORM: &str = "@framework/orm";

    fn project(sources: &[(&str, &str)]) -> ProjectIndex {
        let mut index = ProjectIndex::new("/proj/src");
        for (path, source) in sources {
            index.add_source(format!("/proj/src/{path}"), source).unwrap();
        }
        index
    }

    fn entry(index: &ProjectIndex, path: &str, requested: bool) -> EntryUnit {
        EntryUnit {
            unit: index
                .id_of(std::path::Path::new(&format!("/proj/src/{path}")))
                .unwrap(),
            requested,
        }
    }

    #[test]
    fn test_handler_merges_ancestor_methods_first_param_only() {
        let mut index = project(&[
            (
                "base.ts",
                "import {Route} from '@framework/rpc';\nimport {A, B} from './types';\nexport class BaseHandler extends Route {\n  foo(req: A): B { return this.render(req); }\n}\n",
            ),
            (
                "auth.ts",
                "import {BaseHandler} from './base';\nimport {C, D} from './types';\nexport class AuthHandler extends BaseHandler {\n  bar(req: C, extra: number): D { return this.run(req); }\n}\n",
            ),
            (
                "types.ts",
                "export interface A {}\nexport interface B {}\nexport interface C {}\nexport interface D {}\n",
            ),
        ]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "auth.ts", false)];

        let outcome = extract_handlers(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(FRAMEWORK, "Route"),
            &mut ctx,
        )
        .unwrap();

        assert_eq!(outcome.entry_stmts.len(), 1);
        let (unit, stmt) = outcome.entry_stmts[0];
        let class = index.unit(unit).statements[stmt]
            .as_decl()
            .unwrap()
            .as_class()
            .unwrap();
        assert!(class.extends.is_none());
        assert_eq!(class.members.len(), 2);

        let Member::Method(bar) = &class.members[0] else {
            panic!("expected subclass method first");
        };
        assert_eq!(bar.name, "bar");
        assert_eq!(bar.params.len(), 1, "second source parameter must not appear");
        assert!(!bar.has_body);

        let Member::Method(foo) = &class.members[1] else {
            panic!("expected merged ancestor method");
        };
        assert_eq!(foo.name, "foo");

        // Ancestor member types are queued against the ancestor's unit.
        let base_unit = index.id_of(std::path::Path::new("/proj/src/base.ts")).unwrap();
        assert!(outcome
            .pending
            .iter()
            .any(|(u, n)| *u == base_unit && n.head() == "A"));
    }

    #[test]
    fn test_subclass_override_wins_over_ancestor() {
        let mut index = project(&[(
            "h.ts",
            "import {Route} from '@framework/rpc';\nexport class Base extends Route {\n  ping(req: string): number;\n}\nexport class H extends Base {\n  ping(req: number): boolean;\n}\n",
        )]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "h.ts", false)];

        extract_handlers(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(FRAMEWORK, "Route"),
            &mut ctx,
        )
        .unwrap();

        let unit = index.id_of(std::path::Path::new("/proj/src/h.ts")).unwrap();
        let class = index.unit(unit).statements[2]
            .as_decl()
            .unwrap()
            .as_class()
            .unwrap();
        let methods: Vec<_> = class
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Method(method) => Some(method),
                _ => None,
            })
            .collect();
        assert_eq!(methods.len(), 1);
        let Some(TypeExpr::Keyword(keyword, _)) = methods[0].params[0].type_ann.as_ref() else {
            panic!("expected keyword param type");
        };
        assert_eq!(keyword.as_str(), "number");
    }

    #[test]
    fn test_requested_entry_with_wrong_root_is_fatal() {
        let mut index = project(&[(
            "stray.ts",
            "export class Stray {\n  run(req: string): void;\n}\n",
        )]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "stray.ts", true)];

        let err = extract_handlers(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(FRAMEWORK, "Route"),
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::RootMismatch { .. }));
    }

    #[test]
    fn test_scanned_entry_with_wrong_root_is_skipped() {
        let mut index = project(&[(
            "stray.ts",
            "export class Stray {\n  run(req: string): void;\n}\n",
        )]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "stray.ts", false)];

        let outcome = extract_handlers(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(FRAMEWORK, "Route"),
            &mut ctx,
        )
        .unwrap();
        assert!(outcome.entry_stmts.is_empty());
    }

    #[test]
    fn test_entity_keeps_typed_instance_properties_only() {
        let mut index = project(&[(
            "account.ts",
            "import {BaseModel} from '@framework/orm';\n@Entity('accounts')\nexport class Account extends BaseModel {\n  @Column()\n  nickname: string;\n  untyped = 3;\n  private secret: string;\n  static table: string;\n  save(): void { this.flush(); }\n}\n",
        )]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "account.ts", false)];

        extract_entities(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(ORM, "BaseModel"),
            &mut ctx,
        )
        .unwrap();

        let unit = index.id_of(std::path::Path::new("/proj/src/account.ts")).unwrap();
        let decl = index.unit(unit).statements[1].as_decl().unwrap();
        assert!(decl.decorators.is_empty());
        let class = decl.as_class().unwrap();
        assert_eq!(class.members.len(), 1);
        let Member::Property(nickname) = &class.members[0] else {
            panic!("expected property");
        };
        assert_eq!(nickname.name, "nickname");
        assert!(nickname.decorators.is_empty());
    }

    #[test]
    fn test_cyclic_extends_chain_does_not_hang() {
        let mut index = project(&[(
            "cycle.ts",
            "export class A extends B {\n  x: string;\n}\nexport class B extends A {\n  y: string;\n}\n",
        )]);
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let entries = [entry(&index, "cycle.ts", false)];

        let outcome = extract_handlers(
            &mut index,
            &oracle,
            &entries,
            &TypeAnchor::new(FRAMEWORK, "Route"),
            &mut ctx,
        )
        .unwrap();
        assert!(outcome.entry_stmts.is_empty());
    }

    #[test]
    fn test_missing_extra_entry_is_configuration_error() {
        let index = project(&[("names.ts", "export enum ServiceName {\n  Auth = 'auth',\n}\n")]);
        let unit = index.id_of(std::path::Path::new("/proj/src/names.ts")).unwrap();
        let mut ctx = BundleContext::new();

        let err = extract_extras(
            &index,
            &[ExtraEntry {
                unit,
                names: vec!["WorkerName".to_string()],
            }],
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::MissingExtraEntry { .. }));
    }
}
