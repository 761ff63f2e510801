//! Production oracle: name resolution over the project index.
//!
//! Resolution is snapshotted from the index when the oracle is built, so
//! the engine can keep mutating units (extraction, substitution, pruning)
//! while holding the oracle. Snapshotting is safe because the bundler
//! never renames or reorders declarations, it only rewrites their
//! internals and, after the closure is complete, deletes statements.

use std::collections::{HashMap, HashSet};

use husk_syntax::{DeclarationKind, Span, Statement, TypeExpr, TypeName};
use tracing::trace;

use crate::index::{ProjectIndex, UnitId};
use crate::oracle::{DeclSite, SiteKind, SymbolId, TypeHandle, TypeOracle};

/// Runtime and utility types that never resolve into the project. The
/// engine drops references to these as ambient.
const BUILTINS: &[&str] = &[
    "Promise", "Date", "Array", "ReadonlyArray", "Map", "Set", "WeakMap", "WeakSet", "Record",
    "Partial", "Required", "Readonly", "Pick", "Omit", "Exclude", "Extract", "NonNullable",
    "Parameters", "ReturnType", "InstanceType", "Awaited", "Error", "Buffer", "Function",
    "Symbol", "RegExp", "ArrayBuffer", "Uint8Array", "Iterable", "Iterator", "AsyncIterable",
];

#[derive(Debug, Clone)]
struct LocalDecl {
    stmt: usize,
    kind: SiteKind,
    span: Span,
    /// Enum member names and spans, for qualified references.
    members: Vec<(String, Span)>,
}

#[derive(Debug, Clone)]
enum ExportTarget {
    /// `export {A as B};` exposes B backed by local (or imported) A.
    Binding(String),
    /// `export {A} from './x';` exposes A re-exported from a unit.
    From(Option<usize>, String),
}

#[derive(Debug, Default)]
struct UnitTable {
    locals: HashMap<String, LocalDecl>,
    /// local binding -> (target unit, exported name); `None` target means
    /// a package import or a missing file.
    imports: HashMap<String, (Option<usize>, String)>,
    exports: HashMap<String, ExportTarget>,
}

/// Name-resolution oracle over a snapshot of the project's import graph.
#[derive(Debug)]
pub struct ProjectOracle {
    tables: Vec<UnitTable>,
}

impl ProjectOracle {
    pub fn build(index: &ProjectIndex) -> Self {
        let mut tables = Vec::with_capacity(index.len());
        for id in index.ids() {
            let mut table = UnitTable::default();
            for (stmt_idx, stmt) in index.unit(id).statements.iter().enumerate() {
                match stmt {
                    Statement::Decl(decl) => {
                        let kind = site_kind(&decl.kind);
                        let members = match &decl.kind {
                            DeclarationKind::Enum(e) => e
                                .members
                                .iter()
                                .map(|m| (m.name.clone(), m.span))
                                .collect(),
                            _ => Vec::new(),
                        };
                        table.locals.insert(
                            decl.name.clone(),
                            LocalDecl {
                                stmt: stmt_idx,
                                kind,
                                span: decl.span,
                                members,
                            },
                        );
                    }
                    Statement::Import(import) => {
                        let target = index
                            .resolve_specifier(id, &import.specifier)
                            .and_then(|path| index.id_of(&path))
                            .map(UnitId::index);
                        for name in &import.names {
                            table
                                .imports
                                .insert(name.local().to_string(), (target, name.name.clone()));
                        }
                    }
                    Statement::Export(export) => match &export.specifier {
                        Some(specifier) => {
                            let target = index
                                .resolve_specifier(id, specifier)
                                .and_then(|path| index.id_of(&path))
                                .map(UnitId::index);
                            for name in &export.names {
                                table.exports.insert(
                                    name.exposed().to_string(),
                                    ExportTarget::From(target, name.name.clone()),
                                );
                            }
                        }
                        None => {
                            for name in &export.names {
                                table.exports.insert(
                                    name.exposed().to_string(),
                                    ExportTarget::Binding(name.name.clone()),
                                );
                            }
                        }
                    },
                }
            }
            tables.push(table);
        }
        Self { tables }
    }

    /// Find the declaration backing `name` exposed by unit `unit`,
    /// following re-export and import chains. The visited set guards
    /// against malformed circular re-exports.
    fn lookup_exposed(
        &self,
        unit: usize,
        name: &str,
        visited: &mut HashSet<(usize, String)>,
    ) -> Option<(usize, LocalDecl)> {
        if !visited.insert((unit, name.to_string())) {
            return None;
        }
        let table = self.tables.get(unit)?;
        if let Some(local) = table.locals.get(name) {
            return Some((unit, local.clone()));
        }
        match table.exports.get(name) {
            Some(ExportTarget::Binding(binding)) => {
                if let Some(local) = table.locals.get(binding) {
                    return Some((unit, local.clone()));
                }
                let (target, exported) = table.imports.get(binding)?;
                self.lookup_exposed((*target)?, exported, visited)
            }
            Some(ExportTarget::From(target, source)) => {
                self.lookup_exposed((*target)?, source, visited)
            }
            None => {
                // `import {X} from ...; export {X};` chains land here when
                // the bare export was pruned into oblivion but imports
                // remain, and for plain imported bindings.
                let (target, exported) = table.imports.get(name)?;
                self.lookup_exposed((*target)?, exported, visited)
            }
        }
    }

    fn handle_for(&self, unit: usize, local: LocalDecl, name: &TypeName) -> Option<TypeHandle> {
        if name.is_qualified() {
            // Qualified references only make sense into enums
            // (`ServiceName.Auth`); anything else is ambient.
            if local.kind != SiteKind::Enum || name.segments.len() != 2 {
                return None;
            }
            let member_name = &name.segments[1];
            let (member_idx, member_span) = local
                .members
                .iter()
                .enumerate()
                .find(|(_, (n, _))| n == member_name)
                .map(|(i, (_, span))| (i, *span))?;
            let symbol = SymbolId::new(UnitId::from_index(unit), local.stmt, Some(member_idx));
            let site = DeclSite {
                unit: UnitId::from_index(unit),
                stmt: local.stmt,
                member: Some(member_idx),
                kind: SiteKind::EnumMember,
                span: member_span,
            };
            return Some(TypeHandle::declared(symbol, name.qualified(), vec![site]));
        }

        let symbol = SymbolId::new(UnitId::from_index(unit), local.stmt, None);
        let site = DeclSite {
            unit: UnitId::from_index(unit),
            stmt: local.stmt,
            member: None,
            kind: local.kind,
            span: local.span,
        };
        Some(TypeHandle::declared(symbol, name.qualified(), vec![site]))
    }
}

impl TypeOracle for ProjectOracle {
    fn resolve_type(&self, from: UnitId, name: &TypeName) -> Option<TypeHandle> {
        let head = name.head();
        if BUILTINS.contains(&head) {
            return None;
        }
        let table = self.tables.get(from.index())?;

        if let Some(local) = table.locals.get(head) {
            return self.handle_for(from.index(), local.clone(), name);
        }
        if let Some((target, exported)) = table.imports.get(head) {
            let target = (*target)?;
            let mut visited = HashSet::new();
            let (unit, local) = self.lookup_exposed(target, exported, &mut visited)?;
            return self.handle_for(unit, local, name);
        }
        trace!(name = %name.qualified(), "unresolved reference treated as ambient");
        None
    }
}

fn site_kind(kind: &DeclarationKind) -> SiteKind {
    match kind {
        DeclarationKind::Class(_) => SiteKind::Class,
        DeclarationKind::Interface(_) => SiteKind::Interface,
        DeclarationKind::Enum(_) => SiteKind::Enum,
        DeclarationKind::Alias(alias) => {
            if is_function_type(&alias.value) {
                SiteKind::FunctionAlias
            } else {
                SiteKind::Alias
            }
        }
        DeclarationKind::Const(_) => SiteKind::Const,
    }
}

fn is_function_type(expr: &TypeExpr) -> bool {
    match expr {
        TypeExpr::Function(_) => true,
        TypeExpr::Paren(inner, _) => is_function_type(inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(text: &str) -> TypeName {
        let segments = text.split('.').map(str::to_string).collect();
        TypeName::new(segments, Span::default())
    }

    fn project(sources: &[(&str, &str)]) -> (ProjectIndex, ProjectOracle) {
        let mut index = ProjectIndex::new("/proj/src");
        for (path, source) in sources {
            index.add_source(format!("/proj/src/{path}"), source).unwrap();
        }
        let oracle = ProjectOracle::build(&index);
        (index, oracle)
    }

    #[test]
    fn test_resolve_local_declaration() {
        let (index, oracle) = project(&[(
            "a.ts",
            "export interface LoginReq {\n  username: string;\n}\n",
        )]);
        let id = index.id_of(std::path::Path::new("/proj/src/a.ts")).unwrap();
        let handle = oracle.resolve_type(id, &reference("LoginReq")).unwrap();
        assert!(oracle.resolve_symbol(&handle).is_some());
        assert_eq!(oracle.declarations(&handle)[0].kind, SiteKind::Interface);
    }

    #[test]
    fn test_resolve_through_import() {
        let (index, oracle) = project(&[
            ("types.ts", "export class UserInfo {\n  id: number;\n}\n"),
            (
                "handler.ts",
                "import {UserInfo} from './types';\nexport class H {\n  get(id: number): UserInfo;\n}\n",
            ),
        ]);
        let handler = index.id_of(std::path::Path::new("/proj/src/handler.ts")).unwrap();
        let types = index.id_of(std::path::Path::new("/proj/src/types.ts")).unwrap();

        let handle = oracle.resolve_type(handler, &reference("UserInfo")).unwrap();
        let site = &oracle.declarations(&handle)[0];
        assert_eq!(site.unit, types);
        assert_eq!(site.kind, SiteKind::Class);
    }

    #[test]
    fn test_resolve_through_reexport_chain() {
        let (index, oracle) = project(&[
            ("base.ts", "export enum UserState {\n  Active = 1,\n}\n"),
            ("middle.ts", "export {UserState} from './base';\n"),
            (
                "top.ts",
                "import {UserState} from './middle';\nexport type S = UserState;\n",
            ),
        ]);
        let top = index.id_of(std::path::Path::new("/proj/src/top.ts")).unwrap();
        let base = index.id_of(std::path::Path::new("/proj/src/base.ts")).unwrap();

        let handle = oracle.resolve_type(top, &reference("UserState")).unwrap();
        assert_eq!(oracle.declarations(&handle)[0].unit, base);
    }

    #[test]
    fn test_qualified_enum_member_site() {
        let (index, oracle) = project(&[(
            "errors.ts",
            "export enum UserErrorCode {\n  Unknown = 'unknown',\n  Denied = 'denied',\n}\nexport type Worst = UserErrorCode.Denied;\n",
        )]);
        let id = index.id_of(std::path::Path::new("/proj/src/errors.ts")).unwrap();

        let handle = oracle
            .resolve_type(id, &reference("UserErrorCode.Denied"))
            .unwrap();
        let site = &oracle.declarations(&handle)[0];
        assert_eq!(site.kind, SiteKind::EnumMember);
        assert_eq!(site.member, Some(1));
        assert_eq!(site.stmt, 0);
    }

    #[test]
    fn test_builtins_and_unresolved_are_ambient() {
        let (index, oracle) = project(&[("a.ts", "export class A {}\n")]);
        let id = index.id_of(std::path::Path::new("/proj/src/a.ts")).unwrap();
        assert!(oracle.resolve_type(id, &reference("Promise")).is_none());
        assert!(oracle.resolve_type(id, &reference("Nonexistent")).is_none());
    }

    #[test]
    fn test_package_import_is_ambient() {
        let (index, oracle) = project(&[(
            "h.ts",
            "import {Route} from '@framework/rpc';\nexport class H extends Route {}\n",
        )]);
        let id = index.id_of(std::path::Path::new("/proj/src/h.ts")).unwrap();
        assert!(oracle.resolve_type(id, &reference("Route")).is_none());
    }

    #[test]
    fn test_circular_reexports_terminate() {
        let (index, oracle) = project(&[
            ("x.ts", "export {Ghost} from './y';\n"),
            ("y.ts", "export {Ghost} from './x';\n"),
            ("z.ts", "import {Ghost} from './x';\nexport type G = Ghost;\n"),
        ]);
        let z = index.id_of(std::path::Path::new("/proj/src/z.ts")).unwrap();
        assert!(oracle.resolve_type(z, &reference("Ghost")).is_none());
    }

    #[test]
    fn test_function_alias_site_kind() {
        let (index, oracle) = project(&[(
            "cb.ts",
            "export type OnChange = (value: string) => void;\nexport type Wrapped = OnChange;\n",
        )]);
        let id = index.id_of(std::path::Path::new("/proj/src/cb.ts")).unwrap();
        let handle = oracle.resolve_type(id, &reference("OnChange")).unwrap();
        assert_eq!(oracle.declarations(&handle)[0].kind, SiteKind::FunctionAlias);
    }
}
