//! Reference walker + declaration accumulator: the closure builder.
//!
//! One struct with an explicit work queue. Walking a declaration collects
//! every named type reference in its signatures (decorator subtrees are
//! never part of the walk); each reference is resolved through the oracle
//! and either dropped (ambient), aliased (anonymous), or enqueued for
//! inlining (declared). Draining the queue inlines declarations verbatim
//! and walks them in turn. Member-level resolution sites are widened to
//! their parent statement before inlining, which is how a reference to a
//! single enum member reproduces the whole enumeration. Cycles terminate
//! on the symbol ledger, not on a depth limit.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use husk_project::{DeclSite, ProjectIndex, SymbolId, TypeOracle, UnitId};
use husk_syntax::{
    AliasDecl, Declaration, DeclarationKind, KeywordType, Modifiers, Span, TypeExpr, TypeName,
};

use crate::context::{BundleContext, ProvenanceKey};

pub struct ClosureBuilder<'a, O: TypeOracle> {
    index: &'a mut ProjectIndex,
    oracle: &'a O,
    ctx: &'a mut BundleContext,
    queue: VecDeque<DeclSite>,
}

impl<'a, O: TypeOracle> ClosureBuilder<'a, O> {
    pub fn new(index: &'a mut ProjectIndex, oracle: &'a O, ctx: &'a mut BundleContext) -> Self {
        Self {
            index,
            oracle,
            ctx,
            queue: VecDeque::new(),
        }
    }

    /// Record an already-shaped entry declaration as retained without
    /// re-walking it; extraction walks entry member types itself, from the
    /// units the members were merged out of.
    pub fn retain_entry(&mut self, unit: UnitId, stmt: usize) {
        let Some(decl) = self.index.unit(unit).statements.get(stmt).and_then(|s| s.as_decl())
        else {
            return;
        };
        let key = ProvenanceKey {
            path: self.index.path(unit).to_owned(),
            span: decl.span,
        };
        self.ctx.ledger.mark_symbol(SymbolId::new(unit, stmt, None));
        self.ctx.retain(key);
        self.ctx.track(unit);
    }

    /// Enqueue a statement's declaration for inlining and walking; used
    /// for the explicitly listed extra constants/enums.
    pub fn schedule_statement(&mut self, unit: UnitId, stmt: usize) {
        let Some(decl) = self.index.unit(unit).statements.get(stmt).and_then(|s| s.as_decl())
        else {
            return;
        };
        self.ctx.ledger.mark_symbol(SymbolId::new(unit, stmt, None));
        self.queue.push_back(DeclSite {
            unit,
            stmt,
            member: None,
            kind: site_kind_of(decl),
            span: decl.span,
        });
    }

    /// Resolve one reference that has no rewritable site (entry members
    /// merged out of ancestor units). Anonymous literal renderings cannot
    /// be substituted here, so they are aliased in collapsed form instead.
    pub fn reference_without_site(&mut self, from: UnitId, name: &TypeName) {
        self.reference(from, name, false);
    }

    /// Drain the work queue to a fixpoint of the reachable declaration
    /// set.
    pub fn run(&mut self) {
        while let Some(site) = self.queue.pop_front() {
            self.inline_site(site);
        }
    }

    /// Inline one resolution site: widen to its parent statement, record
    /// provenance, strip decorators, then walk its signatures.
    fn inline_site(&mut self, site: DeclSite) {
        let unit = site.unit;
        // Widening: member sites (enum member, function-type alias body)
        // reproduce the whole parent statement.
        let stmt = site.stmt;

        let Some((span, names)) = self.collect_declaration(unit, stmt) else {
            return;
        };
        let key = ProvenanceKey {
            path: self.index.path(unit).to_owned(),
            span,
        };
        if !self.ctx.retain(key) {
            return;
        }
        self.ctx.track(unit);
        trace!(unit = ?self.index.path(unit), stmt, "inlining declaration");

        if let Some(decl) = self.index.unit_mut(unit).statements[stmt].as_decl_mut() {
            decl.strip_decorators();
        }

        let mut replacements: HashMap<Span, TypeExpr> = HashMap::new();
        for name in &names {
            if let Some(replacement) = self.reference(unit, name, true) {
                replacements.insert(name.span, replacement);
            }
        }
        if !replacements.is_empty() {
            if let Some(decl) = self.index.unit_mut(unit).statements[stmt].as_decl_mut() {
                decl.rewrite_types(&mut |expr| match expr {
                    TypeExpr::Name(n) | TypeExpr::TypeOf(n) => replacements.get(&n.span).cloned(),
                    _ => None,
                });
            }
        }
    }

    fn collect_declaration(&self, unit: UnitId, stmt: usize) -> Option<(Span, Vec<TypeName>)> {
        let decl = self.index.unit(unit).statements.get(stmt)?.as_decl()?;
        let mut names = Vec::new();
        decl.for_each_type(&mut |expr| match expr {
            TypeExpr::Name(name) | TypeExpr::TypeOf(name) => names.push(name.clone()),
            _ => {}
        });
        Some((decl.span, names))
    }

    /// Handle one resolved reference. Returns a replacement expression
    /// when the reference site itself must be rewritten (literal-valued
    /// types collapse to their primitive form).
    fn reference(&mut self, from: UnitId, name: &TypeName, can_substitute: bool) -> Option<TypeExpr> {
        let Some(handle) = self.oracle.resolve_type(from, name) else {
            // Built-in or unresolvable: ambient, dropped by design.
            return None;
        };

        match self.oracle.resolve_symbol(&handle) {
            Some(symbol) => {
                if !self.ctx.ledger.mark_symbol(symbol) {
                    return None;
                }
                for site in self.oracle.declarations(&handle) {
                    self.queue.push_back(site);
                }
                None
            }
            None => {
                let rendering = handle.rendering().to_string();
                if let Some(keyword) = literal_keyword(&rendering) {
                    if can_substitute {
                        return Some(TypeExpr::Keyword(keyword, name.span));
                    }
                    if self.ctx.ledger.mark_rendering(&rendering) {
                        self.push_alias(name, keyword.as_str());
                    }
                    return None;
                }
                if self.ctx.ledger.mark_rendering(&rendering) {
                    self.push_alias(name, &rendering);
                }
                None
            }
        }
    }

    /// Synthesize `type <name> = <value>;` under the reference site's own
    /// name, into the synthetic unit that serializes last.
    fn push_alias(&mut self, name: &TypeName, value: &str) {
        let ordinal = self.ctx.aliases.len() as u32;
        let span = Span::new(ordinal, ordinal);
        self.ctx.aliases.push(Declaration {
            name: name.qualified(),
            modifiers: Modifiers::EXPORT,
            decorators: Vec::new(),
            span,
            kind: DeclarationKind::Alias(AliasDecl {
                type_params: Vec::new(),
                value: TypeExpr::Verbatim(value.to_string(), span),
            }),
        });
    }
}

fn site_kind_of(decl: &Declaration) -> husk_project::SiteKind {
    use husk_project::SiteKind;
    match &decl.kind {
        DeclarationKind::Class(_) => SiteKind::Class,
        DeclarationKind::Interface(_) => SiteKind::Interface,
        DeclarationKind::Enum(_) => SiteKind::Enum,
        DeclarationKind::Alias(_) => SiteKind::Alias,
        DeclarationKind::Const(_) => SiteKind::Const,
    }
}

fn literal_keyword(rendering: &str) -> Option<KeywordType> {
    let text = rendering.trim();
    if (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
        || (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
    {
        return Some(KeywordType::String);
    }
    if text == "true" || text == "false" {
        return Some(KeywordType::Boolean);
    }
    if text.parse::<f64>().is_ok() {
        return Some(KeywordType::Number);
    }
    None
}

#[cfg(test)]
mod tests {
    use husk_project::{ProjectOracle, TypeHandle};

    use super::*;

    /// Oracle fixture: defers to name resolution over the index, but lets
    /// a test pin individual names to handcrafted resolutions.
    struct FixtureOracle {
        inner: ProjectOracle,
        pinned: HashMap<String, Option<TypeHandle>>,
    }

    impl FixtureOracle {
        fn new(index: &ProjectIndex) -> Self {
            Self {
                inner: ProjectOracle::build(index),
                pinned: HashMap::new(),
            }
        }

        fn pin(mut self, name: &str, handle: Option<TypeHandle>) -> Self {
            self.pinned.insert(name.to_string(), handle);
            self
        }
    }

    impl TypeOracle for FixtureOracle {
        fn resolve_type(&self, from: UnitId, name: &TypeName) -> Option<TypeHandle> {
            if let Some(pinned) = self.pinned.get(&name.qualified()) {
                return pinned.clone();
            }
            self.inner.resolve_type(from, name)
        }
    }

    fn single_unit(source: &str) -> (ProjectIndex, UnitId) {
        let mut index = ProjectIndex::new("/p");
        let id = index.add_source("/p/api.ts", source).unwrap();
        (index, id)
    }

    #[test]
    fn test_closure_expands_through_references() {
        let (mut index, id) = single_unit(
            "export type LoginRes = {user: UserInfo};\nexport interface UserInfo {\n  state: UserState;\n}\nexport enum UserState {\n  Active = 1,\n}\n",
        );
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let mut builder = ClosureBuilder::new(&mut index, &oracle, &mut ctx);
        builder.schedule_statement(id, 0);
        builder.run();

        assert_eq!(ctx.retained.len(), 3);
    }

    #[test]
    fn test_cycle_terminates_and_inlines_once() {
        let (mut index, id) = single_unit(
            "export interface Node {\n  next: Edge;\n}\nexport interface Edge {\n  from: Node;\n  to: Node;\n}\n",
        );
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let mut builder = ClosureBuilder::new(&mut index, &oracle, &mut ctx);
        builder.schedule_statement(id, 0);
        builder.run();

        assert_eq!(ctx.retained.len(), 2);
        assert_eq!(ctx.ledger.processed_count(), 2);
    }

    #[test]
    fn test_anonymous_resolution_synthesizes_alias_once() {
        let (mut index, id) = single_unit(
            "export interface A {\n  first: Mystery;\n}\nexport interface B {\n  second: Mystery;\n}\nexport type Root = {a: A; b: B};\n",
        );
        let oracle = FixtureOracle::new(&index)
            .pin("Mystery", Some(TypeHandle::anonymous("{raw: string}")));
        let mut ctx = BundleContext::new();
        let mut builder = ClosureBuilder::new(&mut index, &oracle, &mut ctx);
        builder.schedule_statement(id, 2);
        builder.run();

        assert_eq!(ctx.aliases.len(), 1);
        assert_eq!(ctx.aliases[0].name, "Mystery");
    }

    #[test]
    fn test_literal_rendering_collapses_to_primitive() {
        let (mut index, id) = single_unit("export type Conf = {port: PortNumber};\n");
        let oracle =
            FixtureOracle::new(&index).pin("PortNumber", Some(TypeHandle::anonymous("8080")));
        let mut ctx = BundleContext::new();
        let mut builder = ClosureBuilder::new(&mut index, &oracle, &mut ctx);
        builder.schedule_statement(id, 0);
        builder.run();

        assert!(ctx.aliases.is_empty());
        let rendered = index.rendered(id);
        assert!(rendered.contains("port: number"), "got: {rendered}");
    }

    #[test]
    fn test_enum_member_reference_widens_to_parent() {
        let (mut index, id) = single_unit(
            "export enum ErrorLevel {\n  Info = 'info',\n  Fatal = 'fatal',\n}\nexport type Worst = ErrorLevel.Fatal;\n",
        );
        let oracle = ProjectOracle::build(&index);
        let mut ctx = BundleContext::new();
        let mut builder = ClosureBuilder::new(&mut index, &oracle, &mut ctx);
        builder.schedule_statement(id, 1);
        builder.run();

        // Both the alias and the whole parent enum are retained.
        assert_eq!(ctx.retained.len(), 2);
        let enum_decl = index.unit(id).statements[0].as_decl().unwrap();
        assert_eq!(enum_decl.as_enum().unwrap().members.len(), 2);
    }
}
