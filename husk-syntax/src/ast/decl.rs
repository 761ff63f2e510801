//! Named top-level declarations.

use crate::span::Span;

use super::member::Member;
use super::ty::{Literal, TypeExpr};
use super::Modifiers;

/// A decorator attached to a class, member, or parameter. The argument
/// list is kept as raw text; the bundler only ever strips decorators or
/// reproduces them verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub type_params: Vec<String>,
    pub extends: Option<TypeExpr>,
    pub implements: Vec<TypeExpr>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub type_params: Vec<String>,
    pub extends: Vec<TypeExpr>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Literal>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub type_params: Vec<String>,
    pub value: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub type_ann: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    Alias(AliasDecl),
    Const(ConstDecl),
}

/// A named top-level declaration with its parse-time provenance span.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub decorators: Vec<Decorator>,
    pub span: Span,
    pub kind: DeclarationKind,
}

impl Declaration {
    pub fn is_exported(&self) -> bool {
        self.modifiers.contains(Modifiers::EXPORT)
    }

    pub fn set_exported(&mut self, exported: bool) {
        self.modifiers.set(Modifiers::EXPORT, exported);
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            DeclarationKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassDecl> {
        match &mut self.kind {
            DeclarationKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDecl> {
        match &self.kind {
            DeclarationKind::Enum(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasDecl> {
        match &self.kind {
            DeclarationKind::Alias(decl) => Some(decl),
            _ => None,
        }
    }

    /// Visit every type expression in the declaration: heritage clauses,
    /// member signatures, alias values, and const annotations. Decorators
    /// are never visited; they are call-time metadata, not contract.
    pub fn for_each_type(&self, f: &mut impl FnMut(&TypeExpr)) {
        match &self.kind {
            DeclarationKind::Class(class) => {
                if let Some(parent) = &class.extends {
                    parent.for_each(f);
                }
                for implemented in &class.implements {
                    implemented.for_each(f);
                }
                for member in &class.members {
                    member.for_each_type(f);
                }
            }
            DeclarationKind::Interface(interface) => {
                for parent in &interface.extends {
                    parent.for_each(f);
                }
                for member in &interface.members {
                    member.for_each_type(f);
                }
            }
            DeclarationKind::Alias(alias) => alias.value.for_each(f),
            DeclarationKind::Const(konst) => {
                if let Some(ann) = &konst.type_ann {
                    ann.for_each(f);
                }
            }
            DeclarationKind::Enum(_) => {}
        }
    }

    /// Rewrite every type expression in the declaration.
    pub fn rewrite_types(&mut self, f: &mut impl FnMut(&TypeExpr) -> Option<TypeExpr>) {
        match &mut self.kind {
            DeclarationKind::Class(class) => {
                if let Some(parent) = &mut class.extends {
                    parent.rewrite(f);
                }
                for implemented in &mut class.implements {
                    implemented.rewrite(f);
                }
                for member in &mut class.members {
                    member.rewrite_types(f);
                }
            }
            DeclarationKind::Interface(interface) => {
                for parent in &mut interface.extends {
                    parent.rewrite(f);
                }
                for member in &mut interface.members {
                    member.rewrite_types(f);
                }
            }
            DeclarationKind::Alias(alias) => alias.value.rewrite(f),
            DeclarationKind::Const(konst) => {
                if let Some(ann) = &mut konst.type_ann {
                    ann.rewrite(f);
                }
            }
            DeclarationKind::Enum(_) => {}
        }
    }

    /// Drop decorators from the declaration, its members, and their
    /// parameters.
    pub fn strip_decorators(&mut self) {
        self.decorators.clear();
        match &mut self.kind {
            DeclarationKind::Class(class) => {
                for member in &mut class.members {
                    member.strip_decorators();
                }
            }
            DeclarationKind::Interface(interface) => {
                for member in &mut interface.members {
                    member.strip_decorators();
                }
            }
            _ => {}
        }
    }
}
