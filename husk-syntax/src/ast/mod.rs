//! AST for the declaration subset.
//!
//! Nodes are plain owned data, mutated in place by the bundler (entry
//! extraction rewrites class members, closure building substitutes type
//! nodes, pruning deletes statements). Every node that can be emitted keeps
//! the byte span it was parsed from.

mod decl;
mod member;
mod ty;
mod unit;

pub use decl::{
    AliasDecl, ClassDecl, ConstDecl, Declaration, DeclarationKind, Decorator, EnumDecl,
    EnumMember, InterfaceDecl,
};
pub use member::{IndexMember, Member, MethodMember, Param, PropertyMember};
pub use ty::{FunctionType, KeywordType, Literal, TypeExpr, TypeName};
pub use unit::{ExportDecl, ExportName, ImportDecl, ImportName, SourceUnit, Statement};

use bitflags::bitflags;

bitflags! {
    /// Modifier keywords attached to declarations, members, and parameters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u16 {
        const EXPORT = 1 << 0;
        const DECLARE = 1 << 1;
        const ABSTRACT = 1 << 2;
        const STATIC = 1 << 3;
        const PUBLIC = 1 << 4;
        const PRIVATE = 1 << 5;
        const PROTECTED = 1 << 6;
        const READONLY = 1 << 7;
        const ASYNC = 1 << 8;
        /// `const enum`.
        const CONST = 1 << 9;
        /// `get` accessor.
        const GETTER = 1 << 10;
        /// `set` accessor.
        const SETTER = 1 << 11;
    }
}

impl Modifiers {
    /// True for `private` or `protected`; the bundler treats both as
    /// outside the public contract.
    pub fn is_hidden(&self) -> bool {
        self.intersects(Modifiers::PRIVATE | Modifiers::PROTECTED)
    }
}
