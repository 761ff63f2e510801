//! Class, interface, and object-literal members.

use crate::span::Span;

use super::decl::Decorator;
use super::ty::TypeExpr;
use super::Modifiers;

/// A property with an optional declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMember {
    pub name: String,
    pub modifiers: Modifiers,
    pub decorators: Vec<Decorator>,
    pub optional: bool,
    pub type_ann: Option<TypeExpr>,
    pub span: Span,
}

/// A method signature. Bodies are parsed past but never stored; the flag
/// only records that the source had one.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMember {
    pub name: String,
    pub modifiers: Modifiers,
    pub decorators: Vec<Decorator>,
    pub optional: bool,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub has_body: bool,
    pub span: Span,
}

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub modifiers: Modifiers,
    pub decorators: Vec<Decorator>,
    pub optional: bool,
    pub rest: bool,
    pub type_ann: Option<TypeExpr>,
    pub span: Span,
}

/// An index signature, e.g. `[key: string]: AccountRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMember {
    pub key_name: String,
    pub key_type: TypeExpr,
    pub value: TypeExpr,
    pub readonly: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Property(PropertyMember),
    Method(MethodMember),
    Index(IndexMember),
    /// Constructors are parsed so entry extraction can delete them.
    Ctor { params: Vec<Param>, span: Span },
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Property(p) => Some(&p.name),
            Member::Method(m) => Some(&m.name),
            Member::Index(_) | Member::Ctor { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Member::Property(p) => p.span,
            Member::Method(m) => m.span,
            Member::Index(i) => i.span,
            Member::Ctor { span, .. } => *span,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Member::Property(p) => p.modifiers,
            Member::Method(m) => m.modifiers,
            Member::Index(_) | Member::Ctor { .. } => Modifiers::empty(),
        }
    }

    /// Visit every type expression in the member's signature. Decorator
    /// subtrees are not type expressions and are never visited.
    pub fn for_each_type(&self, f: &mut impl FnMut(&TypeExpr)) {
        match self {
            Member::Property(p) => {
                if let Some(ann) = &p.type_ann {
                    ann.for_each(f);
                }
            }
            Member::Method(m) => {
                for param in &m.params {
                    if let Some(ann) = &param.type_ann {
                        ann.for_each(f);
                    }
                }
                if let Some(ret) = &m.return_type {
                    ret.for_each(f);
                }
            }
            Member::Index(index) => {
                index.key_type.for_each(f);
                index.value.for_each(f);
            }
            Member::Ctor { params, .. } => {
                for param in params {
                    if let Some(ann) = &param.type_ann {
                        ann.for_each(f);
                    }
                }
            }
        }
    }

    /// Rewrite every type expression in the member's signature.
    pub fn rewrite_types(&mut self, f: &mut impl FnMut(&TypeExpr) -> Option<TypeExpr>) {
        match self {
            Member::Property(p) => {
                if let Some(ann) = &mut p.type_ann {
                    ann.rewrite(f);
                }
            }
            Member::Method(m) => {
                for param in &mut m.params {
                    if let Some(ann) = &mut param.type_ann {
                        ann.rewrite(f);
                    }
                }
                if let Some(ret) = &mut m.return_type {
                    ret.rewrite(f);
                }
            }
            Member::Index(index) => {
                index.key_type.rewrite(f);
                index.value.rewrite(f);
            }
            Member::Ctor { params, .. } => {
                for param in params {
                    if let Some(ann) = &mut param.type_ann {
                        ann.rewrite(f);
                    }
                }
            }
        }
    }

    /// Drop decorators from the member and its parameters.
    pub fn strip_decorators(&mut self) {
        match self {
            Member::Property(p) => p.decorators.clear(),
            Member::Method(m) => {
                m.decorators.clear();
                for param in &mut m.params {
                    param.decorators.clear();
                }
            }
            Member::Index(_) => {}
            Member::Ctor { params, .. } => {
                for param in params {
                    param.decorators.clear();
                }
            }
        }
    }
}
