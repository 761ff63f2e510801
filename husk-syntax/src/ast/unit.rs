//! Source units and their top-level statements.

use std::path::PathBuf;

use crate::span::Span;

use super::decl::Declaration;

/// One name in an import list, e.g. `LoginReq` or `LoginReq as Req`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl ImportName {
    /// The binding visible inside the importing unit.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `import {A, B as C} from './x';`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub names: Vec<ImportName>,
    pub specifier: String,
    pub span: Span,
}

impl ImportDecl {
    /// Relative specifiers point into the project; everything else is a
    /// package import.
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with("./") || self.specifier.starts_with("../")
    }
}

/// One name in a re-export list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportName {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl ExportName {
    /// The name the unit exposes to its importers.
    pub fn exposed(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `export {A} from './x';` or `export {A, B};`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDecl {
    pub names: Vec<ExportName>,
    pub specifier: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportDecl),
    Export(ExportDecl),
    Decl(Declaration),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Import(import) => import.span,
            Statement::Export(export) => export.span,
            Statement::Decl(decl) => decl.span,
        }
    }

    pub fn as_decl(&self) -> Option<&Declaration> {
        match self {
            Statement::Decl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_decl_mut(&mut self) -> Option<&mut Declaration> {
        match self {
            Statement::Decl(decl) => Some(decl),
            _ => None,
        }
    }
}

/// One parsed file: path plus ordered top-level statements. Exported-name
/// sets are derived, not stored, since pruning changes them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub statements: Vec<Statement>,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            statements: Vec::new(),
        }
    }

    /// Find a top-level declaration by name.
    pub fn declaration(&self, name: &str) -> Option<(usize, &Declaration)> {
        self.statements.iter().enumerate().find_map(|(i, stmt)| {
            stmt.as_decl()
                .filter(|decl| decl.name == name)
                .map(|decl| (i, decl))
        })
    }

    pub fn declaration_mut(&mut self, name: &str) -> Option<&mut Declaration> {
        self.statements
            .iter_mut()
            .find_map(|stmt| stmt.as_decl_mut().filter(|decl| decl.name == name))
    }

    /// Names the unit currently exports: exported local declarations plus
    /// the exposed names of its re-exports.
    pub fn exported_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for stmt in &self.statements {
            match stmt {
                Statement::Decl(decl) if decl.is_exported() => names.push(decl.name.clone()),
                Statement::Export(export) => {
                    names.extend(export.names.iter().map(|n| n.exposed().to_string()));
                }
                _ => {}
            }
        }
        names
    }

    /// Whether the unit exposes `name`, either as an exported local
    /// declaration or through a re-export.
    pub fn exports(&self, name: &str) -> bool {
        self.exported_names().iter().any(|n| n == name)
    }
}
