//! Rendering of units, statements, and type expressions back to source
//! text with stable whitespace.
//!
//! All output the bundler produces goes through this module, so two runs
//! over the same tree serialize byte-identically regardless of how the
//! tree was mutated in between.

use crate::ast::{
    Declaration, DeclarationKind, ExportDecl, ImportDecl, Literal, Member, MethodMember, Modifiers,
    Param, PropertyMember, SourceUnit, Statement, TypeExpr,
};

/// Incremental code writer with indentation tracking.
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    indent_level: usize,
    indent: &'static str,
    buffer: String,
}

impl CodeBuilder {
    /// Two-space indentation, the convention of the emitted documents.
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent: "  ",
            buffer: String::new(),
        }
    }

    /// Add a line of code with current indentation.
    pub fn line(&mut self, s: &str) -> &mut Self {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self
    }

    /// Add raw text without indentation or newline.
    pub fn raw(&mut self, s: &str) -> &mut Self {
        self.buffer.push_str(s);
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    pub fn build(self) -> String {
        self.buffer
    }
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a whole unit: every statement, in order, one per block.
pub fn render_unit(unit: &SourceUnit) -> String {
    let mut out = String::new();
    for stmt in &unit.statements {
        out.push_str(&render_statement(stmt));
    }
    out
}

pub fn render_statement(stmt: &Statement) -> String {
    match stmt {
        Statement::Import(import) => render_import(import),
        Statement::Export(export) => render_export(export),
        Statement::Decl(decl) => render_declaration(decl),
    }
}

fn render_import(import: &ImportDecl) -> String {
    let names = import
        .names
        .iter()
        .map(|n| match &n.alias {
            Some(alias) => format!("{} as {}", n.name, alias),
            None => n.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("import {{{names}}} from '{}';\n", import.specifier)
}

fn render_export(export: &ExportDecl) -> String {
    let names = export
        .names
        .iter()
        .map(|n| match &n.alias {
            Some(alias) => format!("{} as {}", n.name, alias),
            None => n.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    match &export.specifier {
        Some(specifier) => format!("export {{{names}}} from '{specifier}';\n"),
        None => format!("export {{{names}}};\n"),
    }
}

pub fn render_declaration(decl: &Declaration) -> String {
    let mut builder = CodeBuilder::new();
    emit_declaration(&mut builder, decl);
    builder.build()
}

fn emit_declaration(builder: &mut CodeBuilder, decl: &Declaration) {
    for decorator in &decl.decorators {
        builder.line(&decorator.text);
    }

    let mut head = String::new();
    if decl.modifiers.contains(Modifiers::EXPORT) {
        head.push_str("export ");
    }
    if decl.modifiers.contains(Modifiers::DECLARE) {
        head.push_str("declare ");
    }

    match &decl.kind {
        DeclarationKind::Class(class) => {
            if decl.modifiers.contains(Modifiers::ABSTRACT) {
                head.push_str("abstract ");
            }
            head.push_str("class ");
            head.push_str(&decl.name);
            head.push_str(&render_type_param_list(&class.type_params));
            if let Some(parent) = &class.extends {
                head.push_str(" extends ");
                head.push_str(&render_type(parent));
            }
            if !class.implements.is_empty() {
                head.push_str(" implements ");
                let list = class
                    .implements
                    .iter()
                    .map(render_type)
                    .collect::<Vec<_>>()
                    .join(", ");
                head.push_str(&list);
            }
            head.push_str(" {");
            builder.line(&head);
            builder.indent();
            for member in &class.members {
                emit_member(builder, member);
            }
            builder.dedent();
            builder.line("}");
        }
        DeclarationKind::Interface(interface) => {
            head.push_str("interface ");
            head.push_str(&decl.name);
            head.push_str(&render_type_param_list(&interface.type_params));
            if !interface.extends.is_empty() {
                head.push_str(" extends ");
                let list = interface
                    .extends
                    .iter()
                    .map(render_type)
                    .collect::<Vec<_>>()
                    .join(", ");
                head.push_str(&list);
            }
            head.push_str(" {");
            builder.line(&head);
            builder.indent();
            for member in &interface.members {
                emit_member(builder, member);
            }
            builder.dedent();
            builder.line("}");
        }
        DeclarationKind::Enum(decl_enum) => {
            if decl.modifiers.contains(Modifiers::CONST) {
                head.push_str("const ");
            }
            head.push_str("enum ");
            head.push_str(&decl.name);
            head.push_str(" {");
            builder.line(&head);
            builder.indent();
            for member in &decl_enum.members {
                let mut line = member.name.clone();
                if let Some(value) = &member.value {
                    line.push_str(" = ");
                    line.push_str(&render_literal(value));
                }
                line.push(',');
                builder.line(&line);
            }
            builder.dedent();
            builder.line("}");
        }
        DeclarationKind::Alias(alias) => {
            head.push_str("type ");
            head.push_str(&decl.name);
            head.push_str(&render_type_param_list(&alias.type_params));
            head.push_str(" = ");
            head.push_str(&render_type(&alias.value));
            head.push(';');
            builder.line(&head);
        }
        DeclarationKind::Const(konst) => {
            head.push_str("const ");
            head.push_str(&decl.name);
            head.push_str(": ");
            head.push_str(
                &konst
                    .type_ann
                    .as_ref()
                    .map(render_type)
                    .unwrap_or_else(|| "any".to_string()),
            );
            head.push(';');
            builder.line(&head);
        }
    }
}

fn emit_member(builder: &mut CodeBuilder, member: &Member) {
    match member {
        Member::Property(property) => {
            for decorator in &property.decorators {
                builder.line(&decorator.text);
            }
            builder.line(&format!("{};", property_signature(property)));
        }
        Member::Method(method) => {
            for decorator in &method.decorators {
                builder.line(&decorator.text);
            }
            builder.line(&format!("{};", method_signature(method)));
        }
        Member::Index(index) => {
            let readonly = if index.readonly { "readonly " } else { "" };
            builder.line(&format!(
                "{readonly}[{}: {}]: {};",
                index.key_name,
                render_type(&index.key_type),
                render_type(&index.value)
            ));
        }
        Member::Ctor { params, .. } => {
            builder.line(&format!("constructor({});", render_params(params)));
        }
    }
}

fn member_modifiers(modifiers: Modifiers) -> String {
    let mut out = String::new();
    if modifiers.contains(Modifiers::PRIVATE) {
        out.push_str("private ");
    }
    if modifiers.contains(Modifiers::PROTECTED) {
        out.push_str("protected ");
    }
    if modifiers.contains(Modifiers::STATIC) {
        out.push_str("static ");
    }
    if modifiers.contains(Modifiers::ABSTRACT) {
        out.push_str("abstract ");
    }
    if modifiers.contains(Modifiers::READONLY) {
        out.push_str("readonly ");
    }
    if modifiers.contains(Modifiers::GETTER) {
        out.push_str("get ");
    }
    if modifiers.contains(Modifiers::SETTER) {
        out.push_str("set ");
    }
    out
}

fn property_signature(property: &PropertyMember) -> String {
    let optional = if property.optional { "?" } else { "" };
    let ann = property
        .type_ann
        .as_ref()
        .map(render_type)
        .unwrap_or_else(|| "any".to_string());
    format!(
        "{}{}{optional}: {ann}",
        member_modifiers(property.modifiers),
        property.name
    )
}

fn method_signature(method: &MethodMember) -> String {
    let optional = if method.optional { "?" } else { "" };
    let ret = method
        .return_type
        .as_ref()
        .map(render_type)
        .unwrap_or_else(|| "any".to_string());
    format!(
        "{}{}{optional}{}({}): {ret}",
        member_modifiers(method.modifiers),
        method.name,
        render_type_param_list(&method.type_params),
        render_params(&method.params)
    )
}

fn render_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| {
            let rest = if param.rest { "..." } else { "" };
            let optional = if param.optional { "?" } else { "" };
            let ann = param
                .type_ann
                .as_ref()
                .map(render_type)
                .unwrap_or_else(|| "any".to_string());
            format!("{rest}{}{optional}: {ann}", param.name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_type_param_list(type_params: &[String]) -> String {
    if type_params.is_empty() {
        String::new()
    } else {
        format!("<{}>", type_params.join(", "))
    }
}

fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::Str(text) => format!("'{text}'"),
        Literal::Num(text) => text.clone(),
        Literal::Bool(value) => value.to_string(),
    }
}

/// Render a type expression on one line.
pub fn render_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Name(name) | TypeExpr::TypeOf(name) => {
            let mut out = if matches!(expr, TypeExpr::TypeOf(_)) {
                format!("typeof {}", name.qualified())
            } else {
                name.qualified()
            };
            if !name.args.is_empty() {
                out.push('<');
                out.push_str(
                    &name
                        .args
                        .iter()
                        .map(render_type)
                        .collect::<Vec<_>>()
                        .join(", "),
                );
                out.push('>');
            }
            out
        }
        TypeExpr::Keyword(keyword, _) => keyword.as_str().to_string(),
        TypeExpr::Literal(literal, _) => render_literal(literal),
        TypeExpr::Union(parts, _) => parts
            .iter()
            .map(render_type)
            .collect::<Vec<_>>()
            .join(" | "),
        TypeExpr::Intersection(parts, _) => parts
            .iter()
            .map(render_type)
            .collect::<Vec<_>>()
            .join(" & "),
        TypeExpr::Array(inner, _) => format!("{}[]", render_type(inner)),
        TypeExpr::Tuple(elements, _) => format!(
            "[{}]",
            elements
                .iter()
                .map(render_type)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        TypeExpr::Object(members, _) => {
            let inner = members
                .iter()
                .map(inline_member_signature)
                .collect::<Vec<_>>()
                .join("; ");
            if inner.is_empty() {
                "{}".to_string()
            } else {
                format!("{{{inner}}}")
            }
        }
        TypeExpr::Function(func) => {
            format!("({}) => {}", render_params(&func.params), render_type(&func.ret))
        }
        TypeExpr::Paren(inner, _) => format!("({})", render_type(inner)),
        TypeExpr::Verbatim(text, _) => text.clone(),
    }
}

fn inline_member_signature(member: &Member) -> String {
    match member {
        Member::Property(property) => property_signature(property),
        Member::Method(method) => method_signature(method),
        Member::Index(index) => {
            let readonly = if index.readonly { "readonly " } else { "" };
            format!(
                "{readonly}[{}: {}]: {}",
                index.key_name,
                render_type(&index.key_type),
                render_type(&index.value)
            )
        }
        Member::Ctor { params, .. } => format!("constructor({})", render_params(params)),
    }
}
