//! Recursive-descent parser for the declaration subset.
//!
//! Method bodies and initializers are skipped with balanced-bracket
//! scanning rather than parsed; the bundler only ever needs the shapes of
//! signatures. Constructs outside the subset (default exports, namespace
//! imports, `export *`, function and namespace declarations) are rejected
//! with a spanned error rather than silently mangled.

use std::path::PathBuf;

use crate::ast::{
    AliasDecl, ClassDecl, ConstDecl, Declaration, DeclarationKind, Decorator, EnumDecl,
    EnumMember, ExportDecl, ExportName, FunctionType, ImportDecl, ImportName, IndexMember,
    InterfaceDecl, KeywordType, Literal, Member, MethodMember, Modifiers, Param, PropertyMember,
    SourceUnit, Statement, TypeExpr, TypeName,
};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parse one source file into a unit.
pub fn parse_unit(path: impl Into<PathBuf>, source: &str) -> Result<SourceUnit, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let mut unit = SourceUnit::new(path.into());
    while !parser.at_eof() {
        unit.statements.push(parser.parse_statement()?);
    }
    Ok(unit)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

const DECL_KEYWORDS: &[&str] = &[
    "export", "import", "declare", "abstract", "class", "interface", "enum", "type", "const",
    "let", "var",
];

impl<'s> Parser<'s> {
    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Owned clone of the current token kind; matching on this keeps the
    /// parser free to consume tokens inside match arms.
    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn nth(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with eof"))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_ident(&self, text: &str) -> bool {
        self.peek().is_ident(text)
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        if !matches!(self.peek().kind, TokenKind::Ident(_)) {
            return Err(self.error_here(what));
        }
        let token = self.bump();
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.span)),
            _ => unreachable!("checked above"),
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<Span, ParseError> {
        if self.at_ident(kw) {
            Ok(self.bump().span)
        } else {
            Err(self.error_here(&format!("'{kw}'")))
        }
    }

    /// Consume a string token, if one is next.
    fn bump_str(&mut self) -> Option<(String, Span)> {
        if !matches!(self.peek().kind, TokenKind::Str(_)) {
            return None;
        }
        let token = self.bump();
        match token.kind {
            TokenKind::Str(text) => Some((text, token.span)),
            _ => unreachable!("checked above"),
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        ParseError::expected(expected, self.peek().kind.describe(), self.peek().span)
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end())
    }

    /// Whether a newline separates the previous token from the current one.
    fn newline_before(&self) -> bool {
        if self.pos == 0 {
            return true;
        }
        let gap = &self.source[self.prev_end() as usize..self.peek().span.start as usize];
        gap.contains('\n')
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.at_ident("import") {
            return self.parse_import().map(Statement::Import);
        }
        if self.at_ident("export") && self.nth(1).kind == TokenKind::LBrace {
            return self.parse_export_list().map(Statement::Export);
        }
        let decorators = self.parse_decorators()?;
        self.parse_declaration(decorators).map(Statement::Decl)
    }

    fn parse_import(&mut self) -> Result<ImportDecl, ParseError> {
        let start = self.expect_keyword("import")?.start;

        if !self.at(TokenKind::LBrace) {
            return Err(ParseError::unsupported(
                "default or namespace import",
                self.peek().span,
            ));
        }
        self.bump();

        let mut names = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let (name, name_span) = self.expect_ident("imported name")?;
            let mut alias = None;
            let mut end = name_span;
            if self.at_ident("as") {
                self.bump();
                let (alias_name, alias_span) = self.expect_ident("import alias")?;
                alias = Some(alias_name);
                end = alias_span;
            }
            names.push(ImportName {
                name,
                alias,
                span: name_span.to(end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        self.expect_keyword("from")?;
        let Some((specifier, _)) = self.bump_str() else {
            return Err(self.error_here("module specifier"));
        };
        self.eat_semis();
        Ok(ImportDecl {
            names,
            specifier,
            span: self.span_from(start),
        })
    }

    fn parse_export_list(&mut self) -> Result<ExportDecl, ParseError> {
        let start = self.expect_keyword("export")?.start;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut names = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let (name, name_span) = self.expect_ident("exported name")?;
            let mut alias = None;
            let mut end = name_span;
            if self.at_ident("as") {
                self.bump();
                let (alias_name, alias_span) = self.expect_ident("export alias")?;
                alias = Some(alias_name);
                end = alias_span;
            }
            names.push(ExportName {
                name,
                alias,
                span: name_span.to(end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;

        let mut specifier = None;
        if self.at_ident("from") {
            self.bump();
            let Some((text, _)) = self.bump_str() else {
                return Err(self.error_here("module specifier"));
            };
            specifier = Some(text);
        }
        self.eat_semis();
        Ok(ExportDecl {
            names,
            specifier,
            span: self.span_from(start),
        })
    }

    fn parse_declaration(&mut self, decorators: Vec<Decorator>) -> Result<Declaration, ParseError> {
        let start = decorators
            .first()
            .map(|d| d.span.start)
            .unwrap_or(self.peek().span.start);

        let mut modifiers = Modifiers::empty();
        loop {
            if self.at_ident("export") {
                self.bump();
                modifiers |= Modifiers::EXPORT;
                if self.at_ident("default") {
                    return Err(ParseError::unsupported("default export", self.peek().span));
                }
                continue;
            }
            if self.at_ident("declare") {
                self.bump();
                modifiers |= Modifiers::DECLARE;
                continue;
            }
            if self.at_ident("abstract") && self.nth(1).is_ident("class") {
                self.bump();
                modifiers |= Modifiers::ABSTRACT;
                continue;
            }
            break;
        }

        if self.at_ident("const") && self.nth(1).is_ident("enum") {
            self.bump();
            modifiers |= Modifiers::CONST;
        }

        if self.at_ident("class") {
            return self.parse_class(start, modifiers, decorators);
        }
        if self.at_ident("interface") {
            return self.parse_interface(start, modifiers, decorators);
        }
        if self.at_ident("enum") {
            return self.parse_enum(start, modifiers, decorators);
        }
        if self.at_ident("type") && matches!(self.nth(1).kind, TokenKind::Ident(_)) {
            return self.parse_alias(start, modifiers, decorators);
        }
        if self.at_ident("const") || self.at_ident("let") || self.at_ident("var") {
            return self.parse_const(start, modifiers, decorators);
        }
        if self.at_ident("function") || self.at_ident("namespace") || self.at_ident("module") {
            let token = self.peek().clone();
            let construct = match &token.kind {
                TokenKind::Ident(name) => format!("{name} declaration"),
                _ => unreachable!("guarded by at_ident"),
            };
            return Err(ParseError::unsupported(construct, token.span));
        }
        Err(self.error_here("declaration"))
    }

    fn parse_class(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        decorators: Vec<Decorator>,
    ) -> Result<Declaration, ParseError> {
        self.expect_keyword("class")?;
        let (name, _) = self.expect_ident("class name")?;
        let type_params = self.parse_type_params()?;

        let mut extends = None;
        if self.at_ident("extends") {
            self.bump();
            extends = Some(self.parse_type()?);
        }
        let mut implements = Vec::new();
        if self.at_ident("implements") {
            self.bump();
            loop {
                implements.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            members.push(self.parse_member()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        self.eat_semis();

        Ok(Declaration {
            name,
            modifiers,
            decorators,
            span: self.span_from(start),
            kind: DeclarationKind::Class(ClassDecl {
                type_params,
                extends,
                implements,
                members,
            }),
        })
    }

    fn parse_interface(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        decorators: Vec<Decorator>,
    ) -> Result<Declaration, ParseError> {
        self.expect_keyword("interface")?;
        let (name, _) = self.expect_ident("interface name")?;
        let type_params = self.parse_type_params()?;

        let mut extends = Vec::new();
        if self.at_ident("extends") {
            self.bump();
            loop {
                extends.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            members.push(self.parse_member()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        self.eat_semis();

        Ok(Declaration {
            name,
            modifiers,
            decorators,
            span: self.span_from(start),
            kind: DeclarationKind::Interface(InterfaceDecl {
                type_params,
                extends,
                members,
            }),
        })
    }

    fn parse_enum(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        decorators: Vec<Decorator>,
    ) -> Result<Declaration, ParseError> {
        self.expect_keyword("enum")?;
        let (name, _) = self.expect_ident("enum name")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let (member_name, member_span) = match self.bump_str() {
                Some(pair) => pair,
                None => self.expect_ident("enum member")?,
            };
            let mut value = None;
            if self.eat(TokenKind::Eq) {
                value = Some(self.parse_enum_value());
            }
            members.push(EnumMember {
                name: member_name,
                value,
                span: Span::new(member_span.start, self.prev_end()),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        self.eat_semis();

        Ok(Declaration {
            name,
            modifiers,
            decorators,
            span: self.span_from(start),
            kind: DeclarationKind::Enum(EnumDecl { members }),
        })
    }

    /// Enum initializers are captured as raw text so computed values
    /// (`1 << 2`) survive rendering unchanged.
    fn parse_enum_value(&mut self) -> Literal {
        let start = self.peek().span.start;
        let mut depth: u32 = 0;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Comma if depth == 0 => break,
                _ => {
                    self.bump();
                }
            }
        }
        let raw = self.source[start as usize..self.prev_end() as usize].trim();
        if let Some(inner) = raw
            .strip_prefix('\'')
            .and_then(|r| r.strip_suffix('\''))
            .or_else(|| raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
        {
            Literal::Str(inner.to_string())
        } else if raw == "true" {
            Literal::Bool(true)
        } else if raw == "false" {
            Literal::Bool(false)
        } else {
            Literal::Num(raw.to_string())
        }
    }

    fn parse_alias(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        decorators: Vec<Decorator>,
    ) -> Result<Declaration, ParseError> {
        self.expect_keyword("type")?;
        let (name, _) = self.expect_ident("alias name")?;
        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::Eq, "'='")?;
        let value = self.parse_type()?;
        self.eat_semis();

        Ok(Declaration {
            name,
            modifiers,
            decorators,
            span: self.span_from(start),
            kind: DeclarationKind::Alias(AliasDecl { type_params, value }),
        })
    }

    fn parse_const(
        &mut self,
        start: u32,
        modifiers: Modifiers,
        decorators: Vec<Decorator>,
    ) -> Result<Declaration, ParseError> {
        self.bump();
        let (name, _) = self.expect_ident("constant name")?;
        let mut type_ann = None;
        if self.eat(TokenKind::Colon) {
            type_ann = Some(self.parse_type()?);
        }
        if self.eat(TokenKind::Eq) {
            self.skip_initializer(false);
        }
        if self.at(TokenKind::Comma) {
            return Err(ParseError::unsupported(
                "multiple declarators",
                self.peek().span,
            ));
        }
        self.eat_semis();

        Ok(Declaration {
            name,
            modifiers,
            decorators,
            span: self.span_from(start),
            kind: DeclarationKind::Const(ConstDecl { type_ann }),
        })
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let decorators = self.parse_decorators()?;
        let start = decorators
            .first()
            .map(|d| d.span.start)
            .unwrap_or(self.peek().span.start);

        let mut modifiers = Modifiers::empty();
        loop {
            let flag = match &self.peek().kind {
                TokenKind::Ident(text) => match text.as_str() {
                    "public" => Modifiers::PUBLIC,
                    "private" => Modifiers::PRIVATE,
                    "protected" => Modifiers::PROTECTED,
                    "static" => Modifiers::STATIC,
                    "readonly" => Modifiers::READONLY,
                    "abstract" => Modifiers::ABSTRACT,
                    "async" => Modifiers::ASYNC,
                    _ => break,
                },
                _ => break,
            };
            // A modifier keyword directly followed by member punctuation is
            // actually the member's name.
            if matches!(
                self.nth(1).kind,
                TokenKind::Colon
                    | TokenKind::LParen
                    | TokenKind::Question
                    | TokenKind::Semi
                    | TokenKind::Comma
                    | TokenKind::Eq
                    | TokenKind::Lt
                    | TokenKind::RBrace
            ) {
                break;
            }
            self.bump();
            modifiers |= flag;
        }

        if (self.at_ident("get") || self.at_ident("set"))
            && matches!(self.nth(1).kind, TokenKind::Ident(_))
        {
            let accessor = self.bump();
            modifiers |= if accessor.is_ident("get") {
                Modifiers::GETTER
            } else {
                Modifiers::SETTER
            };
        }

        if self.at(TokenKind::LBracket) {
            return self.parse_index_member(start, modifiers);
        }

        if self.at_ident("constructor") {
            self.bump();
            let params = self.parse_params()?;
            if self.at(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            }
            let span = self.span_from(start);
            self.eat_member_seps();
            return Ok(Member::Ctor { params, span });
        }

        let (name, _) = match self.bump_str() {
            Some(pair) => pair,
            None => self.expect_ident("member name")?,
        };
        let optional = self.eat(TokenKind::Question);

        if self.at(TokenKind::LParen) || self.at(TokenKind::Lt) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let mut return_type = None;
            if self.eat(TokenKind::Colon) {
                return_type = Some(self.parse_type()?);
            }
            let mut has_body = false;
            if self.at(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                has_body = true;
            }
            let span = self.span_from(start);
            self.eat_member_seps();
            return Ok(Member::Method(MethodMember {
                name,
                modifiers,
                decorators,
                optional,
                type_params,
                params,
                return_type,
                has_body,
                span,
            }));
        }

        let mut type_ann = None;
        if self.eat(TokenKind::Colon) {
            type_ann = Some(self.parse_type()?);
        }
        if self.eat(TokenKind::Eq) {
            self.skip_initializer(false);
        }
        let span = self.span_from(start);
        self.eat_member_seps();
        Ok(Member::Property(PropertyMember {
            name,
            modifiers,
            decorators,
            optional,
            type_ann,
            span,
        }))
    }

    fn parse_index_member(&mut self, start: u32, modifiers: Modifiers) -> Result<Member, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let (key_name, _) = self.expect_ident("index parameter")?;
        self.expect(TokenKind::Colon, "':'")?;
        let key_type = self.parse_type()?;
        self.expect(TokenKind::RBracket, "']'")?;
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.parse_type()?;
        let span = self.span_from(start);
        self.eat_member_seps();
        Ok(Member::Index(IndexMember {
            key_name,
            key_type,
            value,
            readonly: modifiers.contains(Modifiers::READONLY),
            span,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let decorators = self.parse_decorators()?;
            let start = decorators
                .first()
                .map(|d| d.span.start)
                .unwrap_or(self.peek().span.start);

            let mut modifiers = Modifiers::empty();
            loop {
                let flag = match &self.peek().kind {
                    TokenKind::Ident(text) => match text.as_str() {
                        "public" => Modifiers::PUBLIC,
                        "private" => Modifiers::PRIVATE,
                        "protected" => Modifiers::PROTECTED,
                        "readonly" => Modifiers::READONLY,
                        _ => break,
                    },
                    _ => break,
                };
                if !matches!(self.nth(1).kind, TokenKind::Ident(_) | TokenKind::DotDotDot) {
                    break;
                }
                self.bump();
                modifiers |= flag;
            }

            let rest = self.eat(TokenKind::DotDotDot);
            let (name, _) = self.expect_ident("parameter name")?;
            let optional = self.eat(TokenKind::Question);
            let mut type_ann = None;
            if self.eat(TokenKind::Colon) {
                type_ann = Some(self.parse_type()?);
            }
            if self.eat(TokenKind::Eq) {
                self.skip_initializer(true);
            }
            params.push(Param {
                name,
                modifiers,
                decorators,
                optional,
                rest,
                type_ann,
                span: self.span_from(start),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(params)
    }

    fn parse_decorators(&mut self) -> Result<Vec<Decorator>, ParseError> {
        let mut decorators = Vec::new();
        while self.at(TokenKind::At) {
            let start = self.bump().span.start;
            self.expect_ident("decorator name")?;
            while self.eat(TokenKind::Dot) {
                self.expect_ident("decorator name")?;
            }
            if self.at(TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            }
            let end = self.prev_end();
            decorators.push(Decorator {
                text: self.source[start as usize..end as usize].to_string(),
                span: Span::new(start, end),
            });
        }
        Ok(decorators)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.eat(TokenKind::Pipe);
        let first = self.parse_intersection()?;
        if !self.at(TokenKind::Pipe) {
            return Ok(first);
        }
        let start = first.span().start;
        let mut parts = vec![first];
        while self.eat(TokenKind::Pipe) {
            parts.push(self.parse_intersection()?);
        }
        Ok(TypeExpr::Union(parts, self.span_from(start)))
    }

    fn parse_intersection(&mut self) -> Result<TypeExpr, ParseError> {
        let first = self.parse_postfix()?;
        if !self.at(TokenKind::Amp) {
            return Ok(first);
        }
        let start = first.span().start;
        let mut parts = vec![first];
        while self.eat(TokenKind::Amp) {
            parts.push(self.parse_postfix()?);
        }
        Ok(TypeExpr::Intersection(parts, self.span_from(start)))
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr, ParseError> {
        let mut expr = self.parse_primary_type()?;
        while self.at(TokenKind::LBracket) && self.nth(1).kind == TokenKind::RBracket {
            let start = expr.span().start;
            self.bump();
            self.bump();
            expr = TypeExpr::Array(Box::new(expr), self.span_from(start));
        }
        Ok(expr)
    }

    fn parse_primary_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.peek().span.start;
        match self.peek_kind() {
            TokenKind::LParen => {
                if self.function_type_ahead() {
                    let params = self.parse_params()?;
                    self.expect(TokenKind::Arrow, "'=>'")?;
                    let ret = self.parse_type()?;
                    Ok(TypeExpr::Function(FunctionType {
                        params,
                        ret: Box::new(ret),
                        span: self.span_from(start),
                    }))
                } else {
                    self.bump();
                    let inner = self.parse_type()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    Ok(TypeExpr::Paren(Box::new(inner), self.span_from(start)))
                }
            }
            TokenKind::LBrace => {
                self.bump();
                let mut members = Vec::new();
                while !self.at(TokenKind::RBrace) && !self.at_eof() {
                    members.push(self.parse_member()?);
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(TypeExpr::Object(members, self.span_from(start)))
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RBracket) && !self.at_eof() {
                    elements.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(TypeExpr::Tuple(elements, self.span_from(start)))
            }
            TokenKind::Str(text) => {
                let token = self.bump();
                Ok(TypeExpr::Literal(Literal::Str(text), token.span))
            }
            TokenKind::Num(text) => {
                let token = self.bump();
                Ok(TypeExpr::Literal(Literal::Num(text), token.span))
            }
            TokenKind::Minus => {
                self.bump();
                match self.peek_kind() {
                    TokenKind::Num(text) => {
                        self.bump();
                        Ok(TypeExpr::Literal(
                            Literal::Num(format!("-{text}")),
                            self.span_from(start),
                        ))
                    }
                    _ => Err(self.error_here("number literal")),
                }
            }
            TokenKind::Ident(text) => {
                if text == "true" || text == "false" {
                    let token = self.bump();
                    return Ok(TypeExpr::Literal(Literal::Bool(text == "true"), token.span));
                }
                if text == "typeof" {
                    self.bump();
                    let name = self.parse_type_name()?;
                    return Ok(TypeExpr::TypeOf(name));
                }
                if text == "new" {
                    return Err(ParseError::unsupported("constructor type", self.peek().span));
                }
                if let Some(keyword) = KeywordType::from_str(&text) {
                    if self.nth(1).kind != TokenKind::Dot {
                        let token = self.bump();
                        return Ok(TypeExpr::Keyword(keyword, token.span));
                    }
                }
                Ok(TypeExpr::Name(self.parse_type_name()?))
            }
            _ => Err(self.error_here("type")),
        }
    }

    fn parse_type_name(&mut self) -> Result<TypeName, ParseError> {
        let (first, first_span) = self.expect_ident("type name")?;
        let mut segments = vec![first];
        while self.at(TokenKind::Dot) && matches!(self.nth(1).kind, TokenKind::Ident(_)) {
            self.bump();
            let (segment, _) = self.expect_ident("type name")?;
            segments.push(segment);
        }
        let mut args = Vec::new();
        if self.at(TokenKind::Lt) {
            self.bump();
            while !self.at(TokenKind::Gt) && !self.at_eof() {
                args.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "'>'")?;
        }
        Ok(TypeName {
            segments,
            args,
            span: Span::new(first_span.start, self.prev_end()),
        })
    }

    /// At a `(`: does the balanced parenthesis group end with `=>`?
    fn function_type_ahead(&self) -> bool {
        let mut i = self.pos;
        let mut depth = 0usize;
        loop {
            match self.tokens.get(i).map(|t| &t.kind) {
                Some(TokenKind::LParen) => depth += 1,
                Some(TokenKind::RParen) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::Arrow);
                    }
                }
                Some(TokenKind::Eof) | None => return false,
                Some(_) => {}
            }
            i += 1;
        }
    }

    /// Type parameter lists are kept as raw text; nothing in the bundler
    /// rewrites inside them.
    fn parse_type_params(&mut self) -> Result<Vec<String>, ParseError> {
        if !self.at(TokenKind::Lt) {
            return Ok(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        let mut start = self.peek().span.start;
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return Err(self.error_here("'>'")),
                TokenKind::Lt
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Gt if depth == 0 => {
                    let raw = self.source[start as usize..self.prev_end() as usize].trim();
                    if !raw.is_empty() {
                        params.push(raw.to_string());
                    }
                    self.bump();
                    return Ok(params);
                }
                TokenKind::Gt
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                TokenKind::Comma if depth == 0 => {
                    let raw = self.source[start as usize..self.prev_end() as usize].trim();
                    if !raw.is_empty() {
                        params.push(raw.to_string());
                    }
                    self.bump();
                    start = self.peek().span.start;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------

    /// Skip a balanced bracket group, starting at the opening token.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<(), ParseError> {
        let open_token = self.expect(open.clone(), &open.describe())?;
        let mut depth = 1usize;
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof {
                return Err(ParseError::expected(
                    close.describe(),
                    "end of file",
                    open_token.span,
                ));
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    self.bump();
                    return Ok(());
                }
            }
            self.bump();
        }
    }

    /// Skip an initializer expression: until a top-level `;` (left for the
    /// separator eater), a top-level `,`/`)` when inside a parameter list,
    /// a closing bracket of the surrounding construct, or a token that
    /// starts a fresh statement on a new line.
    fn skip_initializer(&mut self, stop_at_comma: bool) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Semi if depth == 0 => return,
                TokenKind::Comma if depth == 0 && stop_at_comma => return,
                TokenKind::Ident(text)
                    if depth == 0
                        && DECL_KEYWORDS.contains(&text.as_str())
                        && self.newline_before() =>
                {
                    return;
                }
                TokenKind::At if depth == 0 && self.newline_before() => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn eat_semis(&mut self) {
        while self.eat(TokenKind::Semi) {}
    }

    fn eat_member_seps(&mut self) {
        while self.at(TokenKind::Semi) || self.at(TokenKind::Comma) {
            self.bump();
        }
    }
}
