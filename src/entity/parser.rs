//! Entity declaration parser.
//!
//! Reads one decorated class out of a typed scripting source:
//!
//! ```text
//! import { Entity, Table, Id, Generated, Column, OneToMany } from "sdk/db";
//!
//! @Entity()
//! @Table("ORDERS")
//! export class Order {
//!     @Id()
//!     @Generated("identity")
//!     @Column({ name: "ORDER_ID", type: "bigint" })
//!     public id: number;
//!
//!     @Column({ name: "CUSTOMER", type: "varchar", length: 100, nullable: false })
//!     public customer: string;
//!
//!     @OneToMany(() => OrderItem, { joinColumn: "ORDER_ID", cascade: "all", lazy: true })
//!     public items: OrderItem[];
//! }
//! ```
//!
//! Imports, comments, methods and unknown decorators are skipped. Fields with
//! no persistence decorator map as plain columns unless marked `@Transient()`.

use log::debug;

use super::lexer::{Token, TokenKind, tokenize};
use super::metadata::{
    AssociationDetails, CollectionDetails, ColumnDetails, EntityFieldMetadata, EntityMetadata,
    FieldKind,
};
use crate::core::{MarshalError, Result};

const MEMBER_MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "readonly",
    "static",
    "declare",
    "override",
    "abstract",
];

/// Default strategy for `@Generated()` without arguments.
const DEFAULT_GENERATED_STRATEGY: &str = "identity";

/// Parse an entity declaration. `location` only labels error messages.
pub fn parse_entity(location: &str, source: &str) -> Result<EntityMetadata> {
    let tokens = tokenize(location, source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        location,
    };
    let class = parser.parse_source()?;
    build_metadata(location, class)
}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Str(String),
    Number(String),
    Bool(bool),
    Null,
    Ident(String),
    /// `() => Target`
    TypeRef(String),
    Object(Vec<(String, Arg)>),
    Array(Vec<Arg>),
}

impl Arg {
    fn describe(&self) -> String {
        match self {
            Arg::Str(s) => format!("\"{}\"", s),
            Arg::Number(n) => n.clone(),
            Arg::Bool(b) => b.to_string(),
            Arg::Null => "null".to_string(),
            Arg::Ident(i) => i.clone(),
            Arg::TypeRef(t) => format!("() => {}", t),
            Arg::Object(_) => "{...}".to_string(),
            Arg::Array(_) => "[...]".to_string(),
        }
    }
}

#[derive(Debug)]
struct Decorator {
    name: String,
    args: Vec<Arg>,
    line: usize,
}

#[derive(Debug)]
struct ParsedField {
    name: String,
    type_text: String,
    decorators: Vec<Decorator>,
    line: usize,
}

#[derive(Debug)]
struct ParsedClass {
    name: String,
    decorators: Vec<Decorator>,
    fields: Vec<ParsedField>,
    line: usize,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    location: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> MarshalError {
        MarshalError::parse(self.location, line, message)
    }

    fn peek_is_punct(&self, ch: char) -> bool {
        self.peek().is_some_and(|token| token.is_punct(ch))
    }

    fn eat_punct(&mut self, ch: char) -> bool {
        if self.peek_is_punct(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, ch: char, context: &str) -> Result<()> {
        match self.advance() {
            Some(token) if token.is_punct(ch) => Ok(()),
            Some(token) => Err(self.error(
                token.line,
                format!("expected '{}' {}, found {}", ch, context, token.describe()),
            )),
            None => Err(self.error(
                self.current_line(),
                format!("expected '{}' {}, found end of input", ch, context),
            )),
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<(String, usize)> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                line,
            }) => Ok((name, line)),
            Some(token) => Err(self.error(
                token.line,
                format!("expected {}, found {}", context, token.describe()),
            )),
            None => Err(self.error(
                self.current_line(),
                format!("expected {}, found end of input", context),
            )),
        }
    }

    fn parse_source(&mut self) -> Result<ParsedClass> {
        let mut pending = Vec::new();

        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(self.error(self.current_line(), "no class declaration found"));
            };

            match &token.kind {
                TokenKind::Ident(word) if word == "import" => {
                    if !pending.is_empty() {
                        return Err(self.error(token.line, "decorators must precede a class"));
                    }
                    self.skip_import();
                }
                TokenKind::Ident(word) if matches!(word.as_str(), "export" | "default" | "abstract") => {
                    self.pos += 1;
                }
                TokenKind::Ident(word) if word == "class" => {
                    self.pos += 1;
                    return self.parse_class(pending, token.line);
                }
                TokenKind::Punct('@') => pending.push(self.parse_decorator()?),
                _ => {
                    if !pending.is_empty() {
                        return Err(self.error(token.line, "decorators must precede a class"));
                    }
                    self.pos += 1;
                }
            }
        }
    }

    /// `import ... from "x";`, `import "x";` with or without the semicolon.
    fn skip_import(&mut self) {
        self.pos += 1;
        while let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::Punct(';') => return,
                TokenKind::Str(_) => {
                    self.eat_punct(';');
                    return;
                }
                _ => {}
            }
        }
    }

    fn parse_class(&mut self, decorators: Vec<Decorator>, line: usize) -> Result<ParsedClass> {
        let (name, _) = self.expect_ident("class name")?;

        // extends / implements / type parameters
        while !self.peek_is_punct('{') {
            if self.advance().is_none() {
                return Err(self.error(line, format!("class '{}' has no body", name)));
            }
        }
        self.expect_punct('{', "to open the class body")?;

        let mut fields = Vec::new();
        let mut pending: Vec<Decorator> = Vec::new();

        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(self.error(line, format!("unclosed class '{}' (missing '}}')", name)));
            };

            match &token.kind {
                TokenKind::Punct('}') => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Punct(';') | TokenKind::Punct(',') => {
                    self.pos += 1;
                }
                TokenKind::Punct('@') => pending.push(self.parse_decorator()?),
                TokenKind::Ident(word) if MEMBER_MODIFIERS.contains(&word.as_str()) && self.next_is_member_name() => {
                    self.pos += 1;
                }
                TokenKind::Ident(word)
                    if matches!(word.as_str(), "get" | "set" | "async")
                        && matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Ident(_))) =>
                {
                    self.pos += 1;
                }
                TokenKind::Ident(member) => {
                    let member = member.clone();
                    self.pos += 1;
                    if self.peek_is_punct('(') || self.peek_is_punct('<') {
                        if !pending.is_empty() {
                            debug!("{}: dropping decorators on method '{}'", self.location, member);
                            pending.clear();
                        }
                        self.skip_method()?;
                        continue;
                    }
                    let type_text = self.parse_field_tail(&member, token.line)?;
                    fields.push(ParsedField {
                        name: member,
                        type_text,
                        decorators: std::mem::take(&mut pending),
                        line: token.line,
                    });
                }
                _ => {
                    return Err(self.error(
                        token.line,
                        format!("unexpected {} in class '{}'", token.describe(), name),
                    ));
                }
            }
        }

        if !pending.is_empty() {
            return Err(self.error(
                pending[0].line,
                format!("decorator '@{}' is not attached to a field", pending[0].name),
            ));
        }

        Ok(ParsedClass {
            name,
            decorators,
            fields,
            line,
        })
    }

    /// A modifier keyword is only a modifier when a member name follows it.
    fn next_is_member_name(&self) -> bool {
        matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Ident(_)))
    }

    fn skip_method(&mut self) -> Result<()> {
        let line = self.current_line();
        if self.peek_is_punct('<') {
            self.skip_balanced('<', '>')?;
        }
        if self.peek_is_punct('(') {
            self.skip_balanced('(', ')')?;
        }
        while !self.peek_is_punct('{') {
            if self.peek_is_punct(';') {
                // overload or abstract signature
                self.pos += 1;
                return Ok(());
            }
            if self.advance().is_none() {
                return Err(self.error(line, "unterminated method declaration"));
            }
        }
        self.skip_balanced('{', '}')
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Result<()> {
        let line = self.current_line();
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.error(line, format!("missing '{}'", close)))
    }

    /// Everything after a field name: optional `?`/`!`, type annotation, initializer.
    fn parse_field_tail(&mut self, field: &str, line: usize) -> Result<String> {
        if self.peek_is_punct('?') || self.peek_is_punct('!') {
            self.pos += 1;
        }

        let mut type_text = None;
        if self.eat_punct(':') {
            let text = self.parse_type_text(line)?;
            if text.is_empty() {
                return Err(self.error(line, format!("field '{}' is missing its type", field)));
            }
            type_text = Some(text);
        }

        if self.eat_punct('=') {
            let inferred = self.skip_initializer(line)?;
            type_text = type_text.or(Some(inferred));
        }

        self.eat_punct(';');
        Ok(type_text.unwrap_or_else(|| "any".to_string()))
    }

    fn parse_type_text(&mut self, field_line: usize) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0i32;
        let mut last_line = field_line;
        let mut continues = true;

        while let Some(token) = self.peek().cloned() {
            if depth == 0 {
                let terminator = matches!(
                    token.kind,
                    TokenKind::Punct(';') | TokenKind::Punct('=') | TokenKind::Punct('}') | TokenKind::Punct('@')
                );
                if terminator || (token.line > last_line && !continues) {
                    break;
                }
            }

            match &token.kind {
                TokenKind::Punct('<') | TokenKind::Punct('[') | TokenKind::Punct('(') | TokenKind::Punct('{') => {
                    depth += 1
                }
                TokenKind::Punct('>') | TokenKind::Punct(']') | TokenKind::Punct(')') | TokenKind::Punct('}') => {
                    depth -= 1
                }
                _ => {}
            }

            match &token.kind {
                TokenKind::Ident(ident) => text.push_str(ident),
                TokenKind::Str(s) => text.push_str(&format!("\"{}\"", s)),
                TokenKind::Number(n) => text.push_str(n),
                TokenKind::Arrow => text.push_str(" => "),
                TokenKind::Punct(ch @ ('|' | '&')) => text.push_str(&format!(" {} ", ch)),
                TokenKind::Punct(',') => text.push_str(", "),
                TokenKind::Punct(ch) => text.push(*ch),
            }

            continues = matches!(
                token.kind,
                TokenKind::Punct('|') | TokenKind::Punct('&') | TokenKind::Punct('<') | TokenKind::Punct(',') | TokenKind::Arrow
            ) || depth > 0;
            last_line = token.line;
            self.pos += 1;
        }

        Ok(text.trim().to_string())
    }

    /// Skip an initializer expression, returning the type implied by a literal.
    fn skip_initializer(&mut self, field_line: usize) -> Result<String> {
        let first = self.peek().cloned();
        let mut depth = 0i32;
        let mut last_line = field_line;
        let mut continues = true;
        let mut consumed = 0usize;

        while let Some(token) = self.peek().cloned() {
            if depth == 0 {
                let ends = token.is_punct(';') || token.is_punct('}') || token.is_punct('@');
                if ends || (token.line > last_line && !continues) {
                    break;
                }
            }
            match token.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => depth -= 1,
                _ => {}
            }
            continues = depth > 0
                || matches!(
                    token.kind,
                    TokenKind::Punct('+' | '-' | '*' | '/' | '|' | '&' | '?' | ':' | ',' | '=' | '.')
                        | TokenKind::Arrow
                );
            last_line = token.line;
            consumed += 1;
            self.pos += 1;
        }

        if consumed == 0 {
            return Err(self.error(field_line, "missing initializer after '='"));
        }

        let inferred = match first.map(|token| token.kind) {
            Some(TokenKind::Str(_)) if consumed == 1 => "string",
            Some(TokenKind::Number(_)) if consumed == 1 => "number",
            Some(TokenKind::Ident(word)) if consumed == 1 && (word == "true" || word == "false") => "boolean",
            _ => "any",
        };
        Ok(inferred.to_string())
    }

    fn parse_decorator(&mut self) -> Result<Decorator> {
        let at_line = self.current_line();
        self.expect_punct('@', "to start a decorator")?;
        let (mut name, line) = self.expect_ident("decorator name")?;

        // namespaced decorators: @orm.Column(...)
        while self.peek_is_punct('.') {
            self.pos += 1;
            let (part, _) = self.expect_ident("decorator name after '.'")?;
            name = part;
        }

        let mut args = Vec::new();
        if self.eat_punct('(') {
            if !self.eat_punct(')') {
                loop {
                    args.push(self.parse_arg()?);
                    if self.eat_punct(',') {
                        if self.eat_punct(')') {
                            break;
                        }
                        continue;
                    }
                    self.expect_punct(')', &format!("to close '@{}' arguments", name))?;
                    break;
                }
            }
        }

        Ok(Decorator {
            name,
            args,
            line: line.max(at_line),
        })
    }

    fn parse_arg(&mut self) -> Result<Arg> {
        let Some(token) = self.advance() else {
            return Err(self.error(self.current_line(), "expected decorator argument, found end of input"));
        };

        match token.kind {
            TokenKind::Str(s) => Ok(Arg::Str(s)),
            TokenKind::Number(n) => Ok(Arg::Number(n)),
            TokenKind::Punct('-') => match self.advance() {
                Some(Token {
                    kind: TokenKind::Number(n),
                    ..
                }) => Ok(Arg::Number(format!("-{}", n))),
                _ => Err(self.error(token.line, "malformed decorator argument after '-'")),
            },
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Ok(Arg::Bool(true)),
                "false" => Ok(Arg::Bool(false)),
                "null" | "undefined" => Ok(Arg::Null),
                _ => {
                    let mut path = word;
                    while self.peek_is_punct('.') {
                        self.pos += 1;
                        let (part, _) = self.expect_ident("identifier after '.'")?;
                        path.push('.');
                        path.push_str(&part);
                    }
                    Ok(Arg::Ident(path))
                }
            },
            TokenKind::Punct('(') => {
                self.expect_punct(')', "in type reference '() => Target'")?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::Arrow,
                        ..
                    }) => {}
                    _ => return Err(self.error(token.line, "expected '=>' in type reference '() => Target'")),
                }
                let (target, _) = self.expect_ident("target entity in type reference")?;
                Ok(Arg::TypeRef(target))
            }
            TokenKind::Punct('{') => {
                let mut entries = Vec::new();
                loop {
                    if self.eat_punct('}') {
                        break;
                    }
                    let key = match self.advance() {
                        Some(Token {
                            kind: TokenKind::Ident(key) | TokenKind::Str(key),
                            ..
                        }) => key,
                        Some(other) => {
                            return Err(self.error(
                                other.line,
                                format!("malformed decorator argument: expected key, found {}", other.describe()),
                            ));
                        }
                        None => return Err(self.error(token.line, "unclosed object in decorator argument")),
                    };
                    self.expect_punct(':', &format!("after key '{}'", key))?;
                    let value = self.parse_arg()?;
                    entries.push((key, value));
                    if !self.eat_punct(',') {
                        self.expect_punct('}', "to close decorator object")?;
                        break;
                    }
                }
                Ok(Arg::Object(entries))
            }
            TokenKind::Punct('[') => {
                let mut items = Vec::new();
                loop {
                    if self.eat_punct(']') {
                        break;
                    }
                    items.push(self.parse_arg()?);
                    if !self.eat_punct(',') {
                        self.expect_punct(']', "to close decorator array")?;
                        break;
                    }
                }
                Ok(Arg::Array(items))
            }
            other => Err(self.error(
                token.line,
                format!(
                    "malformed decorator argument: unexpected {}",
                    Token {
                        kind: other,
                        line: token.line
                    }
                    .describe()
                ),
            )),
        }
    }
}

/// Typed access to one decorator's arguments.
struct DecoratorArgs<'a> {
    decorator: &'a Decorator,
    location: &'a str,
}

impl<'a> DecoratorArgs<'a> {
    fn new(decorator: &'a Decorator, location: &'a str) -> Self {
        Self {
            decorator,
            location,
        }
    }

    fn malformed(&self, message: impl Into<String>) -> MarshalError {
        MarshalError::parse(
            self.location,
            self.decorator.line,
            format!(
                "malformed argument to '@{}': {}",
                self.decorator.name,
                message.into()
            ),
        )
    }

    fn leading_string(&self) -> Result<Option<String>> {
        match self.decorator.args.first() {
            Some(Arg::Str(s)) => Ok(Some(s.clone())),
            Some(Arg::Ident(path)) => Ok(Some(path.clone())),
            Some(Arg::Object(_)) | Some(Arg::TypeRef(_)) | None => Ok(None),
            Some(other) => Err(self.malformed(format!("expected a string, found {}", other.describe()))),
        }
    }

    /// `"Name"` or `["Name", ..]`, as accepted by `@Entity`.
    fn leading_name(&self) -> Result<Option<String>> {
        match self.decorator.args.first() {
            Some(Arg::Array(items)) => match items.first() {
                Some(Arg::Str(name)) => Ok(Some(name.clone())),
                Some(other) => Err(self.malformed(format!(
                    "expected an entity name, found {}",
                    other.describe()
                ))),
                None => Ok(None),
            },
            _ => self.leading_string(),
        }
    }

    fn type_ref(&self) -> Option<String> {
        self.decorator.args.iter().find_map(|arg| match arg {
            Arg::TypeRef(target) => Some(target.clone()),
            _ => None,
        })
    }

    fn options(&self) -> Result<&'a [(String, Arg)]> {
        let objects: Vec<_> = self
            .decorator
            .args
            .iter()
            .filter_map(|arg| match arg {
                Arg::Object(entries) => Some(entries.as_slice()),
                _ => None,
            })
            .collect();

        match objects.as_slice() {
            [] => Ok(&[]),
            [single] => Ok(single),
            _ => Err(self.malformed("more than one options object")),
        }
    }

    fn get(&self, keys: &[&str]) -> Result<Option<&'a Arg>> {
        Ok(self
            .options()?
            .iter()
            .find(|(key, _)| keys.contains(&key.as_str()))
            .map(|(_, value)| value))
    }

    fn string(&self, keys: &[&str]) -> Result<Option<String>> {
        match self.get(keys)? {
            None | Some(Arg::Null) => Ok(None),
            Some(Arg::Str(s)) | Some(Arg::Ident(s)) => Ok(Some(s.clone())),
            Some(Arg::Array(items)) => {
                let parts = items
                    .iter()
                    .map(|item| match item {
                        Arg::Str(s) | Arg::Ident(s) => Ok(s.clone()),
                        other => Err(self.malformed(format!(
                            "'{}' expects strings, found {}",
                            keys[0],
                            other.describe()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(parts.join(",")))
            }
            Some(other) => Err(self.malformed(format!(
                "'{}' expects a string, found {}",
                keys[0],
                other.describe()
            ))),
        }
    }

    /// Strings, numbers and booleans all render as the default's text.
    fn literal_text(&self, keys: &[&str]) -> Result<Option<String>> {
        match self.get(keys)? {
            None | Some(Arg::Null) => Ok(None),
            Some(Arg::Str(s)) | Some(Arg::Number(s)) | Some(Arg::Ident(s)) => Ok(Some(s.clone())),
            Some(Arg::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(self.malformed(format!(
                "'{}' expects a literal, found {}",
                keys[0],
                other.describe()
            ))),
        }
    }

    fn boolean(&self, keys: &[&str]) -> Result<Option<bool>> {
        match self.get(keys)? {
            None | Some(Arg::Null) => Ok(None),
            Some(Arg::Bool(b)) => Ok(Some(*b)),
            Some(Arg::Str(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Arg::Str(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(self.malformed(format!(
                "'{}' expects a boolean, found {}",
                keys[0],
                other.describe()
            ))),
        }
    }

    fn unsigned(&self, keys: &[&str]) -> Result<Option<u32>> {
        match self.get(keys)? {
            None | Some(Arg::Null) => Ok(None),
            Some(Arg::Number(n)) | Some(Arg::Str(n)) => n.parse::<u32>().map(Some).map_err(|_| {
                self.malformed(format!("'{}' expects a non-negative integer, found {}", keys[0], n))
            }),
            Some(other) => Err(self.malformed(format!(
                "'{}' expects a number, found {}",
                keys[0],
                other.describe()
            ))),
        }
    }
}

fn build_metadata(location: &str, class: ParsedClass) -> Result<EntityMetadata> {
    let mut entity_name = class.name.clone();
    let mut table_name = None;
    let mut documentation = None;

    for decorator in &class.decorators {
        let args = DecoratorArgs::new(decorator, location);
        match decorator.name.as_str() {
            "Entity" => {
                if let Some(name) = args.leading_name()?.or(args.string(&["name"])?) {
                    entity_name = name;
                }
                if let Some(table) = args.string(&["table"])? {
                    table_name = Some(table);
                }
            }
            "Table" => {
                table_name = args.leading_string()?.or(args.string(&["name"])?);
                if table_name.is_none() {
                    return Err(args.malformed("expected a table name"));
                }
            }
            "Documentation" => documentation = args.leading_string()?,
            other => debug!("{}: ignoring class decorator '@{}'", location, other),
        }
    }

    let mut fields = Vec::with_capacity(class.fields.len());
    for parsed in &class.fields {
        if fields
            .iter()
            .any(|f: &EntityFieldMetadata| f.property_name == parsed.name)
        {
            return Err(MarshalError::parse(
                location,
                parsed.line,
                format!("duplicate field '{}'", parsed.name),
            ));
        }
        if let Some(field) = build_field(location, parsed)? {
            fields.push(field);
        }
    }

    let identifiers: Vec<_> = fields.iter().filter(|f| f.is_identifier).collect();
    match identifiers.as_slice() {
        [] => {
            return Err(MarshalError::parse(
                location,
                class.line,
                format!("entity '{}' has no identifier field (missing @Id)", entity_name),
            ));
        }
        [_] => {}
        [_, second, ..] => {
            return Err(MarshalError::parse(
                location,
                class.line,
                format!(
                    "entity '{}' declares more than one identifier (second: '{}')",
                    entity_name, second.property_name
                ),
            ));
        }
    }

    debug!(
        "{}: parsed entity '{}' with {} field(s)",
        location,
        entity_name,
        fields.len()
    );

    Ok(EntityMetadata {
        table_name: table_name.unwrap_or_else(|| entity_name.to_uppercase()),
        entity_name,
        location: location.to_string(),
        documentation,
        fields,
    })
}

fn build_field(location: &str, parsed: &ParsedField) -> Result<Option<EntityFieldMetadata>> {
    let mut is_identifier = false;
    let mut generation_strategy = None;
    let mut documentation = None;
    let mut transient = false;
    let mut kind: Option<(&str, FieldKind)> = None;

    for decorator in &parsed.decorators {
        let args = DecoratorArgs::new(decorator, location);
        let next_kind = match decorator.name.as_str() {
            "Id" | "PrimaryKey" => {
                is_identifier = true;
                None
            }
            "Generated" | "GeneratedValue" => {
                let strategy = args
                    .leading_string()?
                    .or(args.string(&["strategy"])?)
                    .unwrap_or_else(|| DEFAULT_GENERATED_STRATEGY.to_string());
                generation_strategy = Some(strategy);
                None
            }
            "Column" => Some(FieldKind::Column(column_details(&args)?)),
            "ManyToOne" => Some(FieldKind::Association(association_details(&args, parsed)?)),
            "OneToMany" => Some(FieldKind::Collection(collection_details(&args, parsed)?)),
            "Transient" => {
                transient = true;
                None
            }
            "Documentation" => {
                documentation = args.leading_string()?;
                None
            }
            other => {
                debug!(
                    "{}: ignoring decorator '@{}' on field '{}'",
                    location, other, parsed.name
                );
                None
            }
        };

        if let Some(next_kind) = next_kind {
            if let Some((previous, _)) = &kind {
                return Err(MarshalError::parse(
                    location,
                    decorator.line,
                    format!(
                        "field '{}' combines '@{}' with '@{}'",
                        parsed.name, previous, decorator.name
                    ),
                ));
            }
            kind = Some((decorator.name.as_str(), next_kind));
        }
    }

    if transient {
        if is_identifier {
            return Err(MarshalError::parse(
                location,
                parsed.line,
                format!("identifier field '{}' cannot be @Transient", parsed.name),
            ));
        }
        debug!("{}: skipping transient field '{}'", location, parsed.name);
        return Ok(None);
    }

    let kind = kind.map_or(FieldKind::Column(ColumnDetails::nullable()), |(_, kind)| kind);

    if is_identifier && !matches!(kind, FieldKind::Column(_)) {
        return Err(MarshalError::parse(
            location,
            parsed.line,
            format!(
                "identifier field '{}' cannot be an association or collection",
                parsed.name
            ),
        ));
    }

    Ok(Some(EntityFieldMetadata {
        property_name: parsed.name.clone(),
        source_type: parsed.type_text.clone(),
        is_identifier,
        generation_strategy,
        documentation,
        kind,
    }))
}

fn column_details(args: &DecoratorArgs<'_>) -> Result<ColumnDetails> {
    Ok(ColumnDetails {
        name: args.leading_string()?.or(args.string(&["name"])?),
        type_hint: args.string(&["type", "columnType"])?,
        length: args.unsigned(&["length"])?,
        nullable: args.boolean(&["nullable"])?.unwrap_or(true),
        default_value: args.literal_text(&["defaultValue", "default"])?,
        precision: args.unsigned(&["precision"])?,
        scale: args.unsigned(&["scale"])?,
    })
}

fn association_details(args: &DecoratorArgs<'_>, field: &ParsedField) -> Result<AssociationDetails> {
    let target_entity = target_entity(args, field)?;
    Ok(AssociationDetails {
        target_entity,
        join_column: args.string(&["joinColumn"])?,
        cascade: args.string(&["cascade"])?,
        not_null: args.boolean(&["notNull"])?.unwrap_or(false),
        lazy: args.boolean(&["lazy"])?.unwrap_or(false),
    })
}

fn collection_details(args: &DecoratorArgs<'_>, field: &ParsedField) -> Result<CollectionDetails> {
    let target_entity = target_entity(args, field)?;
    Ok(CollectionDetails {
        target_entity,
        table: args.string(&["table"])?,
        join_column: args.string(&["joinColumn"])?,
        inverse: args.boolean(&["inverse"])?.unwrap_or(false),
        lazy: args.boolean(&["lazy"])?.unwrap_or(false),
        fetch: args.string(&["fetch"])?,
        cascade: args.string(&["cascade"])?,
        join_column_not_null: args.boolean(&["joinColumnNotNull"])?.unwrap_or(false),
    })
}

/// `() => Target`, then `{ entity: "Target" }`, then the field's type annotation.
fn target_entity(args: &DecoratorArgs<'_>, field: &ParsedField) -> Result<String> {
    if let Some(target) = args.type_ref() {
        return Ok(target);
    }
    if let Some(Arg::Str(target)) = args.decorator.args.first() {
        return Ok(target.clone());
    }
    if let Some(target) = args.string(&["entity", "target"])? {
        return Ok(target);
    }
    element_type(&field.type_text)
        .ok_or_else(|| args.malformed(format!("cannot infer target entity of field '{}'", field.name)))
}

/// `OrderItem[]`, `Array<OrderItem>`, `OrderItem | null` all name `OrderItem`.
fn element_type(type_text: &str) -> Option<String> {
    let head = type_text
        .split('|')
        .map(str::trim)
        .find(|part| !matches!(*part, "null" | "undefined" | ""))?;
    let head = head.trim_end_matches("[]");
    let head = head
        .strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(head)
        .trim();

    let is_identifier = head
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && head.chars().all(|c| c.is_alphanumeric() || c == '_');
    let is_builtin = matches!(head, "any" | "string" | "number" | "boolean" | "object" | "Date");
    (is_identifier && !is_builtin).then(|| head.to_string())
}
