//! Descriptor parser: braces-and-assignments text into a [`ConfigNode`] tree.
//!
//! The accepted syntax is the subset of the Gradle Kotlin DSL used by
//! application build descriptors:
//!
//! ```text
//! plugins {
//!     id("com.android.application")
//! }
//! android {
//!     compileSdk = flutter.compileSdkVersion
//!     signingConfigs {
//!         create("release") { storeFile = file("release.jks") }
//!     }
//! }
//! ```
//!
//! Parsing is pure: no files are opened and nothing is evaluated.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::merge::merge;
use crate::node::ConfigNode;
use crate::value::{Invocation, Value};

/// Name of the implicit top-level node.
pub const ROOT: &str = "<root>";

/// A malformed descriptor. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message} (line {line}, column {column})")]
#[diagnostic(
    code(cradle::syntax),
    help("Check braces, quotes and value literals near this location")
)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[label("here")]
    pub span: SourceSpan,
}

/// Parse descriptor text into its root [`ConfigNode`].
pub fn parse(text: &str) -> Result<ConfigNode, SyntaxError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut root = ConfigNode::new(ROOT);
    parser.parse_body(&mut root, None)?;
    Ok(root)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Dot,
    Assign,
    PlusAssign,
    Lt,
    Gt,
    Semi,
    Newline,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(name) => format!("`{name}`"),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Int(_) => "integer literal".to_string(),
            Tok::LBrace => "'{'".to_string(),
            Tok::RBrace => "'}'".to_string(),
            Tok::LParen => "'('".to_string(),
            Tok::RParen => "')'".to_string(),
            Tok::Comma => "','".to_string(),
            Tok::Dot => "'.'".to_string(),
            Tok::Assign => "'='".to_string(),
            Tok::PlusAssign => "'+='".to_string(),
            Tok::Lt => "'<'".to_string(),
            Tok::Gt => "'>'".to_string(),
            Tok::Semi => "';'".to_string(),
            Tok::Newline => "end of line".to_string(),
            Tok::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    offset: usize,
    len: usize,
    line: usize,
    column: usize,
}

impl Token {
    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: self.line,
            column: self.column,
            span: (self.offset, self.len).into(),
        }
    }
}

struct Lexer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(o, _)| o)
            .unwrap_or(self.text.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_here(&self, start: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: self.token_line,
            column: self.token_column,
            span: (start, self.offset().saturating_sub(start).max(1)).into(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let (line, column, start) = (self.line, self.column, self.offset());
            self.token_line = line;
            self.token_column = column;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    tok: Tok::Eof,
                    offset: start,
                    len: 0,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let tok = match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                    continue;
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(SyntaxError {
                                    message: "unterminated block comment".to_string(),
                                    line,
                                    column,
                                    span: (start, 2).into(),
                                })
                            }
                        }
                    }
                    continue;
                }
                '\n' => {
                    self.bump();
                    Tok::Newline
                }
                '{' => self.single(Tok::LBrace),
                '}' => self.single(Tok::RBrace),
                '(' => self.single(Tok::LParen),
                ')' => self.single(Tok::RParen),
                ',' => self.single(Tok::Comma),
                '.' => self.single(Tok::Dot),
                ';' => self.single(Tok::Semi),
                '<' => self.single(Tok::Lt),
                '>' => self.single(Tok::Gt),
                '=' => self.single(Tok::Assign),
                '+' if self.peek_at(1) == Some('=') => {
                    self.bump();
                    self.bump();
                    Tok::PlusAssign
                }
                '"' => self.string(start, line, column)?,
                '`' => self.backticked(start)?,
                '-' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump();
                    self.number(start, true)?
                }
                c if c.is_ascii_digit() => self.number(start, false)?,
                c if c.is_alphabetic() || c == '_' => {
                    let mut name = String::new();
                    while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
                        name.push(c);
                        self.bump();
                    }
                    Tok::Ident(name)
                }
                other => {
                    self.bump();
                    return Err(self.error_here(start, format!("unexpected character '{other}'")));
                }
            };
            tokens.push(Token {
                tok,
                offset: start,
                len: self.offset() - start,
                line,
                column,
            });
        }
    }

    fn single(&mut self, tok: Tok) -> Tok {
        self.bump();
        tok
    }

    fn string(&mut self, start: usize, line: usize, column: usize) -> Result<Tok, SyntaxError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Tok::Str(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c @ ('"' | '\\' | '$' | '\'')) => value.push(c),
                    Some(other) => {
                        return Err(self.error_here(start, format!("unknown escape '\\{other}'")))
                    }
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(SyntaxError {
            message: "unterminated string literal".to_string(),
            line,
            column,
            span: (start, 1).into(),
        })
    }

    fn backticked(&mut self, start: usize) -> Result<Tok, SyntaxError> {
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('`') if !name.is_empty() => return Ok(Tok::Ident(name)),
                Some(c) if c != '\n' && c != '`' => name.push(c),
                _ => return Err(self.error_here(start, "unterminated backtick identifier")),
            }
        }
    }

    fn number(&mut self, start: usize, negative: bool) -> Result<Tok, SyntaxError> {
        let mut digits = String::new();
        if negative {
            digits.push('-');
        }
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '_') {
            if c != '_' {
                digits.push(c);
            }
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.error_here(start, "cannot type value: fractional numbers are not supported"));
        }
        if self.peek().is_some_and(|c| c.is_alphanumeric()) {
            return Err(self.error_here(start, "cannot type value: malformed number"));
        }
        digits
            .parse::<i64>()
            .map(Tok::Int)
            .map_err(|_| self.error_here(start, "integer literal out of range"))
    }
}

/// One `name`, `name<Type>` or `name(args)` step of a dotted path.
#[derive(Debug)]
struct Segment {
    name: String,
    type_arg: Option<String>,
    call: Option<Vec<Value>>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().tok, Tok::Newline) {
            self.bump();
        }
    }

    /// The first token after any newlines, without consuming anything.
    fn peek_past_newlines(&self) -> &Tok {
        self.tokens[self.pos..]
            .iter()
            .map(|t| &t.tok)
            .find(|t| !matches!(t, Tok::Newline))
            .unwrap_or(&Tok::Eof)
    }

    fn expect_ident(&mut self, context: &str) -> Result<(String, Token), SyntaxError> {
        let token = self.bump();
        match &token.tok {
            Tok::Ident(name) => Ok((name.clone(), token)),
            other => Err(token.error(format!("expected {context}, found {}", other.describe()))),
        }
    }

    fn parse_body(&mut self, node: &mut ConfigNode, open: Option<&Token>) -> Result<(), SyntaxError> {
        loop {
            while matches!(self.peek().tok, Tok::Newline | Tok::Semi) {
                self.bump();
            }
            let token = self.peek().clone();
            match &token.tok {
                Tok::Eof => {
                    return match open {
                        Some(brace) => Err(brace.error(format!(
                            "unbalanced braces: '{{' opened at line {} is never closed",
                            brace.line
                        ))),
                        None => Ok(()),
                    }
                }
                Tok::RBrace => {
                    self.bump();
                    return match open {
                        Some(_) => Ok(()),
                        None => Err(token.error("unbalanced braces: unmatched '}'")),
                    };
                }
                Tok::Ident(_) => self.parse_statement(node)?,
                other => {
                    return Err(token.error(format!("expected a statement, found {}", other.describe())))
                }
            }

            let next = self.peek().clone();
            match next.tok {
                Tok::Newline | Tok::Semi => {
                    self.bump();
                }
                Tok::RBrace | Tok::Eof => {}
                ref other => {
                    return Err(next.error(format!(
                        "expected end of statement, found {}",
                        other.describe()
                    )))
                }
            }
        }
    }

    fn parse_statement(&mut self, node: &mut ConfigNode) -> Result<(), SyntaxError> {
        let start = self.peek().clone();
        let mut segments = self.parse_path()?;

        if matches!(self.peek_past_newlines(), Tok::LBrace) {
            let last = segments.pop().ok_or_else(|| start.error("empty block header"))?;
            let label = match last.call.as_deref() {
                None => None,
                Some([]) => None,
                Some([Value::String(label)]) => Some(label.clone()),
                Some(_) => return Err(start.error("block header takes at most one string label")),
            };
            if segments.iter().any(|s| s.call.is_some()) {
                return Err(start.error("invalid block header"));
            }
            segments.push(Segment {
                call: None,
                ..last
            });
            let mut child = ConfigNode::new(render_path(&segments));
            if let Some(label) = label {
                child = child.with_label(label);
            }
            self.skip_newlines();
            let open = self.bump();
            self.parse_body(&mut child, Some(&open))?;
            return insert_block(node, child, &start);
        }

        match self.peek().tok {
            Tok::Assign | Tok::PlusAssign => {
                let op = self.bump();
                if segments.iter().any(|s| s.call.is_some() || s.type_arg.is_some()) {
                    return Err(start.error("invalid assignment target"));
                }
                let value = self.parse_value()?;
                let keys: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
                assign(node, &keys, value, op.tok == Tok::PlusAssign, &start)
            }
            _ => {
                let Some(last) = segments.pop() else {
                    return Err(start.error("empty statement"));
                };
                let Some(args) = last.call else {
                    return Err(start.error(format!(
                        "expected '=', '(' or '{{' after `{}`",
                        last.name
                    )));
                };
                if segments.iter().any(|s| s.call.is_some()) {
                    return Err(start.error("chained calls are not supported"));
                }
                segments.push(Segment {
                    name: last.name,
                    type_arg: last.type_arg,
                    call: None,
                });
                node.push_invocation(Invocation::new(render_path(&segments), args));
                Ok(())
            }
        }
    }

    fn parse_path(&mut self) -> Result<Vec<Segment>, SyntaxError> {
        let mut segments = Vec::new();
        loop {
            let (name, _) = self.expect_ident("an identifier")?;
            let mut segment = Segment {
                name,
                type_arg: None,
                call: None,
            };
            if matches!(self.peek().tok, Tok::Lt) {
                self.bump();
                let (ty, _) = self.expect_ident("a type argument")?;
                let close = self.bump();
                if close.tok != Tok::Gt {
                    return Err(close.error("expected '>' after type argument"));
                }
                segment.type_arg = Some(ty);
            }
            if matches!(self.peek().tok, Tok::LParen) {
                segment.call = Some(self.parse_args()?);
            }
            segments.push(segment);
            if matches!(self.peek().tok, Tok::Dot) {
                self.bump();
            } else {
                return Ok(segments);
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Value>, SyntaxError> {
        let open = self.bump();
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek().tok, Tok::RParen) {
                self.bump();
                return Ok(args);
            }
            args.push(self.parse_value()?);
            self.skip_newlines();
            let token = self.bump();
            match token.tok {
                Tok::Comma => continue,
                Tok::RParen => return Ok(args),
                Tok::Eof => {
                    return Err(open.error(format!(
                        "'(' opened at line {} is never closed",
                        open.line
                    )))
                }
                ref other => {
                    return Err(token.error(format!(
                        "expected ',' or ')' in argument list, found {}",
                        other.describe()
                    )))
                }
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, SyntaxError> {
        let token = self.peek().clone();
        match &token.tok {
            Tok::Str(s) => {
                self.bump();
                Ok(Value::String(s.clone()))
            }
            Tok::Int(n) => {
                self.bump();
                Ok(Value::Integer(*n))
            }
            Tok::Ident(_) => {
                let segments = self.parse_path()?;
                type_path(segments, &token)
            }
            other => Err(token.error(format!("cannot type value: unexpected {}", other.describe()))),
        }
    }
}

/// Decide the [`Value`] variant of a path expression.
fn type_path(mut segments: Vec<Segment>, at: &Token) -> Result<Value, SyntaxError> {
    if segments.iter().any(|s| s.type_arg.is_some()) {
        return Err(at.error("cannot type value: type arguments are only allowed in block headers"));
    }

    if segments.len() == 1 {
        let Segment { name, call, .. } = segments.remove(0);
        return match (name.as_str(), call) {
            ("true", None) => Ok(Value::Boolean(true)),
            ("false", None) => Ok(Value::Boolean(false)),
            ("null", None) => Err(at.error("cannot type value: `null`")),
            (_, None) => Ok(Value::VersionRef(name.clone())),
            ("file", Some(args)) => match args.as_slice() {
                [Value::String(path)] => Ok(Value::FileRef(path.clone())),
                _ => Err(at.error("cannot type value: file() takes one string path")),
            },
            ("listOf" | "setOf" | "arrayOf" | "mutableListOf" | "mutableSetOf", Some(args)) => {
                Ok(Value::List(args))
            }
            (_, Some(args)) => Ok(Value::Call(Invocation::new(name.clone(), args))),
        };
    }

    if segments[0].name == "signingConfigs" && segments[0].call.is_none() {
        return match segments.as_slice() {
            [_, Segment { name, call: None, .. }] => Ok(Value::SigningRef(name.clone())),
            [_, Segment {
                name,
                call: Some(args),
                ..
            }] if matches!(name.as_str(), "getByName" | "named" | "getAt") => {
                match args.as_slice() {
                    [Value::String(label)] => Ok(Value::SigningRef(label.clone())),
                    _ => Err(at.error("cannot type signing reference: expected one string name")),
                }
            }
            _ => Err(at.error("cannot type signing reference")),
        };
    }

    let last_index = segments.len() - 1;
    if segments[..last_index]
        .iter()
        .any(|s| s.call.as_ref().is_some_and(|args| !args.is_empty()))
    {
        return Err(at.error("cannot type value: only the last call in a chain may take arguments"));
    }

    match segments[last_index].call.take() {
        Some(args) if !args.is_empty() => {
            Ok(Value::Call(Invocation::new(render_path(&segments), args)))
        }
        Some(_) => {
            let mut path = render_path(&segments);
            path.push_str("()");
            Ok(Value::VersionRef(path))
        }
        None => Ok(Value::VersionRef(render_path(&segments))),
    }
}

fn render_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&segment.name);
        if let Some(ty) = &segment.type_arg {
            out.push('<');
            out.push_str(ty);
            out.push('>');
        }
        if segment.call.is_some() {
            out.push_str("()");
        }
    }
    out
}

fn insert_block(node: &mut ConfigNode, child: ConfigNode, at: &Token) -> Result<(), SyntaxError> {
    let key = child.key().to_string();
    match node.get(&key) {
        None => {
            node.insert_block(child);
            Ok(())
        }
        Some(Value::Block(existing)) => {
            let merged = merge(existing, &child);
            node.insert_block(merged);
            Ok(())
        }
        Some(other) => Err(at.error(format!(
            "`{key}` is already assigned a {} and cannot also be a block",
            other.kind()
        ))),
    }
}

fn assign(
    node: &mut ConfigNode,
    keys: &[&str],
    value: Value,
    append: bool,
    at: &Token,
) -> Result<(), SyntaxError> {
    let (key, rest) = match keys {
        [] => return Err(at.error("empty assignment target")),
        [key, rest @ ..] => (*key, rest),
    };

    if !rest.is_empty() {
        if node.get(key).is_none() {
            node.insert_block(ConfigNode::new(key));
        }
        return match node.block_mut(key) {
            Some(child) => assign(child, rest, value, append, at),
            None => Err(at.error(format!("`{key}` is not a block"))),
        };
    }

    let append_error = || at.error(format!("`+=` needs list values on both sides of `{key}`"));
    match node.get_mut(key) {
        None => {
            node.set(key, value);
            Ok(())
        }
        Some(Value::List(items)) if append => match value {
            Value::List(more) => {
                items.extend(more);
                Ok(())
            }
            _ => Err(append_error()),
        },
        Some(_) if append => Err(append_error()),
        Some(_) => Err(at.error(format!("duplicate assignment to `{key}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_negative_and_grouped_integers() {
        let root = parse("a = -5\nb = 1_000").unwrap();
        assert_eq!(root.get("a"), Some(&Value::Integer(-5)));
        assert_eq!(root.get("b"), Some(&Value::Integer(1000)));
    }

    #[test]
    fn string_escapes() {
        let root = parse(r#"s = "a\"b\\c\$d""#).unwrap();
        assert_eq!(root.string("s"), Some("a\"b\\c$d"));
    }

    #[test]
    fn error_positions_are_one_based() {
        let err = parse("android {\n  minSdk = ?\n}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 12);
    }

    #[test]
    fn render_path_with_type_argument() {
        let segments = vec![
            Segment {
                name: "tasks".into(),
                type_arg: None,
                call: None,
            },
            Segment {
                name: "register".into(),
                type_arg: Some("Delete".into()),
                call: None,
            },
        ];
        assert_eq!(render_path(&segments), "tasks.register<Delete>");
    }
}
