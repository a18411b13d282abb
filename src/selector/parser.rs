//! Selector recursive descent parser.
//!
//! Parses token streams into a [`SelectorExpr`]. Supports:
//! - comma-separated clauses (empty clauses are dropped)
//! - `!` exclusion, `+`/`@` graph operators with optional depth
//! - `*`, `tag:`, `config.materialized:`, `path:`, bare paths and names

use std::borrow::Cow;

use crate::{Error, Result};
use crate::model::Materialization;
use super::ast::*;
use super::lexer::{Token, TokenKind};

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &'t Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> &'t Token {
        let tok = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_clause_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Comma | TokenKind::Eof)
    }

    fn error(&self, msg: String) -> Error {
        error_at(self.peek().span.start, msg)
    }
}

fn error_at(position: usize, message: String) -> Error {
    Error::InvalidSelectorSyntax { position, message }
}

/// Parse a complete selection expression from tokens.
pub fn parse_expression(tokens: &[Token]) -> Result<SelectorExpr> {
    let mut p = Parser::new(tokens);
    let mut clauses = Vec::new();

    loop {
        // Leading, trailing and doubled commas produce empty clauses.
        while p.eat(TokenKind::Comma) {}
        if p.at(TokenKind::Eof) {
            break;
        }

        clauses.push(parse_clause(&mut p)?);

        match p.peek_kind() {
            TokenKind::Comma | TokenKind::Eof => {}
            TokenKind::Plus | TokenKind::At => {
                return Err(p.error(format!(
                    "Graph operator '{}' must come before the selector",
                    p.peek().text
                )));
            }
            TokenKind::Bang => {
                return Err(p.error("'!' must start a clause".into()));
            }
            _ => {
                return Err(p.error(format!("Expected ',' between selectors, got '{}'", p.peek().text)));
            }
        }
    }

    Ok(SelectorExpr { clauses })
}

// ============================================================================
// Clause parsing
// ============================================================================

fn parse_clause(p: &mut Parser) -> Result<Clause> {
    let start = p.peek().span.start;
    let negated = p.eat(TokenKind::Bang);
    if p.at(TokenKind::Bang) {
        return Err(p.error("Unknown prefix '!!'".into()));
    }

    let mut children = None;
    let mut parents = None;
    // Depth token of the operator written last, if it had one.
    let mut last_depth: Option<(Operator, &Token)> = None;

    loop {
        match p.peek_kind() {
            TokenKind::Plus => {
                p.advance();
                if children.is_some() {
                    return Err(error_at(start, format!("Unknown prefix in '{}'", clause_text(p, start))));
                }
                let (depth, tok) = parse_depth(p)?;
                children = Some(depth);
                last_depth = tok.map(|t| (Operator::Children, t));
            }
            TokenKind::At => {
                p.advance();
                if parents.is_some() {
                    return Err(error_at(start, format!("Unknown prefix in '{}'", clause_text(p, start))));
                }
                let (depth, tok) = parse_depth(p)?;
                parents = Some(depth);
                last_depth = tok.map(|t| (Operator::Parents, t));
            }
            TokenKind::Bang => {
                return Err(p.error("'!' must come before graph operators".into()));
            }
            _ => break,
        }
    }

    if p.at_clause_end() {
        return Err(p.error("Empty selector".into()));
    }

    let tok = p.advance();
    if tok.kind != TokenKind::Atom {
        return Err(error_at(tok.span.start, format!("Expected selector, got '{}'", tok.text)));
    }
    let method = parse_method(tok)?;

    let flush = match (last_depth, &method) {
        (Some((operator, depth)), SelectorMethod::Name(_)) if depth.span.end == tok.span.start => {
            Some(FlushDepth { operator, digits: depth.text.clone() })
        }
        _ => None,
    };

    Ok(Clause { method, children, parents, negated, flush })
}

fn parse_depth<'t>(p: &mut Parser<'t>) -> Result<(ExpandDepth, Option<&'t Token>)> {
    if !p.at(TokenKind::Depth) {
        return Ok((ExpandDepth::Unbounded, None));
    }
    let tok = p.advance();
    let depth = tok
        .text
        .parse::<usize>()
        .map_err(|_| error_at(tok.span.start, format!("Invalid depth '{}'", tok.text)))?;
    Ok((ExpandDepth::Max(depth), Some(tok)))
}

/// Source text of the tokens consumed since `start`, for error messages.
fn clause_text(p: &Parser, start: usize) -> String {
    p.tokens[..p.pos]
        .iter()
        .filter(|t| t.span.start >= start)
        .map(|t| t.text.as_str())
        .collect()
}

// ============================================================================
// Method classification
// ============================================================================

const TAG: &str = "tag:";
const CONFIG_MATERIALIZED: &str = "config.materialized:";
const PATH: &str = "path:";

fn parse_method(tok: &Token) -> Result<SelectorMethod> {
    let text = tok.text.as_str();
    let at = tok.span.start;

    if text == "*" {
        return Ok(SelectorMethod::All);
    }
    if text.contains('*') {
        return Err(error_at(at, format!("Wildcard is only supported on its own, got '{text}'")));
    }

    if let Some(tag) = text.strip_prefix(TAG) {
        let tag = required_value(TAG, tag, at)?;
        return Ok(SelectorMethod::Tag(tag.to_string()));
    }
    if let Some(kind) = text.strip_prefix(CONFIG_MATERIALIZED) {
        let kind = required_value(CONFIG_MATERIALIZED, kind, at)?;
        return Ok(SelectorMethod::ConfigMaterialized(kind.parse::<Materialization>()?));
    }
    if let Some(prefix) = text.strip_prefix(PATH) {
        let prefix = required_value(PATH, prefix, at)?;
        return path_method(prefix, at);
    }

    if let Some((method, _)) = text.split_once(':') {
        return Err(error_at(at, format!("Unknown selector method '{method}'")));
    }
    if text.contains('/') {
        return path_method(text, at);
    }

    Ok(SelectorMethod::Name(text.to_string()))
}

fn required_value<'a>(method: &str, value: &'a str, at: usize) -> Result<&'a str> {
    if value.is_empty() {
        Err(error_at(at, format!("'{method}' requires a value")))
    } else {
        Ok(value)
    }
}

fn path_method(raw: &str, at: usize) -> Result<SelectorMethod> {
    let prefix = normalize_path(raw);
    if prefix.is_empty() {
        return Err(error_at(at, format!("Empty path in '{raw}'")));
    }
    Ok(SelectorMethod::Path(prefix.to_string()))
}

/// Use `/` separators and strip a leading `./` and trailing `/` so prefixes
/// compare segment-wise. Manifests written on Windows use `\`.
pub fn normalize_path(raw: &str) -> Cow<'_, str> {
    if raw.contains('\\') {
        Cow::Owned(trim_path(&raw.replace('\\', "/")).to_string())
    } else {
        Cow::Borrowed(trim_path(raw))
    }
}

fn trim_path(raw: &str) -> &str {
    let mut path = raw;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/')
}
