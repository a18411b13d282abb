//! Selector lexer — tokenizes a selection expression.

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Byte span in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comma,
    Bang,       // !
    Plus,       // +
    At,         // @
    Depth,      // digits directly after + or @
    Atom,       // method, name or path

    Eof,
}

/// Characters that may appear inside an atom.
pub fn is_atom_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/' | '*')
}

/// Tokenize a selection expression.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }

            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, pos, ",")); }
            '!' => { chars.next(); tokens.push(punct(TokenKind::Bang, pos, "!")); }

            '+' | '@' => {
                chars.next();
                let kind = if ch == '+' { TokenKind::Plus } else { TokenKind::At };
                tokens.push(punct(kind, pos, if ch == '+' { "+" } else { "@" }));

                // +2model, +2 model: a digit run is a depth only if the clause
                // goes on. +2020 on its own is the model named 2020. Whether
                // flush digits belong to the name is decided against the graph.
                let start = pos + 1;
                let digits: String = input[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
                if !digits.is_empty() {
                    let follows = input[start + digits.len()..].trim_start().chars().next();
                    if follows.is_some_and(|c| is_atom_char(c) || c == '+' || c == '@') {
                        for _ in 0..digits.len() {
                            chars.next();
                        }
                        tokens.push(Token {
                            kind: TokenKind::Depth,
                            span: Span { start, end: start + digits.len() },
                            text: digits,
                        });
                    }
                }
            }

            c if is_atom_char(c) => {
                let start = pos;
                let mut atom = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_atom_char(c) {
                        atom.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Atom,
                    span: Span { start, end: start + atom.len() },
                    text: atom,
                });
            }

            other => {
                return Err(Error::InvalidSelectorSyntax {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}
