//! Tokenizer for the query language.
//!
//! Produces a flat list of positioned tokens. Because strings and brackets
//! are recognized here, the parser never has to re-scan text to find where
//! a nested construct or a quoted string ends.

use super::ast::CmpOp;
use crate::error::{QueryError, QueryResult};

/// Characters of query text shown in a parse error.
const SNIPPET_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A lone `.`
    Dot,
    /// `.name` or `."quoted name"`
    Field(String),
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Pipe,
    /// `//`
    Alt,
    Comma,
    Colon,
    Semicolon,
    Cmp(CmpOp),
    Number(f64),
    Str(String),
    Ident(String),
    If,
    Then,
    Elif,
    Else,
    End,
    True,
    False,
    Null,
    Eof,
}

impl TokenKind {
    /// Human-readable form used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Field(name) => format!("'.{name}'"),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::Alt => "'//'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Cmp(op) => format!("'{op}'"),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Str(s) => format!("string {s:?}"),
            TokenKind::Ident(name) => format!("'{name}'"),
            TokenKind::If => "'if'".to_string(),
            TokenKind::Then => "'then'".to_string(),
            TokenKind::Elif => "'elif'".to_string(),
            TokenKind::Else => "'else'".to_string(),
            TokenKind::End => "'end'".to_string(),
            TokenKind::True => "'true'".to_string(),
            TokenKind::False => "'false'".to_string(),
            TokenKind::Null => "'null'".to_string(),
            TokenKind::Eof => "end of query".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 0-based character offset of the token's first character.
    pub position: usize,
}

/// Build a parse error pointing at `position` in `source`.
pub(crate) fn parse_error(source: &[char], position: usize, message: impl Into<String>) -> QueryError {
    let start = position.min(source.len());
    let snippet: String = source[start..].iter().take(SNIPPET_LEN).collect();
    QueryError::Parse {
        position,
        snippet,
        message: message.into(),
    }
}

pub struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a [char]) -> Self {
        Lexer { chars, pos: 0 }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> QueryResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> QueryError {
        parse_error(self.chars, position, message)
    }

    fn next_token(&mut self) -> QueryResult<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.current_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
            });
        };

        let kind = match ch {
            '.' => {
                self.advance();
                match self.current_char() {
                    Some(c) if is_ident_start(c) => TokenKind::Field(self.read_ident()),
                    Some('"') => TokenKind::Field(self.read_string()?),
                    _ => TokenKind::Dot,
                }
            }
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '|' => self.single(TokenKind::Pipe),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            '/' if self.peek_char() == Some('/') => self.double(TokenKind::Alt),
            '=' if self.peek_char() == Some('=') => self.double(TokenKind::Cmp(CmpOp::Eq)),
            '!' if self.peek_char() == Some('=') => self.double(TokenKind::Cmp(CmpOp::Ne)),
            '<' if self.peek_char() == Some('=') => self.double(TokenKind::Cmp(CmpOp::Le)),
            '>' if self.peek_char() == Some('=') => self.double(TokenKind::Cmp(CmpOp::Ge)),
            '<' => self.single(TokenKind::Cmp(CmpOp::Lt)),
            '>' => self.single(TokenKind::Cmp(CmpOp::Gt)),
            '"' => TokenKind::Str(self.read_string()?),
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            c if c.is_ascii_digit() => self.read_number()?,
            c if is_ident_start(c) => keyword_or_ident(self.read_ident()),
            other => return Err(self.error(start, format!("unexpected character '{other}'"))),
        };

        Ok(Token {
            kind,
            position: start,
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while self.current_char().is_some_and(is_ident_char) {
            self.advance();
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Read `-?digits(.digits)?([eE][+-]?digits)?`.
    fn read_number(&mut self) -> QueryResult<TokenKind> {
        let start = self.pos;
        if self.current_char() == Some('-') {
            self.advance();
        }
        self.skip_digits();
        if self.current_char() == Some('.') && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.current_char(), Some('e' | 'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.current_char(), Some('+' | '-')) {
                self.advance();
            }
            if self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.skip_digits();
            } else {
                self.pos = mark;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(start, format!("invalid number '{text}'")))
    }

    fn skip_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Read a double-quoted string starting at the opening quote.
    fn read_string(&mut self) -> QueryResult<String> {
        let start = self.pos;
        self.advance();
        let mut out = String::new();
        loop {
            match self.current_char() {
                None => return Err(self.error(start, "unterminated string")),
                Some('"') => {
                    self.advance();
                    return Ok(out);
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some('"') => out.push('"'),
                        Some('\\') => out.push('\\'),
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                        None => return Err(self.error(start, "unterminated string")),
                    }
                    self.advance();
                }
                Some(c) => {
                    out.push(c);
                    self.advance();
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword_or_ident(word: String) -> TokenKind {
    match word.as_str() {
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "end" => TokenKind::End,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => TokenKind::Ident(word),
    }
}
