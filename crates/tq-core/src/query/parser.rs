//! Recursive-descent parser for the query language.
//!
//! Precedence from loosest to tightest:
//!
//! ```text
//! alt     := pipe ("//" pipe)*
//! pipe    := cmp ("|" cmp)*
//! cmp     := postfix (cmpop literal)?
//! postfix := primary (".name" | "[" int "]" | "[" string "]" | "[]")*
//! primary := "." | ".name" | literal | "(" alt ")" | if-expr
//!          | "[" (alt ("," alt)*)? "]" | "{" pairs? "}"
//!          | "select" "(" alt ")" | name ("(" alt (";" alt)* ")")?
//! ```

use super::ast::{Expr, ObjectEntry};
use super::lexer::{parse_error, Lexer, Token, TokenKind};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Parse a query string into an expression tree.
///
/// The whole input must be consumed; trailing tokens are an error.
///
/// # Example
/// ```
/// use tq_core::query::{parse, Expr};
/// let expr = parse(".users[0]").unwrap();
/// assert_eq!(
///     expr,
///     Expr::Pipe(Box::new(Expr::Field("users".into())), Box::new(Expr::Index(0)))
/// );
/// ```
pub fn parse(query: &str) -> QueryResult<Expr> {
    let chars: Vec<char> = query.chars().collect();
    let tokens = Lexer::new(&chars).tokenize()?;
    let mut parser = Parser {
        chars: &chars,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_alt()?;
    if *parser.peek() != TokenKind::Eof {
        return Err(parser.error_here(format!(
            "unexpected {} after the end of the query",
            parser.peek().describe()
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    chars: &'a [char],
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &TokenKind {
        // The token list always ends with Eof, and bump never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> QueryResult<()> {
        if self.eat(kind) {
            return Ok(());
        }
        Err(self.error_here(format!(
            "expected {}, found {}",
            kind.describe(),
            self.peek().describe()
        )))
    }

    fn error_here(&self, message: impl Into<String>) -> QueryError {
        parse_error(self.chars, self.position(), message)
    }

    fn parse_alt(&mut self) -> QueryResult<Expr> {
        let first = self.parse_pipe()?;
        if *self.peek() != TokenKind::Alt {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.eat(&TokenKind::Alt) {
            alternatives.push(self.parse_pipe()?);
        }
        Ok(Expr::Alternative(alternatives))
    }

    fn parse_pipe(&mut self) -> QueryResult<Expr> {
        let mut left = self.parse_comparison()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.parse_comparison()?;
            left = Expr::Pipe(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> QueryResult<Expr> {
        let left = self.parse_postfix()?;
        let TokenKind::Cmp(op) = *self.peek() else {
            return Ok(left);
        };
        self.bump();
        let right = match self.peek().clone() {
            TokenKind::Number(n) => Value::Number(n),
            TokenKind::Str(s) => Value::String(s),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            other => {
                return Err(self.error_here(format!(
                    "'{op}' needs a literal on its right-hand side, found {}",
                    other.describe()
                )))
            }
        };
        self.bump();
        Ok(Expr::Comparison {
            op,
            left: Box::new(left),
            right,
        })
    }

    fn parse_postfix(&mut self) -> QueryResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().clone() {
                TokenKind::Field(name) => {
                    self.bump();
                    expr = chain(expr, Expr::Field(name));
                }
                TokenKind::LBracket => {
                    self.bump();
                    let suffix = self.parse_bracket_suffix()?;
                    expr = chain(expr, suffix);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// After `[` in postfix position: `]`, `<int>]` or `"<string>"]`.
    fn parse_bracket_suffix(&mut self) -> QueryResult<Expr> {
        let suffix = match self.peek().clone() {
            TokenKind::RBracket => Expr::Iterate,
            TokenKind::Number(n) if n.fract() == 0.0 => {
                self.bump();
                Expr::Index(n as i64)
            }
            TokenKind::Str(name) => {
                self.bump();
                Expr::Field(name)
            }
            other => {
                return Err(self.error_here(format!(
                    "expected an integer index, a string or ']', found {}",
                    other.describe()
                )))
            }
        };
        self.expect(&TokenKind::RBracket)?;
        Ok(suffix)
    }

    fn parse_primary(&mut self) -> QueryResult<Expr> {
        let start = self.position();
        let token = self.bump();
        match token.kind {
            TokenKind::Dot => Ok(Expr::Identity),
            TokenKind::Field(name) => Ok(Expr::Field(name)),
            TokenKind::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::LParen => {
                let inner = self.parse_alt()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_construct(),
            TokenKind::LBrace => self.parse_object_construct(),
            TokenKind::If => self.parse_if_rest(),
            TokenKind::Ident(name) if name == "select" => {
                self.expect(&TokenKind::LParen)?;
                let cond = self.parse_alt()?;
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::Select(Box::new(cond)))
            }
            TokenKind::Ident(name) => self.parse_call(name),
            other => Err(parse_error(
                self.chars,
                start,
                format!("expected an expression, found {}", other.describe()),
            )),
        }
    }

    fn parse_array_construct(&mut self) -> QueryResult<Expr> {
        let mut elements = Vec::new();
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::ArrayConstruct(elements));
        }
        elements.push(self.parse_alt()?);
        while self.eat(&TokenKind::Comma) {
            elements.push(self.parse_alt()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::ArrayConstruct(elements))
    }

    fn parse_object_construct(&mut self) -> QueryResult<Expr> {
        let mut entries = Vec::new();
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::ObjectConstruct(entries));
        }
        loop {
            let key = match self.peek().clone() {
                TokenKind::Ident(name) => name,
                TokenKind::Str(s) => s,
                other => {
                    return Err(self.error_here(format!(
                        "expected an object key, found {}",
                        other.describe()
                    )))
                }
            };
            self.bump();
            let value = if self.eat(&TokenKind::Colon) {
                Some(self.parse_alt()?)
            } else {
                None
            };
            entries.push(ObjectEntry { key, value });
            if self.eat(&TokenKind::RBrace) {
                return Ok(Expr::ObjectConstruct(entries));
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    /// Everything after `if` (or `elif`) up to and including `end`.
    fn parse_if_rest(&mut self) -> QueryResult<Expr> {
        let cond = self.parse_alt()?;
        self.expect(&TokenKind::Then)?;
        let then_branch = self.parse_alt()?;
        let else_branch = if self.eat(&TokenKind::Elif) {
            self.parse_if_rest()?
        } else if self.eat(&TokenKind::Else) {
            let branch = self.parse_alt()?;
            self.expect(&TokenKind::End)?;
            branch
        } else {
            return Err(self.error_here(format!(
                "expected 'elif' or 'else', found {}",
                self.peek().describe()
            )));
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// `name` or `name(arg; arg; ...)`.
    fn parse_call(&mut self, name: String) -> QueryResult<Expr> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) && !self.eat(&TokenKind::RParen) {
            args.push(self.parse_alt()?);
            while self.eat(&TokenKind::Semicolon) {
                args.push(self.parse_alt()?);
            }
            self.expect(&TokenKind::RParen)?;
        }
        Ok(Expr::FunctionCall { name, args })
    }
}

/// Append a postfix step, dropping a leading identity (`.[0]` is `Index(0)`).
fn chain(left: Expr, right: Expr) -> Expr {
    match left {
        Expr::Identity => right,
        left => Expr::Pipe(Box::new(left), Box::new(right)),
    }
}
