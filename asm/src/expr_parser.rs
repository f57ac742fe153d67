//! Parser for the meta-syntax expression sublanguage:
//!
//! ```text
//! expr := literal | register_name | 'pc'
//!       | 'm' '[' expr ',' type_tag ']'
//!       | name '(' expr (',' expr)* ')'
//! ```
//!
//! Grounded in the original implementation's hand-rolled tokenizer+parser
//! (`re.findall` over identifiers/literals/punctuation, then a recursive
//! `parse_next` closure) rather than a grammar crate.

use once_cell::sync::Lazy;
use regex::Regex;

use vcpu::expr::Expr;
use vcpu::memory::TypeTag;
use vcpu::register;

use crate::error::ParseError;
use crate::int_lit::parse_int_literal;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z_]\w*|0[xX][0-9a-fA-F]+|0[bB][01]+|-?\d+|[(),\[\]]").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(text: &str) -> Vec<Token> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| {
            let s = m.as_str();
            match s {
                "(" => Token::LParen,
                ")" => Token::RParen,
                "[" => Token::LBracket,
                "]" => Token::RBracket,
                "," => Token::Comma,
                _ => match parse_int_literal(s) {
                    Some(n) => Token::Number(n),
                    None => Token::Ident(s.to_string()),
                },
            }
        })
        .collect()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
    source: &'a str,
}

/// Parses a full expression from `text`, failing if anything is left over
/// afterward (trailing garbage is a parse error).
pub fn parse_expression(text: &str, line: usize) -> Result<Expr, ParseError> {
    let tokens = tokenize(text);
    let mut parser = Parser {
        tokens,
        pos: 0,
        line,
        source: text,
    };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.err("trailing tokens after expression"));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn err(&self, reason: &str) -> ParseError {
        ParseError::InvalidExpression {
            line: self.line,
            reason: format!("{} (in `{}`)", reason, self.source),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        match self.next() {
            Some(ref t) if t == expected => Ok(()),
            _ => Err(self.err(&format!("expected {:?}", expected))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(n as u32)),
            Some(Token::Ident(name)) => self.parse_ident(&name),
            _ => Err(self.err("expected a value or function call")),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<Expr, ParseError> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "pc" => Ok(Expr::PcAccess),
            "m" => self.parse_mem_access(),
            "eq" | "ne" | "lt" | "gt" | "le" | "ge" | "add" | "sub" | "mul" | "div" | "mod" => {
                let (a, b) = self.parse_binary_args()?;
                Ok(build_binary(&lower, a, b))
            }
            "and" | "or" => {
                let (a, b) = self.parse_binary_args()?;
                Ok(if lower == "and" {
                    Expr::And(Box::new(a), Box::new(b))
                } else {
                    Expr::Or(Box::new(a), Box::new(b))
                })
            }
            "not" => {
                self.expect(&Token::LParen)?;
                let a = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Not(Box::new(a)))
            }
            _ => match register::resolve(name) {
                Ok(idx) => Ok(Expr::RegAccess(idx)),
                Err(_) => Err(self.err(&format!("unknown identifier '{}'", name))),
            },
        }
    }

    fn parse_mem_access(&mut self) -> Result<Expr, ParseError> {
        self.expect(&Token::LBracket)?;
        let addr = self.parse_expr()?;
        self.expect(&Token::Comma)?;
        let tag_name = match self.next() {
            Some(Token::Ident(t)) => t,
            _ => return Err(self.err("expected a type tag")),
        };
        let tag: TypeTag = tag_name
            .parse()
            .map_err(|_| self.err(&format!("unknown type tag '{}'", tag_name)))?;
        self.expect(&Token::RBracket)?;
        Ok(Expr::MemAccess(Box::new(addr), tag))
    }

    fn parse_binary_args(&mut self) -> Result<(Expr, Expr), ParseError> {
        self.expect(&Token::LParen)?;
        let a = self.parse_expr()?;
        self.expect(&Token::Comma)?;
        let b = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        Ok((a, b))
    }
}

fn build_binary(name: &str, a: Expr, b: Expr) -> Expr {
    let (a, b) = (Box::new(a), Box::new(b));
    match name {
        "eq" => Expr::Eq(a, b),
        "ne" => Expr::Ne(a, b),
        "lt" => Expr::Lt(a, b),
        "gt" => Expr::Gt(a, b),
        "le" => Expr::Le(a, b),
        "ge" => Expr::Ge(a, b),
        "add" => Expr::Add(a, b),
        "sub" => Expr::Sub(a, b),
        "mul" => Expr::Mul(a, b),
        "div" => Expr::Div(a, b),
        "mod" => Expr::Mod(a, b),
        _ => unreachable!("dispatched only for recognized binary function names"),
    }
}
