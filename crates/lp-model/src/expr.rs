//! Restricted arithmetic expressions for constants and transfer-function terms.
//!
//! The accepted language is deliberately small: numeric literals, names,
//! `+ - * /`, `**` (right associative), parentheses and a fixed set of math
//! functions. Bare names resolve through a [`Scope`] only. The built-in
//! constants live behind the `math.` prefix (`math.pi`, `math.e`, `math.tau`,
//! `math.inf`), so a user constant named `tau` is never shadowed. Functions
//! accept the prefix too, so model files written as `math.sqrt(2)` keep working.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub type ExprResult<T> = Result<T, ExprError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("Syntax error at byte {pos}: {what}")]
    Syntax { pos: usize, what: String },

    #[error("Unknown name: {name}")]
    UnknownName { name: String },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Non-finite result from {what}")]
    NonFinite { what: String },
}

/// Name lookup used during evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Scope for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// Scope with no names. Only `math.` constants resolve.
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    pub fn parse(src: &str) -> ExprResult<Expr> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            (Token::End, _) => Ok(expr),
            (tok, pos) => Err(ExprError::Syntax {
                pos,
                what: format!("unexpected {tok}"),
            }),
        }
    }

    pub fn eval(&self, scope: &dyn Scope) -> ExprResult<f64> {
        match self {
            Expr::Num(v) => Ok(*v),
            Expr::Name(name) => resolve_name(name, scope),
            Expr::Neg(inner) => Ok(-inner.eval(scope)?),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(scope)?;
                let b = rhs.eval(scope)?;
                let v = match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => {
                        if b == 0.0 {
                            return Err(ExprError::DivisionByZero);
                        }
                        a / b
                    }
                    BinOp::Pow => {
                        if a == 0.0 && b < 0.0 {
                            return Err(ExprError::DivisionByZero);
                        }
                        a.powf(b)
                    }
                };
                finite(v, || format!("{a} {op} {b}"))
            }
            Expr::Call(name, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval(scope))
                    .collect::<ExprResult<Vec<f64>>>()?;
                call(name, &values)
            }
        }
    }

    /// Every name referenced by the expression, functions excluded.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Num(_) => {}
            Expr::Name(n) => out.push(n),
            Expr::Neg(inner) => inner.collect_names(out),
            Expr::Binary(_, a, b) => {
                a.collect_names(out);
                b.collect_names(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_names(out)),
        }
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(src: &str, scope: &dyn Scope) -> ExprResult<f64> {
    Expr::parse(src)?.eval(scope)
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "**",
        })
    }
}

fn finite(v: f64, what: impl FnOnce() -> String) -> ExprResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ExprError::NonFinite { what: what() })
    }
}

fn builtin_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        "inf" => Some(f64::INFINITY),
        _ => None,
    }
}

fn resolve_name(name: &str, scope: &dyn Scope) -> ExprResult<f64> {
    if let Some(stripped) = name.strip_prefix("math.") {
        return builtin_constant(stripped).ok_or_else(|| ExprError::UnknownName {
            name: name.to_string(),
        });
    }
    scope.lookup(name).ok_or_else(|| ExprError::UnknownName {
        name: name.to_string(),
    })
}

fn call(name: &str, args: &[f64]) -> ExprResult<f64> {
    let bare = name.strip_prefix("math.").unwrap_or(name);
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity {
                name: bare.to_string(),
                expected,
                got: args.len(),
            })
        }
    };
    let one = |f: fn(f64) -> f64| -> ExprResult<f64> {
        arity("1", args.len() == 1)?;
        Ok(f(args[0]))
    };
    let two = |f: fn(f64, f64) -> f64| -> ExprResult<f64> {
        arity("2", args.len() == 2)?;
        Ok(f(args[0], args[1]))
    };

    let v = match bare {
        "sqrt" => one(f64::sqrt)?,
        "exp" => one(f64::exp)?,
        "log" => {
            arity("1 or 2", args.len() == 1 || args.len() == 2)?;
            if args.len() == 2 {
                args[0].ln() / args[1].ln()
            } else {
                args[0].ln()
            }
        }
        "log10" => one(f64::log10)?,
        "log2" => one(f64::log2)?,
        "sin" => one(f64::sin)?,
        "cos" => one(f64::cos)?,
        "tan" => one(f64::tan)?,
        "asin" => one(f64::asin)?,
        "acos" => one(f64::acos)?,
        "atan" => one(f64::atan)?,
        "atan2" => two(f64::atan2)?,
        "sinh" => one(f64::sinh)?,
        "cosh" => one(f64::cosh)?,
        "tanh" => one(f64::tanh)?,
        "fabs" | "abs" => one(f64::abs)?,
        "pow" => two(f64::powf)?,
        "hypot" => two(f64::hypot)?,
        "radians" => one(f64::to_radians)?,
        "degrees" => one(f64::to_degrees)?,
        "floor" => one(f64::floor)?,
        "ceil" => one(f64::ceil)?,
        "min" | "max" => {
            arity("at least 1", !args.is_empty())?;
            let init = args[0];
            if bare == "min" {
                args.iter().copied().fold(init, f64::min)
            } else {
                args.iter().copied().fold(init, f64::max)
            }
        }
        _ => {
            return Err(ExprError::UnknownFunction {
                name: name.to_string(),
            });
        }
    };
    finite(v, || format!("{bare}({args:?})"))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
    Comma,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "number {v}"),
            Token::Ident(s) => write!(f, "name '{s}'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Pow => f.write_str("'**'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::End => f.write_str("end of input"),
        }
    }
}

fn tokenize(src: &str) -> ExprResult<Vec<(Token, usize)>> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => out.push((Token::Plus, start)),
            b'-' => out.push((Token::Minus, start)),
            b'*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    i += 1;
                    out.push((Token::Pow, start));
                } else {
                    out.push((Token::Star, start));
                }
            }
            b'/' => out.push((Token::Slash, start)),
            b'(' => out.push((Token::LParen, start)),
            b')' => out.push((Token::RParen, start)),
            b',' => out.push((Token::Comma, start)),
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let text = &src[start..i];
                let v = text.parse::<f64>().map_err(|_| ExprError::Syntax {
                    pos: start,
                    what: format!("invalid number '{text}'"),
                })?;
                out.push((Token::Num(v), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                i = scan_ident(bytes, i);
                // Dotted names such as `math.pi` form a single identifier.
                while bytes.get(i) == Some(&b'.')
                    && bytes
                        .get(i + 1)
                        .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_')
                {
                    i = scan_ident(bytes, i + 1);
                }
                out.push((Token::Ident(src[start..i].to_string()), start));
                continue;
            }
            _ => {
                return Err(ExprError::Syntax {
                    pos: start,
                    what: format!("unexpected character '{}'", char::from(c)),
                });
            }
        }
        i += 1;
    }

    out.push((Token::End, src.len()));
    Ok(out)
}

fn scan_ident(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    i
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> (Token, usize) {
        self.tokens[self.pos.min(self.tokens.len() - 1)].clone()
    }

    fn advance(&mut self) -> (Token, usize) {
        let tok = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token) -> ExprResult<()> {
        let (tok, pos) = self.advance();
        if tok == want {
            Ok(())
        } else {
            Err(ExprError::Syntax {
                pos,
                what: format!("expected {want}, found {tok}"),
            })
        }
    }

    fn expr(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().0 {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().0 {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> ExprResult<Expr> {
        match self.peek().0 {
            Token::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Token::Plus => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> ExprResult<Expr> {
        let base = self.primary()?;
        if self.peek().0 == Token::Pow {
            self.advance();
            // Exponent may carry its own sign: 2 ** -1
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> ExprResult<Expr> {
        let (tok, pos) = self.advance();
        match tok {
            Token::Num(v) => Ok(Expr::Num(v)),
            Token::Ident(name) => {
                if self.peek().0 == Token::LParen {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek().0 != Token::RParen {
                        loop {
                            args.push(self.expr()?);
                            if self.peek().0 == Token::Comma {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(ExprError::Syntax {
                pos,
                what: format!("unexpected {other}"),
            }),
        }
    }
}
