//! Formula-capable numeric fields.
//!
//! A formula is a small arithmetic expression over numbers, named variables,
//! the constants `pi` and `e`, and a handful of one-argument functions:
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := atom (('^' | '**') unary)?
//! atom  := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//!
//! Variables live in a [`Variables`] mapping owned by the project tree and
//! passed in by reference; there is no process-wide variable table.

use std::collections::BTreeMap;
use std::fmt;

use logos::Logos;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named numeric values available to formulas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, f64>);

impl Variables {
    /// Create an empty mapping.
    pub const fn new() -> Self {
        Variables(BTreeMap::new())
    }

    /// Value of `name`, if defined.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Define or overwrite `name`, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    /// Remove `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.remove(name)
    }

    /// True if `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of defined variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no variable is defined.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for Variables {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Variables(iter.into_iter().collect())
    }
}

/// Errors from parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FormulaError {
    /// The text is not a well-formed expression.
    #[error("invalid formula: {0}")]
    Parse(String),

    /// A symbol has no value in the variables mapping.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Evaluation produced NaN or an infinity.
    #[error("formula does not evaluate to a finite number")]
    NonFinite,
}

/// Evaluates formula text against a variables mapping.
pub trait FormulaEvaluator: Send + Sync {
    /// Evaluate `expr` with the given variables.
    fn evaluate(&self, expr: &str, variables: &Variables) -> Result<f64, FormulaError>;
}

/// The built-in evaluator for the grammar in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEvaluator;

impl FormulaEvaluator for ExprEvaluator {
    fn evaluate(&self, expr: &str, variables: &Variables) -> Result<f64, FormulaError> {
        Expr::parse(expr)?.eval(variables)
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    #[token("**")]
    Power,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

/// One-argument functions callable from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Function::Sqrt,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "abs" => Function::Abs,
            _ => return None,
        })
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sqrt => x.sqrt(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Abs => x.abs(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Abs => "abs",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal or named constant.
    Number(f64),
    /// Variable reference.
    Symbol(String),
    /// Negation.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Function call.
    Call(Function, Box<Expr>),
}

impl Expr {
    /// Parse formula text.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(source);
        while let Some(result) = lexer.next() {
            match result {
                Ok(token) => tokens.push(token),
                Err(()) => {
                    return Err(FormulaError::Parse(format!(
                        "unexpected '{}'",
                        lexer.slice()
                    )));
                }
            }
        }
        if tokens.is_empty() {
            return Err(FormulaError::Parse("empty expression".into()));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(FormulaError::Parse("formula too long".into()));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::Parse(format!("unexpected {token:?}")));
        }
        Ok(expr)
    }

    /// Evaluate with the given variables. The first unknown symbol, in
    /// left-to-right order, is reported.
    pub fn eval(&self, variables: &Variables) -> Result<f64, FormulaError> {
        let value = self.eval_inner(variables)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    fn eval_inner(&self, variables: &Variables) -> Result<f64, FormulaError> {
        Ok(match self {
            Expr::Number(v) => *v,
            Expr::Symbol(name) => variables
                .get(name)
                .ok_or_else(|| FormulaError::UnknownVariable(name.clone()))?,
            Expr::Neg(e) => -e.eval_inner(variables)?,
            Expr::Binary(op, a, b) => {
                let a = a.eval_inner(variables)?;
                let b = b.eval_inner(variables)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(f, arg) => f.apply(arg.eval_inner(variables)?),
        })
    }

    /// Symbols referenced by the expression, in order of first appearance.
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Neg(e) | Expr::Call(_, e) => e.collect_symbols(out),
            Expr::Binary(_, a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{v}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Neg(e) => write!(f, "-({e})"),
            Expr::Binary(op, a, b) => {
                let sym = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::Pow => "^",
                };
                write!(f, "({a} {sym} {b})")
            }
            Expr::Call(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}

/// Deepest nesting of parentheses, calls and prefix signs a formula may use.
const MAX_DEPTH: usize = 256;
/// Bounds the depth of operator chains, which parse iteratively.
const MAX_TOKENS: usize = 4096;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::Parse("formula nested too deeply".into()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.nested(Self::unary)?)));
        }
        if self.eat(&Token::Plus) {
            return self.nested(Self::unary);
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.atom()?;
        if self.eat(&Token::Power) {
            let exponent = self.nested(Self::unary)?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let func = Function::from_name(&name)
                        .ok_or_else(|| FormulaError::Parse(format!("unknown function '{name}'")))?;
                    let arg = self.nested(Self::expr)?;
                    if !self.eat(&Token::RParen) {
                        return Err(FormulaError::Parse(format!("missing ')' after {name}(")));
                    }
                    return Ok(Expr::Call(func, Box::new(arg)));
                }
                Ok(match name.as_str() {
                    "pi" => Expr::Number(std::f64::consts::PI),
                    "e" => Expr::Number(std::f64::consts::E),
                    _ => Expr::Symbol(name),
                })
            }
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                if !self.eat(&Token::RParen) {
                    return Err(FormulaError::Parse("missing ')'".into()));
                }
                Ok(inner)
            }
            Some(token) => Err(FormulaError::Parse(format!("unexpected {token:?}"))),
            None => Err(FormulaError::Parse("unexpected end of formula".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn eval(src: &str) -> Result<f64, FormulaError> {
        ExprEvaluator.evaluate(src, &Variables::new())
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(eval("-2 ** 2").unwrap(), -4.0);
        assert_eq!(eval("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn test_constants_and_functions() {
        assert!((eval("2*pi").unwrap() - 2.0 * PI).abs() < 1e-12);
        assert!((eval("sqrt(16) + abs(-1)").unwrap() - 5.0).abs() < 1e-12);
        assert!((eval("cos(0)").unwrap() - 1.0).abs() < 1e-12);
        assert!((eval(".5e1").unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_variables() {
        let mut vars = Variables::new();
        vars.set("chi", 0.25);
        vars.set("kappa", 2.0);
        let v = ExprEvaluator.evaluate("chi * kappa + 1", &vars).unwrap();
        assert!((v - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_reports_first_symbol() {
        let err = eval("omega + delta").unwrap_err();
        assert_eq!(err, FormulaError::UnknownVariable("omega".into()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(eval(""), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("1 +"), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("(1 + 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("foo(1)"), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("1 $ 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(eval("1 2"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&shallow).unwrap(), 1.0);

        let too_deep = FormulaError::Parse("formula nested too deeply".into());
        let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(eval(&deep).unwrap_err(), too_deep);
        let signs = format!("{}1", "-".repeat(300));
        assert_eq!(eval(&signs).unwrap_err(), too_deep);
        let calls = format!("{}1{}", "abs(".repeat(300), ")".repeat(300));
        assert_eq!(eval(&calls).unwrap_err(), too_deep);

        let huge = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(eval(&huge), Err(FormulaError::Parse(_))));

        let chain = vec!["1"; 100_000].join("+");
        assert_eq!(
            eval(&chain).unwrap_err(),
            FormulaError::Parse("formula too long".into())
        );
        assert_eq!(eval(&vec!["1"; 1000].join("+")).unwrap(), 1000.0);
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(eval("1 / 0").unwrap_err(), FormulaError::NonFinite);
    }

    #[test]
    fn test_symbols() {
        let expr = Expr::parse("a * sin(b) + a / c").unwrap();
        assert_eq!(expr.symbols(), vec!["a", "b", "c"]);
    }
}
