//! Boolean predicate expressions over named record fields.
//!
//! The grammar follows the query strings users already write for tabular
//! data:
//!
//! ```text
//! hit_distance_sc >= 400 and description in ['hit_into_play']
//! `launch speed` > 100 | ~(inning < 9)
//! 0 < plate_x <= 0.95
//! ```
//!
//! `&`, `|` and `~` are aliases of `and`, `or` and `not` and share their
//! precedence. Comparisons chain. Comparing against a list with `==` or `!=`
//! is the same as `in` or `not in`. Any comparison involving a null is false,
//! except `!=` and `not in`, which are true.

use std::cmp::Ordering;
use std::fmt;

use super::{Record, Value};
use crate::error::ValidationError;

/// A parsed predicate, ready to be evaluated against records.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    root: Expr,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Column(String),
    List(Vec<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        };
        f.write_str(s)
    }
}

impl Predicate {
    pub fn parse(text: &str) -> Result<Predicate, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidExpression {
            expression: text.to_string(),
            reason,
        };
        let tokens = tokenize(text).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.or_expr().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected {}", token)));
        }
        Ok(Predicate {
            source: text.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field names referenced by the expression, in order of first use.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_columns(&self.root, &mut out);
        out
    }

    /// Check every referenced field exists in `columns`.
    pub fn validate(&self, columns: &[String]) -> Result<(), ValidationError> {
        match self
            .columns()
            .into_iter()
            .find(|c| !columns.iter().any(|have| have.as_str() == *c))
        {
            Some(missing) => Err(ValidationError::UnknownField(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn evaluate(&self, record: &Record<'_>) -> Result<Value, ValidationError> {
        eval(&self.root, record)
    }

    /// Evaluate and require a boolean; a null result counts as no match.
    pub fn matches(&self, record: &Record<'_>) -> Result<bool, ValidationError> {
        match self.evaluate(record)? {
            Value::Bool(b) => Ok(b),
            v if v.is_null() => Ok(false),
            _ => Err(ValidationError::NonBooleanPredicate(self.source.clone())),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn collect_columns<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Column(name) => {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        Expr::List(items) => items.iter().for_each(|e| collect_columns(e, out)),
        Expr::Neg(e) | Expr::Not(e) => collect_columns(e, out),
        Expr::Arith(_, l, r) | Expr::And(l, r) | Expr::Or(l, r) => {
            collect_columns(l, out);
            collect_columns(r, out);
        }
        Expr::Compare(first, rest) => {
            collect_columns(first, out);
            for (_, e) in rest {
                collect_columns(e, out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lexing

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    And,
    Or,
    Not,
    In,
    True,
    False,
    None,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(i) => write!(f, "number {}", i),
            Token::Float(x) => write!(f, "number {}", x),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Ident(s) => write!(f, "name `{}`", s),
            Token::Op(op) => write!(f, "'{}'", op),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::In => f.write_str("'in'"),
            Token::True => f.write_str("'True'"),
            Token::False => f.write_str("'False'"),
            Token::None => f.write_str("'None'"),
        }
    }
}

const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "(", ")", "[", "]", ",", "&", "|",
    "~",
];

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            let mut is_float = false;
            while i < chars.len() {
                let ch = chars[i];
                if ch.is_ascii_digit() || ch == '_' {
                    i += 1;
                } else if ch == '.' && !is_float {
                    is_float = true;
                    i += 1;
                } else if (ch == 'e' || ch == 'E')
                    && chars
                        .get(i + 1)
                        .is_some_and(|n| n.is_ascii_digit() || *n == '-' || *n == '+')
                {
                    is_float = true;
                    i += 2;
                } else {
                    break;
                }
            }
            let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            let token = if is_float {
                literal.parse::<f64>().map(Token::Float).ok()
            } else {
                literal.parse::<i64>().map(Token::Int).ok()
            };
            tokens.push(token.ok_or_else(|| format!("invalid number '{}'", literal))?);
            continue;
        }

        if c == '\'' || c == '"' || c == '`' {
            let quote = c;
            let start = i;
            i += 1;
            let mut value = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(format!("unterminated quote starting at {}", start)),
                    Some('\\') if quote != '`' => {
                        if let Some(next) = chars.get(i + 1) {
                            value.push(*next);
                        }
                        i += 2;
                    }
                    Some(ch) if *ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(ch) => {
                        value.push(*ch);
                        i += 1;
                    }
                }
            }
            tokens.push(if quote == '`' {
                Token::Ident(value)
            } else {
                Token::Str(value)
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "in" => Token::In,
                "True" | "true" => Token::True,
                "False" | "false" => Token::False,
                "None" => Token::None,
                _ => Token::Ident(word),
            });
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                tokens.push(Token::Op(*op));
                i += op.len();
            }
            None => return Err(format!("unexpected character '{}' at {}", c, i)),
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parsing

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), String> {
        if self.eat_op(op) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(format!("expected '{}', found {}", op, token)),
            None => Err(format!("expected '{}' before end of expression", op)),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Or | Token::Op("|"))) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not_expr()?;
        while matches!(self.peek(), Some(Token::And | Token::Op("&"))) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, String> {
        let is_not = matches!(self.peek(), Some(Token::Not | Token::Op("~")))
            && !matches!(self.peek_at(1), Some(Token::In));
        if is_not {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.comparison()
    }

    fn cmp_op(&mut self) -> Option<CmpOp> {
        let op = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Not), Some(Token::In)) => {
                self.pos += 2;
                return Some(CmpOp::NotIn);
            }
            (Some(Token::In), _) => CmpOp::In,
            (Some(Token::Op("==")), _) => CmpOp::Eq,
            (Some(Token::Op("!=")), _) => CmpOp::Ne,
            (Some(Token::Op("<")), _) => CmpOp::Lt,
            (Some(Token::Op("<=")), _) => CmpOp::Le,
            (Some(Token::Op(">")), _) => CmpOp::Gt,
            (Some(Token::Op(">=")), _) => CmpOp::Ge,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let first = self.arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.cmp_op() {
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn arith(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat_op("+") {
                ArithOp::Add
            } else if self.eat_op("-") {
                ArithOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.term()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat_op("*") {
                ArithOp::Mul
            } else if self.eat_op("/") {
                ArithOp::Div
            } else if self.eat_op("%") {
                ArithOp::Rem
            } else {
                return Ok(lhs);
            };
            let rhs = self.unary()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat_op("-") {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat_op("+") {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(x)) => Ok(Expr::Literal(Value::Float(x))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::None) => Ok(Expr::Literal(Value::Null)),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::Op("[")) => Ok(Expr::List(self.items("]")?)),
            Some(Token::Op("(")) => {
                let first = self.or_expr()?;
                if self.eat_op(")") {
                    return Ok(first);
                }
                self.expect_op(",")?;
                let mut items = vec![first];
                items.extend(self.items(")")?);
                Ok(Expr::List(items))
            }
            Some(token) => Err(format!("unexpected {}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    /// Comma separated expressions up to `close`, allowing a trailing comma.
    fn items(&mut self, close: &str) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        loop {
            if self.eat_op(close) {
                return Ok(items);
            }
            items.push(self.or_expr()?);
            if !self.eat_op(",") {
                self.expect_op(close)?;
                return Ok(items);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation

fn eval(expr: &Expr, record: &Record<'_>) -> Result<Value, ValidationError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(name) => record
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownField(name.clone())),
        Expr::List(_) => Err(ValidationError::TypeMismatch(
            "a list can only appear on the right of `in` or `==`".to_string(),
        )),
        Expr::Neg(inner) => match eval(inner, record)? {
            Value::Int(i) => i.checked_neg().map(Value::Int).ok_or_else(|| {
                ValidationError::TypeMismatch(format!("cannot negate {} without overflow", i))
            }),
            Value::Float(x) => Ok(Value::Float(-x)),
            v if v.is_null() => Ok(Value::Null),
            v => Err(ValidationError::TypeMismatch(format!(
                "cannot negate a {}",
                v.type_name()
            ))),
        },
        Expr::Not(inner) => {
            let v = eval(inner, record)?;
            Ok(Value::Bool(!truthy(&v)?))
        }
        Expr::And(l, r) => {
            if !truthy(&eval(l, record)?)? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&eval(r, record)?)?))
        }
        Expr::Or(l, r) => {
            if truthy(&eval(l, record)?)? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&eval(r, record)?)?))
        }
        Expr::Arith(op, l, r) => arith(*op, eval(l, record)?, eval(r, record)?),
        Expr::Compare(first, rest) => {
            let mut lhs = eval(first, record)?;
            for (op, rhs_expr) in rest {
                if let Expr::List(items) = rhs_expr {
                    let items = items
                        .iter()
                        .map(|e| eval(e, record))
                        .collect::<Result<Vec<_>, _>>()?;
                    if !membership(*op, &lhs, &items)? {
                        return Ok(Value::Bool(false));
                    }
                    // A list cannot be the left side of a further comparison.
                    lhs = Value::Null;
                    continue;
                }
                let rhs = eval(rhs_expr, record)?;
                if !compare(*op, &lhs, &rhs)? {
                    return Ok(Value::Bool(false));
                }
                lhs = rhs;
            }
            Ok(Value::Bool(true))
        }
    }
}

fn truthy(value: &Value) -> Result<bool, ValidationError> {
    match value {
        Value::Bool(b) => Ok(*b),
        v if v.is_null() => Ok(false),
        v => Err(ValidationError::TypeMismatch(format!(
            "expected a boolean, found a {}",
            v.type_name()
        ))),
    }
}

fn membership(op: CmpOp, needle: &Value, items: &[Value]) -> Result<bool, ValidationError> {
    let found = !needle.is_null()
        && items
            .iter()
            .any(|item| needle.compare(item) == Some(Ordering::Equal));
    match op {
        CmpOp::In | CmpOp::Eq => Ok(found),
        CmpOp::NotIn | CmpOp::Ne => Ok(!found),
        other => Err(ValidationError::TypeMismatch(format!(
            "`{}` is not defined against a list",
            other
        ))),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, ValidationError> {
    if matches!(op, CmpOp::In | CmpOp::NotIn) {
        return Err(ValidationError::TypeMismatch(format!(
            "`{}` requires a list on the right",
            op
        )));
    }
    if lhs.is_null() || rhs.is_null() {
        return Ok(op == CmpOp::Ne);
    }
    let ord = lhs.compare(rhs);
    match op {
        CmpOp::Eq => Ok(ord == Some(Ordering::Equal)),
        CmpOp::Ne => Ok(ord != Some(Ordering::Equal)),
        _ => {
            let ord = ord.ok_or_else(|| {
                ValidationError::TypeMismatch(format!(
                    "cannot compare {} {} {}",
                    lhs.type_name(),
                    op,
                    rhs.type_name()
                ))
            })?;
            Ok(match op {
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }
    }
}

fn arith(op: ArithOp, lhs: Value, rhs: Value) -> Result<Value, ValidationError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }
    if let (ArithOp::Add, Value::Str(a), Value::Str(b)) = (op, &lhs, &rhs) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        let out = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => return Ok(Value::Float(a as f64 / b as f64)),
            ArithOp::Rem => a.checked_rem_euclid(b).map(|r| {
                // Result takes the sign of the divisor.
                if b < 0 && r != 0 {
                    r + b
                } else {
                    r
                }
            }),
        };
        return Ok(out.map(Value::Int).unwrap_or(Value::Null));
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::Float(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a - b * (a / b).floor(),
        })),
        _ => Err(ValidationError::TypeMismatch(format!(
            "cannot apply arithmetic to {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}
