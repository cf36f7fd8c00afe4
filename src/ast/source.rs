//! Re-serialization of expression trees back to macro text.
//!
//! The output re-parses to an equivalent tree: literal and regex escaping
//! inverts what the lexer does.

use std::fmt;

use crate::ast::expressions::{Expr, FunctionCall, RegexLiteral, VariableRef};

impl Expr {
    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => f.write_str(&quote_literal(value)),
            Expr::Field(name) => f.write_str(name),
            Expr::FieldCache(kind) => write!(f, "%{}", kind.name()),
            Expr::Number(n) => write!(f, "{}", n),
            // there is no boolean literal syntax
            Expr::Boolean(true) => f.write_str("@True()"),
            Expr::Boolean(false) => f.write_str("@False()"),
            Expr::Regex(regex) => write!(f, "{}", regex),
            Expr::Variable(VariableRef::Named(name)) => write!(f, "${}", name),
            Expr::Variable(VariableRef::Argument(n)) => write!(f, "${}", n),
            Expr::Constant { name, .. } => write!(f, ":{}", name),
            Expr::Function(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.name())?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for RegexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        f.write_str(&self.pattern().replace('/', "\\/"))?;
        write!(f, "/{}", self.flags())
    }
}

/// Single-quoted literal with `\n`, `\t`, `\\`, `\"` and `\'` escaped.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
