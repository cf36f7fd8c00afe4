use std::fmt;

use chrono::{DateTime, FixedOffset};
use regex::{Regex, RegexBuilder};

/// Format used when a time value is coerced to text.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// A runtime value produced by evaluating an expression.
///
/// Every value can be coerced to a boolean, a string and a number. The
/// coercions are total: they never fail and depend only on the value.
///
/// # Examples
///
/// ```
/// use qmacro::Value;
///
/// assert!(Value::string("x").as_boolean());
/// assert!(!Value::string("").as_boolean());
/// assert_eq!(Value::string("42").as_number(), 42);
/// assert_eq!(Value::Number(7).as_string(), "7");
/// assert_eq!(Value::Boolean(true).as_string(), "true");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),

    String(String),

    /// Unsigned integer; arithmetic wraps
    Number(u64),

    Time(DateTime<FixedOffset>),

    /// Pattern text plus its compiled form
    Regex(RegexValue),

    /// A header as fetched from a message. `value` is `None` when the
    /// message has no such header.
    Field(FieldValue),
}

#[derive(Debug, Clone)]
pub struct RegexValue {
    pub pattern: String,
    pub regex: Regex,
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<String>,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn empty() -> Self {
        Value::String(String::new())
    }

    pub fn field(name: impl Into<String>, value: Option<String>) -> Self {
        Value::Field(FieldValue {
            name: name.into(),
            value,
        })
    }

    pub fn regex(pattern: impl Into<String>, regex: Regex) -> Self {
        Value::Regex(RegexValue {
            pattern: pattern.into(),
            regex,
        })
    }

    /// Truth value used by conditions.
    pub fn as_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Time(_) => true,
            Value::Regex(r) => !r.pattern.is_empty(),
            Value::Field(f) => f.value.is_some(),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Time(t) => t.format(TIME_FORMAT).to_string(),
            Value::Regex(r) => r.pattern.clone(),
            Value::Field(f) => f.value.clone().unwrap_or_default(),
        }
    }

    /// Numeric coercion. Text that is not an integer becomes 0.
    pub fn as_number(&self) -> u64 {
        match self {
            Value::Boolean(b) => u64::from(*b),
            Value::Number(n) => *n,
            Value::Time(_) => 0,
            Value::String(s) => parse_number(s).unwrap_or(0),
            Value::Regex(r) => parse_number(&r.pattern).unwrap_or(0),
            Value::Field(f) => f.value.as_deref().and_then(parse_number).unwrap_or(0),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Time(_) => "time",
            Value::Regex(_) => "regex",
            Value::Field(_) => "field",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Whether `s` is an optionally negative run of decimal digits.
pub fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parses integer text. Negative numbers wrap into the unsigned range.
pub fn parse_number(s: &str) -> Option<u64> {
    if !is_number(s) {
        return None;
    }
    match s.parse::<i64>() {
        Ok(n) => Some(n as u64),
        Err(_) => s.parse::<u64>().ok(),
    }
}

/// Compiles a pattern with mode letters `i` (case-insensitive),
/// `m` (multi-line) and `s` (dot matches newline).
pub fn build_regex(pattern: &str, flags: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            _ => return None,
        };
    }
    builder.build().ok()
}
