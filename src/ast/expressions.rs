use regex::Regex;

use crate::functions::FunctionDef;
use crate::message::MessageType;
use crate::value::build_regex;

/// Node of a parsed macro.
///
/// The tree is immutable once the parser hands it out; evaluation and
/// serialization only ever borrow it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant text
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// ```
    Literal(String),

    /// Header looked up by name on the current message
    ///
    /// # Examples
    /// ```text
    /// Subject
    /// X-Mailer
    /// ```
    Field(String),

    /// Fast-path message attribute (`%Subject`, `%Size`, ...)
    FieldCache(FieldCacheKind),

    /// Integer literal, optionally negative
    Number(i64),

    /// Boolean literal. Only produced through named constants
    /// (`:TRUE`, `:FALSE`).
    Boolean(bool),

    /// Regular expression literal
    ///
    /// # Examples
    /// ```text
    /// /^Re:/i
    /// ```
    Regex(RegexLiteral),

    /// Named variable (`$name`) or positional argument (`$1`)
    Variable(VariableRef),

    /// Named constant (`:MF_SEEN`) together with the expression it aliases
    Constant { name: &'static str, value: Box<Expr> },

    /// Call to a built-in or user-defined function
    ///
    /// # Examples
    /// ```text
    /// @Contain(%Subject, "report")
    /// @MyFunction($1, 2)
    /// ```
    Function(FunctionCall),
}

impl Expr {
    /// How much of a message evaluating this expression needs at most.
    ///
    /// `None` means the expression can be answered from the message holder
    /// alone (flags, cached fields) or does not touch the message at all.
    pub fn message_type_hint(&self) -> Option<MessageType> {
        match self {
            Expr::Field(_) => Some(MessageType::Header),
            Expr::Function(call) => {
                let own = call.definition().and_then(|def| def.hint);
                call.args()
                    .iter()
                    .map(Expr::message_type_hint)
                    .fold(own, |acc, hint| acc.max(hint))
            }
            _ => None,
        }
    }

    /// Name of the called function if this node is a call.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expr::Function(call) => Some(call.name()),
            _ => None,
        }
    }
}

/// Message attributes reachable through `%Name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCacheKind {
    Id,
    Date,
    From,
    To,
    FromTo,
    Subject,
    Size,
}

impl FieldCacheKind {
    pub const ALL: [FieldCacheKind; 7] = [
        FieldCacheKind::Id,
        FieldCacheKind::Date,
        FieldCacheKind::From,
        FieldCacheKind::To,
        FieldCacheKind::FromTo,
        FieldCacheKind::Subject,
        FieldCacheKind::Size,
    ];

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldCacheKind::Id => "ID",
            FieldCacheKind::Date => "Date",
            FieldCacheKind::From => "From",
            FieldCacheKind::To => "To",
            FieldCacheKind::FromTo => "FromTo",
            FieldCacheKind::Subject => "Subject",
            FieldCacheKind::Size => "Size",
        }
    }
}

/// A compiled regular expression literal.
///
/// Keeps the pattern and mode letters as written so the node can be
/// serialized back.
#[derive(Debug, Clone)]
pub struct RegexLiteral {
    pattern: String,
    flags: String,
    regex: Regex,
}

impl RegexLiteral {
    /// Compiles `pattern` with the mode letters in `flags` (`i`, `m`, `s`).
    /// Returns `None` for an unknown mode letter or an invalid pattern.
    pub fn new(pattern: &str, flags: &str) -> Option<Self> {
        let regex = build_regex(pattern, flags)?;
        Some(RegexLiteral {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for RegexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.flags == other.flags
    }
}

/// Target of a `$` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableRef {
    Named(String),
    /// Index into the current argument frame; `$0` is the function name.
    Argument(usize),
}

impl VariableRef {
    /// Classifies the text after `$`. All digits is a positional argument;
    /// a name that starts with a digit but continues otherwise is invalid.
    pub fn parse(name: &str) -> Option<Self> {
        match name.chars().next() {
            Some(c) if c.is_ascii_digit() => {
                if !name.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                name.parse().ok().map(VariableRef::Argument)
            }
            Some(_) => Some(VariableRef::Named(name.to_string())),
            None => None,
        }
    }
}

/// A function call node.
///
/// Built-in calls carry their registry entry and the canonical spelling of
/// the name. Anything the registry does not know is a call to a
/// user-defined function, resolved at evaluation time.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    name: String,
    definition: Option<&'static FunctionDef>,
    args: Vec<Expr>,
}

impl FunctionCall {
    pub fn builtin(definition: &'static FunctionDef, args: Vec<Expr>) -> Self {
        FunctionCall {
            name: definition.name.to_string(),
            definition: Some(definition),
            args,
        }
    }

    pub fn user(name: impl Into<String>, args: Vec<Expr>) -> Self {
        FunctionCall {
            name: name.into(),
            definition: None,
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> Option<&'static FunctionDef> {
        self.definition
    }

    pub fn is_builtin(&self) -> bool {
        self.definition.is_some()
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn arg(&self, n: usize) -> Option<&Expr> {
        self.args.get(n)
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.is_builtin() == other.is_builtin()
            && self.args == other.args
    }
}
