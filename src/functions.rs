//! Built-in functions.
//!
//! Each built-in receives its call node unevaluated and decides itself
//! which arguments to evaluate and when, so `@If`, `@And` and friends can
//! be lazy. Helpers on [`FunctionCall`] cover argument-count checks and
//! error reporting with the call's source text.

mod compare;
mod logic;
mod message;
mod text;
mod variables;

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;

use crate::ast::FunctionCall;
use crate::context::MacroContext;
use crate::error::{EvalError, EvalErrorCode, EvalResult};
use crate::message::MessageType;
use crate::parser::MacroKind;
use crate::value::Value;

pub type BuiltinFn = fn(&FunctionCall, &mut MacroContext<'_, '_>) -> EvalResult<Value>;

/// Registry entry for one built-in.
pub struct FunctionDef {
    /// Canonical spelling, used when serializing.
    pub name: &'static str,
    /// Macro kinds the function may appear in.
    pub kinds: MacroKind,
    /// Part of the message the function reads, if any.
    pub hint: Option<MessageType>,
    pub summary: &'static str,
    pub call: BuiltinFn,
}

impl FunctionDef {
    const fn new(name: &'static str, summary: &'static str, call: BuiltinFn) -> Self {
        FunctionDef {
            name,
            kinds: MacroKind::all(),
            hint: None,
            summary,
            call,
        }
    }

    const fn only_in(mut self, kinds: MacroKind) -> Self {
        self.kinds = kinds;
        self
    }

    const fn reads(mut self, hint: MessageType) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn is_restricted(&self) -> bool {
        self.kinds != MacroKind::all()
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .field("hint", &self.hint)
            .finish()
    }
}

static BUILTINS: &[FunctionDef] = &[
    // logic and control flow
    FunctionDef::new("And", "true if every argument is true", logic::and),
    FunctionDef::new("Or", "true if any argument is true", logic::or),
    FunctionDef::new("Not", "negation", logic::not),
    FunctionDef::new("If", "@If(cond, then, [cond, then, ...] else)", logic::if_),
    FunctionDef::new("True", "boolean true", logic::true_),
    FunctionDef::new("False", "boolean false", logic::false_),
    FunctionDef::new("Progn", "evaluates all arguments, returns the last", logic::progn),
    FunctionDef::new("While", "@While(cond, body)", logic::while_),
    FunctionDef::new("Catch", "@Catch(expr[, handler])", logic::catch),
    FunctionDef::new("Eval", "parses and evaluates text", logic::eval),
    FunctionDef::new("Exit", "stops evaluation", logic::exit),
    // variables and user functions
    FunctionDef::new("Set", "@Set(name, value[, global])", variables::set),
    FunctionDef::new("Variable", "@Variable(name[, default[, global]])", variables::variable),
    FunctionDef::new("Defun", "@Defun(name, body)", variables::defun),
    // comparison and arithmetic
    FunctionDef::new("Equal", "@Equal(lhs, rhs[, case])", compare::equal),
    FunctionDef::new("Contain", "@Contain(text, part[, case])", compare::contain),
    FunctionDef::new("BeginWith", "@BeginWith(text, prefix)", compare::begin_with),
    FunctionDef::new("RegexMatch", "@RegexMatch(text, regex)", compare::regex_match),
    FunctionDef::new("Less", "@Less(lhs, rhs[, case])", compare::less),
    FunctionDef::new("Greater", "@Greater(lhs, rhs[, case])", compare::greater),
    FunctionDef::new("Add", "sum of all arguments", compare::add),
    FunctionDef::new("Minus", "@Minus(lhs, rhs)", compare::minus),
    // text
    FunctionDef::new("Concat", "concatenates all arguments", text::concat),
    FunctionDef::new("Length", "length in characters", text::length),
    FunctionDef::new("Substring", "@Substring(text, begin[, length])", text::substring),
    // message
    FunctionDef::new("Seen", "message has been read", message::seen),
    FunctionDef::new("Replied", "message has been replied to", message::replied),
    FunctionDef::new("Forwarded", "message has been forwarded", message::forwarded),
    FunctionDef::new("Sent", "message was sent", message::sent),
    FunctionDef::new("Draft", "message is a draft", message::draft),
    FunctionDef::new("Marked", "message is marked", message::marked),
    FunctionDef::new("Deleted", "message is deleted", message::deleted),
    FunctionDef::new("Junk", "message is junk", message::junk),
    FunctionDef::new("Multipart", "message has attachments", message::multipart),
    FunctionDef::new("New", "message has not been read", message::new),
    FunctionDef::new("Flag", "@Flag(mask[, set])", message::flag),
    FunctionDef::new("Size", "@Size([text-only])", message::size),
    FunctionDef::new("Subject", "subject of the message", message::subject),
    FunctionDef::new("Id", "message id", message::id),
    FunctionDef::new("Date", "@Date([text])", message::date),
    FunctionDef::new("Header", "@Header([name])", message::header).reads(MessageType::Header),
    FunctionDef::new("Body", "body text", message::body).reads(MessageType::Text),
    FunctionDef::new("Passed", "@Passed(days)", message::passed),
    FunctionDef::new("Account", "current account name", message::account),
    FunctionDef::new("Folder", "current folder name", message::folder),
    FunctionDef::new("Delete", "marks the message deleted", message::delete)
        .only_in(MacroKind::MESSAGE.union(MacroKind::RULE)),
];

static BY_NAME: Lazy<HashMap<String, &'static FunctionDef>> = Lazy::new(|| {
    BUILTINS
        .iter()
        .map(|def| (def.name.to_ascii_lowercase(), def))
        .collect()
});

/// Result of resolving a function name for a macro kind.
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Builtin(&'static FunctionDef),
    /// A built-in that may not be used in this kind of macro.
    Restricted(&'static FunctionDef),
    /// Not a built-in; treated as a user-defined function.
    Unknown,
}

/// Case-insensitive lookup in the built-in registry.
pub fn lookup(name: &str, kind: MacroKind) -> Lookup {
    match BY_NAME.get(&name.to_ascii_lowercase()).copied() {
        Some(def) if def.kinds.intersects(kind) => Lookup::Builtin(def),
        Some(def) => Lookup::Restricted(def),
        None => Lookup::Unknown,
    }
}

pub fn builtins() -> &'static [FunctionDef] {
    BUILTINS
}

impl FunctionCall {
    /// Reports `code` with this call's source text.
    pub fn error(&self, ctx: &MacroContext<'_, '_>, code: EvalErrorCode) -> EvalError {
        ctx.error(code, &self.to_string())
    }

    /// Fails with `InvalidArgSize` unless the argument count is in `range`.
    pub fn check_args(
        &self,
        ctx: &MacroContext<'_, '_>,
        range: RangeInclusive<usize>,
    ) -> EvalResult<()> {
        if range.contains(&self.arg_count()) {
            Ok(())
        } else {
            Err(self.error(ctx, EvalErrorCode::InvalidArgSize))
        }
    }

    pub fn eval_arg(&self, n: usize, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
        match self.arg(n) {
            Some(expr) => expr.evaluate(ctx),
            None => Err(self.error(ctx, EvalErrorCode::InvalidArgSize)),
        }
    }

    /// Evaluates argument `n` as a boolean, or returns `default` if the call
    /// has fewer arguments.
    pub fn eval_flag(
        &self,
        n: usize,
        default: bool,
        ctx: &mut MacroContext<'_, '_>,
    ) -> EvalResult<bool> {
        if n < self.arg_count() {
            Ok(self.eval_arg(n, ctx)?.as_boolean())
        } else {
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        assert_eq!(BY_NAME.len(), BUILTINS.len());
    }

    #[test]
    fn test_restricted_lookup() {
        assert!(matches!(lookup("delete", MacroKind::RULE), Lookup::Builtin(_)));
        assert!(matches!(lookup("Delete", MacroKind::SEARCH), Lookup::Restricted(_)));
        assert!(matches!(lookup("MyHelper", MacroKind::SEARCH), Lookup::Unknown));
    }
}
