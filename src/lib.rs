//! Interpreter for the mail client macro language.
//!
//! Source text is tokenized by [`Lexer`], turned into a [`Macro`] by
//! [`Parser`], and evaluated against a [`MacroContext`] to produce a
//! [`Value`]. [`ConditionFactory`] maps common macro shapes back to
//! structured conditions for rule editors.

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod condition;
pub mod constants;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod message;
pub mod parser;
pub mod value;

pub use ast::{Expr, Macro, Token};
pub use condition::{Combinator, Condition, ConditionFactory, ConditionList};
pub use context::{ContextFlags, GlobalContext, MacroContext, VariableHolder};
pub use error::{
    ErrorHandler, EvalError, EvalErrorCode, EvalResult, LexError, ParseError, ParseErrorCode,
    Position,
};
pub use lexer::Lexer;
pub use message::{MemoryMessage, Message, MessageFlags, MessageHolder, MessageType};
pub use parser::{MacroKind, Parser};
pub use value::Value;
