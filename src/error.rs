//! Error types shared by the tokenizer, parser and evaluator.
//!
//! Malformed macros and failed evaluations are ordinary, user-facing
//! conditions: nothing here is fatal. Parse errors abort the whole parse,
//! evaluation errors propagate up the tree as `Err` until a catching
//! construct (`@Catch`) swallows them.

use std::fmt;

/// Location of a token in the macro source.
///
/// `offset` counts characters from the start of the source; `line` and
/// `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Position {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// What went wrong while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("unterminated regular expression")]
    UnterminatedRegex,
    #[error("escape character at end of input")]
    DanglingEscape,
    #[error("here-document without a tag")]
    EmptyHeredocTag,
    #[error("here-document without a terminating tag line")]
    UnterminatedHeredoc,
    #[error("unexpected character")]
    EmptyToken,
}

/// A tokenizer failure (the `TOKEN_ERROR` token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {position}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

/// Parse error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseErrorCode {
    #[error("syntax error")]
    SyntaxError,
    #[error("macro contains more than one expression")]
    MacroContainsMoreThanOneExpr,
    #[error("invalid function name")]
    InvalidFunctionName,
    #[error("function without parenthesis")]
    FunctionWithoutParenthesis,
    #[error("invalid variable name")]
    InvalidVariableName,
    #[error("invalid constant name")]
    InvalidConstantName,
    #[error("invalid field name")]
    InvalidFieldName,
    #[error("invalid regular expression")]
    InvalidRegex,
}

/// A failed parse. Carries the position where the offending token began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{code} at {position}")]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub position: Position,
}

impl ParseError {
    pub fn new(code: ParseErrorCode, position: Position) -> Self {
        ParseError { code, position }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::new(ParseErrorCode::SyntaxError, e.position)
    }
}

/// Evaluation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum EvalErrorCode {
    #[error("evaluation failed")]
    Fail,
    #[error("invalid number of arguments")]
    InvalidArgSize,
    #[error("invalid argument type")]
    InvalidArgType,
    #[error("invalid argument value")]
    InvalidArgValue,
    #[error("no context message")]
    NoContextMessage,
    #[error("no context message holder")]
    NoContextMessageHolder,
    #[error("unknown function")]
    UnknownFunction,
    #[error("context does not allow modification")]
    ReadOnlyContext,
    #[error("exit requested")]
    Exit,
}

/// A failed evaluation step.
///
/// `text` is the re-serialized source of the node that failed, so that the
/// user can see which part of a macro went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {text}")]
pub struct EvalError {
    pub code: EvalErrorCode,
    pub text: String,
}

impl EvalError {
    pub fn new(code: EvalErrorCode, text: impl Into<String>) -> Self {
        EvalError {
            code,
            text: text.into(),
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Observer for parse and evaluation errors.
///
/// Purely observational: implementations never change control flow. Both
/// methods default to doing nothing.
pub trait ErrorHandler {
    fn parse_error(&self, _code: ParseErrorCode, _position: Position) {}

    fn evaluation_error(&self, _code: EvalErrorCode, _source: &str) {}
}
