//! # Macro Language - Abstract Syntax Tree
//!
//! A macro is a single expression. Function calls nest arbitrarily; every
//! other node is a leaf.
//!
//! ## Module Layout
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes and their parts
//! - **[visitor]** - Visitor trait and the two structural visitors
//! - **[program]** - The [`Macro`] wrapper returned by the parser
//! - **[source]** - Serialization back to macro text
//!
//! ## Syntax at a Glance
//!
//! ```text
//! @If(@Contain(%Subject, "invoice"),
//!     @Set('folder', "Billing"),
//!     @False())
//! ```
//!
//! | Form | Node |
//! |------|------|
//! | `"text"`, `'text'`, `<<TAG ... TAG` | [`Expr::Literal`] |
//! | `Subject`, `X-Mailer` | [`Expr::Field`] |
//! | `%Subject`, `%Size` | [`Expr::FieldCache`] |
//! | `42`, `-1` | [`Expr::Number`] |
//! | `/^re:/i` | [`Expr::Regex`] |
//! | `$name`, `$1` | [`Expr::Variable`] |
//! | `:MF_SEEN` | [`Expr::Constant`] |
//! | `@Name(args...)` | [`Expr::Function`] |
//!
//! Lines starting with `#` are comments.
pub mod expressions;
pub mod program;
pub mod source;
pub mod tokens;
pub mod visitor;

pub use expressions::{Expr, FieldCacheKind, FunctionCall, RegexLiteral, VariableRef};
pub use program::Macro;
pub use source::quote_literal;
pub use tokens::Token;
pub use visitor::{ExprKind, ExprTypeVisitor, ExprVisitor, FunctionNameVisitor};
