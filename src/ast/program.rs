use std::fmt;

use crate::ast::Expr;
use crate::message::MessageType;
use crate::parser::MacroKind;

/// A parsed macro: exactly one root expression plus the kind it was parsed
/// as.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    root: Expr,
    kind: MacroKind,
}

impl Macro {
    pub fn new(root: Expr, kind: MacroKind) -> Self {
        Macro { root, kind }
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn kind(&self) -> MacroKind {
        self.kind
    }

    pub fn into_root(self) -> Expr {
        self.root
    }

    pub fn to_source(&self) -> String {
        self.root.to_source()
    }

    /// See [`Expr::message_type_hint`].
    pub fn message_type_hint(&self) -> Option<MessageType> {
        self.root.message_type_hint()
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
