//! Named constants reachable through `:NAME`.
//!
//! The registry is built once and never changes. Names are matched
//! case-insensitively; the table keeps the canonical spelling used when a
//! constant is serialized back.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::Expr;
use crate::message::MessageFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantValue {
    Number(u64),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedConstant {
    pub name: &'static str,
    pub value: ConstantValue,
}

impl NamedConstant {
    const fn number(name: &'static str, n: u64) -> Self {
        NamedConstant {
            name,
            value: ConstantValue::Number(n),
        }
    }

    const fn flag(name: &'static str, flag: MessageFlags) -> Self {
        Self::number(name, flag.bits() as u64)
    }

    /// The constant node the parser inserts for `:NAME`.
    pub fn to_expr(&self) -> Expr {
        let value = match self.value {
            ConstantValue::Number(n) => Expr::Number(n as i64),
            ConstantValue::Boolean(b) => Expr::Boolean(b),
        };
        Expr::Constant {
            name: self.name,
            value: Box::new(value),
        }
    }
}

static CONSTANTS: &[NamedConstant] = &[
    NamedConstant {
        name: "TRUE",
        value: ConstantValue::Boolean(true),
    },
    NamedConstant {
        name: "FALSE",
        value: ConstantValue::Boolean(false),
    },
    // message flags
    NamedConstant::flag("MF_SEEN", MessageFlags::SEEN),
    NamedConstant::flag("MF_REPLIED", MessageFlags::REPLIED),
    NamedConstant::flag("MF_FORWARDED", MessageFlags::FORWARDED),
    NamedConstant::flag("MF_SENT", MessageFlags::SENT),
    NamedConstant::flag("MF_DRAFT", MessageFlags::DRAFT),
    NamedConstant::flag("MF_MARKED", MessageFlags::MARKED),
    NamedConstant::flag("MF_DELETED", MessageFlags::DELETED),
    NamedConstant::flag("MF_DOWNLOAD", MessageFlags::DOWNLOAD),
    NamedConstant::flag("MF_DOWNLOADTEXT", MessageFlags::DOWNLOADTEXT),
    NamedConstant::flag("MF_TOME", MessageFlags::TOME),
    NamedConstant::flag("MF_CCME", MessageFlags::CCME),
    NamedConstant::flag("MF_JUNK", MessageFlags::JUNK),
    NamedConstant::flag("MF_USER1", MessageFlags::USER1),
    NamedConstant::flag("MF_USER2", MessageFlags::USER2),
    NamedConstant::flag("MF_USER3", MessageFlags::USER3),
    NamedConstant::flag("MF_USER4", MessageFlags::USER4),
    NamedConstant::flag("MF_USER_MASK", MessageFlags::USER_MASK),
    NamedConstant::flag("MF_MULTIPART", MessageFlags::MULTIPART),
    NamedConstant::flag("MF_TEXT", MessageFlags::TEXT),
    NamedConstant::flag("MF_NOTONSERVER", MessageFlags::NOTONSERVER),
    NamedConstant::flag("MF_LOCAL", MessageFlags::LOCAL),
    NamedConstant::flag("MF_SYSTEM_MASK", MessageFlags::SYSTEM_MASK),
    NamedConstant::flag("MF_INDEXONLY", MessageFlags::INDEXONLY),
    NamedConstant::flag("MF_HEADERONLY", MessageFlags::HEADERONLY),
    NamedConstant::flag("MF_TEXTONLY", MessageFlags::TEXTONLY),
    NamedConstant::flag("MF_HTMLONLY", MessageFlags::HTMLONLY),
    NamedConstant::flag("MF_PARTIAL_MASK", MessageFlags::PARTIAL_MASK),
    // durations in seconds
    NamedConstant::number("SECOND", 1),
    NamedConstant::number("MINUTE", 60),
    NamedConstant::number("HOUR", 3_600),
    NamedConstant::number("DAY", 86_400),
    NamedConstant::number("WEEK", 604_800),
    // sizes in bytes
    NamedConstant::number("KB", 1_024),
    NamedConstant::number("MB", 1_048_576),
    // weekdays, Sunday first
    NamedConstant::number("SUNDAY", 0),
    NamedConstant::number("MONDAY", 1),
    NamedConstant::number("TUESDAY", 2),
    NamedConstant::number("WEDNESDAY", 3),
    NamedConstant::number("THURSDAY", 4),
    NamedConstant::number("FRIDAY", 5),
    NamedConstant::number("SATURDAY", 6),
    // months, 1-based
    NamedConstant::number("JANUARY", 1),
    NamedConstant::number("FEBRUARY", 2),
    NamedConstant::number("MARCH", 3),
    NamedConstant::number("APRIL", 4),
    NamedConstant::number("MAY", 5),
    NamedConstant::number("JUNE", 6),
    NamedConstant::number("JULY", 7),
    NamedConstant::number("AUGUST", 8),
    NamedConstant::number("SEPTEMBER", 9),
    NamedConstant::number("OCTOBER", 10),
    NamedConstant::number("NOVEMBER", 11),
    NamedConstant::number("DECEMBER", 12),
];

static BY_NAME: Lazy<HashMap<String, &'static NamedConstant>> = Lazy::new(|| {
    CONSTANTS
        .iter()
        .map(|c| (c.name.to_ascii_lowercase(), c))
        .collect()
});

/// Case-insensitive lookup.
pub fn lookup(name: &str) -> Option<&'static NamedConstant> {
    BY_NAME.get(&name.to_ascii_lowercase()).copied()
}

/// Every registered constant in declaration order.
pub fn all() -> &'static [NamedConstant] {
    CONSTANTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let seen = lookup("mf_seen").unwrap();
        assert_eq!(seen.name, "MF_SEEN");
        assert_eq!(seen.value, ConstantValue::Number(1));
        assert!(lookup("NO_SUCH_CONSTANT").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        assert_eq!(BY_NAME.len(), CONSTANTS.len());
    }
}
