//! Reference listings for the `functions` command

use std::fmt::Write;

use crate::constants::{self, ConstantValue};
use crate::functions;

/// One line per built-in: name, where it may be used, and a summary.
pub fn functions_listing() -> String {
    let mut out = String::from("BUILT-IN FUNCTIONS\n\n");
    for def in functions::builtins() {
        let kinds = if def.is_restricted() {
            let names: Vec<&str> = def.kinds.iter_names().map(|(name, _)| name).collect();
            format!(" [{}]", names.join("|"))
        } else {
            String::new()
        };
        let _ = writeln!(out, "  @{:<12} {}{}", def.name, def.summary, kinds);
    }
    out
}

/// One line per named constant with its value.
pub fn constants_listing() -> String {
    let mut out = String::from("CONSTANTS\n\n");
    for constant in constants::all() {
        let value = match constant.value {
            ConstantValue::Number(n) => n.to_string(),
            ConstantValue::Boolean(b) => b.to_string(),
        };
        let _ = writeln!(out, "  :{:<18} {}", constant.name, value);
    }
    out
}
