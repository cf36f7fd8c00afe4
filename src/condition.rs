//! Structured conditions.
//!
//! Rule and filter editors present common macro shapes as a list of
//! conditions joined by `And` or `Or`. [`ConditionFactory::parse`] maps a
//! parsed macro back to such a list when the macro has one of the known
//! shapes, and [`ConditionList::to_macro`] renders the list as macro text
//! again. Anything the factory does not recognize stays raw macro text.

use once_cell::sync::Lazy;
use serde_json::json;

use crate::ast::{Expr, ExprKind, ExprTypeVisitor, FunctionCall, FunctionNameVisitor, Macro};

/// How a condition argument is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Field,
    Text,
    Number,
}

impl ArgumentType {
    pub fn name(self) -> &'static str {
        match self {
            ArgumentType::Field => "field",
            ArgumentType::Text => "text",
            ArgumentType::Number => "number",
        }
    }
}

/// A flag test without arguments, such as `@Seen()` or `@Not(@Marked())`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoArgumentCondition {
    name: &'static str,
    description: &'static str,
    source: &'static str,
}

/// `@Function(field, "value")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    name: &'static str,
    labels: [&'static str; 2],
    description: &'static str,
    quote: char,
    escaped: &'static str,
    field: Option<String>,
    value: Option<String>,
}

impl FieldCondition {
    fn escape(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.quote || self.escaped.contains(c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

/// `@Less(@Size(), n)` or `@Greater(@Size(), n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCondition {
    name: &'static str,
    label: &'static str,
    description: &'static str,
    size: Option<u64>,
}

/// `@Passed(n)`, optionally negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedCondition {
    name: &'static str,
    label: &'static str,
    description: &'static str,
    negate: bool,
    days: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    NoArgument(NoArgumentCondition),
    Field(FieldCondition),
    Size(SizeCondition),
    Passed(PassedCondition),
}

impl Condition {
    const fn no_argument(
        name: &'static str,
        description: &'static str,
        source: &'static str,
    ) -> Self {
        Condition::NoArgument(NoArgumentCondition {
            name,
            description,
            source,
        })
    }

    const fn field(
        name: &'static str,
        labels: [&'static str; 2],
        description: &'static str,
        quote: char,
        escaped: &'static str,
    ) -> Self {
        Condition::Field(FieldCondition {
            name,
            labels,
            description,
            quote,
            escaped,
            field: None,
            value: None,
        })
    }

    const fn size(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Condition::Size(SizeCondition {
            name,
            label,
            description,
            size: None,
        })
    }

    const fn passed(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        negate: bool,
    ) -> Self {
        Condition::Passed(PassedCondition {
            name,
            label,
            description,
            negate,
            days: None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::NoArgument(c) => c.name,
            Condition::Field(c) => c.name,
            Condition::Size(c) => c.name,
            Condition::Passed(c) => c.name,
        }
    }

    pub fn argument_count(&self) -> usize {
        match self {
            Condition::NoArgument(_) => 0,
            Condition::Field(_) => 2,
            Condition::Size(_) | Condition::Passed(_) => 1,
        }
    }

    pub fn argument_name(&self, n: usize) -> Option<&'static str> {
        match (self, n) {
            (Condition::Field(c), 0 | 1) => Some(c.labels[n]),
            (Condition::Size(c), 0) => Some(c.label),
            (Condition::Passed(c), 0) => Some(c.label),
            _ => None,
        }
    }

    pub fn argument_type(&self, n: usize) -> Option<ArgumentType> {
        match (self, n) {
            (Condition::Field(_), 0) => Some(ArgumentType::Field),
            (Condition::Field(_), 1) => Some(ArgumentType::Text),
            (Condition::Size(_) | Condition::Passed(_), 0) => Some(ArgumentType::Number),
            _ => None,
        }
    }

    /// The current value of argument `n`, if it has been set.
    pub fn argument_value(&self, n: usize) -> Option<String> {
        match (self, n) {
            (Condition::Field(c), 0) => c.field.clone(),
            (Condition::Field(c), 1) => c.value.clone(),
            (Condition::Size(c), 0) => c.size.map(|size| size.to_string()),
            (Condition::Passed(c), 0) => c.days.map(|days| days.to_string()),
            _ => None,
        }
    }

    /// Sets argument `n` from editor text. Number arguments that do not
    /// parse become unset. Returns false if there is no argument `n`.
    pub fn set_argument_value(&mut self, n: usize, text: Option<&str>) -> bool {
        let number = || text.and_then(|t| t.trim().parse::<u64>().ok());
        match (self, n) {
            (Condition::Field(c), 0) => c.field = text.map(str::to_string),
            (Condition::Field(c), 1) => c.value = text.map(str::to_string),
            (Condition::Size(c), 0) => c.size = number(),
            (Condition::Passed(c), 0) => c.days = number(),
            _ => return false,
        }
        true
    }

    /// English description. With `with_values` the argument values are
    /// filled in, otherwise the argument names.
    pub fn description(&self, with_values: bool) -> String {
        let template = match self {
            Condition::NoArgument(c) => return c.description.to_string(),
            Condition::Field(c) => c.description,
            Condition::Size(c) => c.description,
            Condition::Passed(c) => c.description,
        };
        (0..self.argument_count()).fold(template.to_string(), |text, n| {
            let arg = if with_values {
                self.argument_value(n).unwrap_or_default()
            } else {
                self.argument_name(n).unwrap_or_default().to_string()
            };
            text.replace(&format!("{{{n}}}"), &arg)
        })
    }

    /// Macro text for this condition. Unset arguments render empty (or 0).
    pub fn to_macro(&self) -> String {
        match self {
            Condition::NoArgument(c) => c.source.to_string(),
            Condition::Field(c) => format!(
                "@{}({}, {quote}{}{quote})",
                c.name,
                c.field.as_deref().unwrap_or_default(),
                c.escape(c.value.as_deref().unwrap_or_default()),
                quote = c.quote,
            ),
            Condition::Size(c) => format!("@{}(@Size(), {})", c.name, c.size.unwrap_or(0)),
            Condition::Passed(c) => {
                let passed = format!("@Passed({})", c.days.unwrap_or(0));
                if c.negate {
                    format!("@Not({passed})")
                } else {
                    passed
                }
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let kind = match self {
            Condition::NoArgument(_) => "noargument",
            Condition::Field(_) => "field",
            Condition::Size(_) => "size",
            Condition::Passed(_) => "passed",
        };
        let arguments: Vec<_> = (0..self.argument_count())
            .map(|n| {
                json!({
                    "name": self.argument_name(n),
                    "type": self.argument_type(n).map(ArgumentType::name),
                    "value": self.argument_value(n),
                })
            })
            .collect();
        json!({
            "name": self.name(),
            "kind": kind,
            "arguments": arguments,
            "description": self.description(true),
            "macro": self.to_macro(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn function_name(self) -> &'static str {
        match self {
            Combinator::And => "And",
            Combinator::Or => "Or",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Combinator::And => " and ",
            Combinator::Or => " or ",
        }
    }
}

/// Conditions joined by one combinator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionList {
    conditions: Vec<Condition>,
    combinator: Combinator,
}

impl ConditionList {
    pub fn new(combinator: Combinator) -> Self {
        ConditionList {
            conditions: Vec::new(),
            combinator,
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn set_combinator(&mut self, combinator: Combinator) {
        self.combinator = combinator;
    }

    pub fn add(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// An empty list renders as empty text and a single condition renders
    /// bare, without the combinator.
    pub fn to_macro(&self) -> String {
        match self.conditions.as_slice() {
            [] => String::new(),
            [single] => single.to_macro(),
            conditions => {
                let args: Vec<String> = conditions.iter().map(Condition::to_macro).collect();
                format!("@{}({})", self.combinator.function_name(), args.join(", "))
            }
        }
    }

    pub fn description(&self, with_values: bool) -> String {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|c| c.description(with_values))
            .collect();
        parts.join(self.combinator.separator())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let conditions: Vec<_> = self.conditions.iter().map(Condition::to_json).collect();
        json!({
            "combinator": self.combinator.function_name(),
            "conditions": conditions,
            "macro": self.to_macro(),
        })
    }
}

static TEMPLATES: Lazy<Vec<Condition>> = Lazy::new(|| {
    const FIELD: &str = "Field";
    vec![
        Condition::field("Contain", [FIELD, "Text"], "{0} contains {1}", '"', "\\"),
        Condition::field("BeginWith", [FIELD, "Text"], "{0} begins with {1}", '"', "\\"),
        Condition::field("Equal", [FIELD, "Text"], "{0} is {1}", '"', "\\"),
        Condition::field("RegexMatch", [FIELD, "Pattern"], "{0} matches {1}", '/', ""),
        Condition::no_argument("Seen", "Seen", "@Seen()"),
        Condition::no_argument("Unseen", "Unseen", "@Not(@Seen())"),
        Condition::no_argument("Marked", "Marked", "@Marked()"),
        Condition::no_argument("Unmarked", "Not marked", "@Not(@Marked())"),
        Condition::no_argument("Deleted", "Deleted", "@Deleted()"),
        Condition::no_argument("Undeleted", "Not deleted", "@Not(@Deleted())"),
        Condition::size("Less", "Size", "Smaller than {0} bytes"),
        Condition::size("Greater", "Size", "Larger than {0} bytes"),
        Condition::passed("Older", "Days", "Older than {0} days", false),
        Condition::passed("Newer", "Days", "Newer than {0} days", true),
        Condition::no_argument("New", "New", "@New()"),
        Condition::no_argument("Old", "Not new", "@Not(@New())"),
        Condition::no_argument("Junk", "Junk", "@Junk()"),
        Condition::no_argument("Multipart", "Has attachments", "@Multipart()"),
        Condition::no_argument("True", "All messages", "@True()"),
    ]
});

/// Known condition templates and the macro-to-condition matcher.
pub struct ConditionFactory;

impl ConditionFactory {
    /// Every template, with arguments unset.
    pub fn conditions() -> &'static [Condition] {
        &TEMPLATES
    }

    /// A fresh copy of the template called `name`.
    pub fn condition(name: &str) -> Option<Condition> {
        TEMPLATES.iter().find(|c| c.name() == name).cloned()
    }

    /// Reconstructs the condition list of a macro. Fails as a whole if any
    /// part does not match a template.
    pub fn parse(parsed: &Macro) -> Option<ConditionList> {
        let root = parsed.root();
        let combinator = match FunctionNameVisitor::name_of(root).as_deref() {
            Some("And") => Some(Combinator::And),
            Some("Or") => Some(Combinator::Or),
            _ => None,
        };

        let mut list = ConditionList::default();
        match (combinator, root) {
            (Some(combinator), Expr::Function(call)) => {
                list.set_combinator(combinator);
                for arg in call.args() {
                    list.add(parse_condition(arg)?);
                }
            }
            _ => list.add(parse_condition(root)?),
        }
        Some(list)
    }
}

fn call_of(expr: &Expr) -> Option<(String, &FunctionCall)> {
    let name = FunctionNameVisitor::name_of(expr)?;
    match expr {
        Expr::Function(call) => Some((name, call)),
        _ => None,
    }
}

fn parse_condition(expr: &Expr) -> Option<Condition> {
    let (name, call) = call_of(expr)?;
    match name.as_str() {
        "Deleted" | "Junk" | "Marked" | "Multipart" | "Seen" | "True" | "New" => {
            if call.arg_count() != 0 {
                return None;
            }
            ConditionFactory::condition(&name)
        }
        "Not" => {
            let [arg] = call.args() else {
                return None;
            };
            let (inner_name, inner) = call_of(arg)?;
            if inner_name == "Passed" {
                return parse_passed(inner, "Newer");
            }
            if inner.arg_count() != 0 {
                return None;
            }
            let opposite = match inner_name.as_str() {
                "Marked" => "Unmarked",
                "Seen" => "Unseen",
                "Deleted" => "Undeleted",
                "New" => "Old",
                _ => return None,
            };
            ConditionFactory::condition(opposite)
        }
        "BeginWith" | "Contain" | "Equal" | "RegexMatch" => {
            let [field, value] = call.args() else {
                return None;
            };
            if !matches!(
                ExprTypeVisitor::kind_of(field),
                ExprKind::Field | ExprKind::FieldCache
            ) {
                return None;
            }
            let value = match value {
                Expr::Literal(text) => text.clone(),
                Expr::Regex(regex) if name == "RegexMatch" => regex.pattern().to_string(),
                _ => return None,
            };
            let mut condition = ConditionFactory::condition(&name)?;
            condition.set_argument_value(0, Some(&field.to_source()));
            condition.set_argument_value(1, Some(&value));
            Some(condition)
        }
        "Less" | "Greater" => {
            let [size, number] = call.args() else {
                return None;
            };
            match call_of(size) {
                Some((size_name, size_call)) if size_name == "Size" && size_call.arg_count() == 0 => {}
                _ => return None,
            }
            let mut condition = ConditionFactory::condition(&name)?;
            condition.set_argument_value(0, Some(&number_text(number)?));
            Some(condition)
        }
        "Passed" => parse_passed(call, "Older"),
        _ => None,
    }
}

fn parse_passed(call: &FunctionCall, name: &str) -> Option<Condition> {
    let [days] = call.args() else {
        return None;
    };
    let mut condition = ConditionFactory::condition(name)?;
    condition.set_argument_value(0, Some(&number_text(days)?));
    Some(condition)
}

/// Non-negative number literals only. A negative literal would render as a
/// wrapped value the parser cannot read back.
fn number_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Number(n) if *n >= 0 => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_have_unique_names() {
        let mut names: Vec<_> = ConditionFactory::conditions()
            .iter()
            .map(Condition::name)
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ConditionFactory::conditions().len());
    }

    #[test]
    fn test_field_escape() {
        let mut condition = ConditionFactory::condition("Contain").unwrap();
        condition.set_argument_value(0, Some("Subject"));
        condition.set_argument_value(1, Some(r#"a"b\c"#));
        assert_eq!(condition.to_macro(), r#"@Contain(Subject, "a\"b\\c")"#);

        let mut regex = ConditionFactory::condition("RegexMatch").unwrap();
        regex.set_argument_value(0, Some("%From"));
        regex.set_argument_value(1, Some("a/b"));
        assert_eq!(regex.to_macro(), r"@RegexMatch(%From, /a\/b/)");
    }
}
