//! Run macros from the command line

use super::{CliError, json_to_message, value_to_json};
use crate::condition::ConditionFactory;
use crate::context::{ContextFlags, GlobalContext, MacroContext, VariableHolder};
use crate::message::MessageHolder;
use crate::parser::{MacroKind, Parser};
use crate::value::Value;

/// What to do with the macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Only validate syntax
    Syntax,
    /// Print the canonical form
    Format,
    /// Evaluate, optionally against a message
    #[default]
    Eval,
    /// Reconstruct structured conditions
    Conditions,
}

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The macro text
    pub source: String,
    pub kind: MacroKind,
    pub mode: CheckMode,
    /// Message as JSON, see [`json_to_message`]
    pub message: Option<String>,
    /// Global variables set before evaluation
    pub variables: Vec<(String, String)>,
    pub account: Option<String>,
    pub folder: Option<String>,
    /// Allow the macro to change the message
    pub modify: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            source: String::new(),
            kind: MacroKind::all(),
            mode: CheckMode::default(),
            message: None,
            variables: Vec::new(),
            account: None,
            folder: None,
            modify: false,
        }
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Canonical macro text
    Formatted(String),
    /// Evaluation result
    Value(serde_json::Value),
    /// Reconstructed condition list
    Conditions(serde_json::Value),
    /// The macro has no structured form
    NotRepresentable,
}

/// Splits a `NAME=VALUE` command-line assignment.
pub fn parse_assignment(text: &str) -> Result<(String, String), CliError> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(CliError::InvalidVariable(text.to_string())),
    }
}

/// Execute a qmacro check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let parsed = Parser::new(options.kind).parse(&options.source)?;

    match options.mode {
        CheckMode::Syntax => return Ok(CheckResult::SyntaxValid),
        CheckMode::Format => return Ok(CheckResult::Formatted(parsed.to_source())),
        CheckMode::Conditions => {
            return Ok(match ConditionFactory::parse(&parsed) {
                Some(list) => CheckResult::Conditions(list.to_json()),
                None => CheckResult::NotRepresentable,
            });
        }
        CheckMode::Eval => {}
    }

    let message = match &options.message {
        Some(json) => Some(json_to_message(serde_json::from_str(json)?)?),
        None => None,
    };

    let mut variables = VariableHolder::new();
    for (name, value) in &options.variables {
        variables.set(name, &Value::string(value.as_str()));
    }

    let mut flags = ContextFlags::empty();
    flags.set(ContextFlags::MODIFY, options.modify);
    let mut global = GlobalContext::new(flags).with_global_variables(&mut variables);

    let mut ctx = MacroContext::new(&mut global);
    if let Some(message) = &message {
        ctx = ctx.with_message(message as &dyn MessageHolder);
    }
    if let Some(account) = &options.account {
        ctx = ctx.with_account(account.as_str());
    }
    if let Some(folder) = &options.folder {
        ctx = ctx.with_folder(folder.as_str());
    }

    let value = parsed.evaluate(&mut ctx)?;
    Ok(CheckResult::Value(value_to_json(&value)))
}
