use std::cmp::Ordering;

use crate::ast::FunctionCall;
use crate::context::MacroContext;
use crate::error::{EvalErrorCode, EvalResult};
use crate::value::{Value, build_regex};

/// Booleans compare as booleans and numbers as numbers when both sides
/// agree; everything else compares as text.
fn compare_values(lhs: &Value, rhs: &Value, case_sensitive: bool) -> Ordering {
    match (lhs, rhs) {
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        _ => {
            let (l, r) = (lhs.as_string(), rhs.as_string());
            if case_sensitive {
                l.cmp(&r)
            } else {
                l.to_lowercase().cmp(&r.to_lowercase())
            }
        }
    }
}

fn compare(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Ordering> {
    call.check_args(ctx, 2..=3)?;
    let lhs = call.eval_arg(0, ctx)?;
    let rhs = call.eval_arg(1, ctx)?;
    let case_sensitive = call.eval_flag(2, false, ctx)?;
    Ok(compare_values(&lhs, &rhs, case_sensitive))
}

pub fn equal(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    Ok(Value::Boolean(compare(call, ctx)? == Ordering::Equal))
}

pub fn less(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    Ok(Value::Boolean(compare(call, ctx)? == Ordering::Less))
}

pub fn greater(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    Ok(Value::Boolean(compare(call, ctx)? == Ordering::Greater))
}

fn text_pair(
    call: &FunctionCall,
    ctx: &mut MacroContext<'_, '_>,
) -> EvalResult<(String, String)> {
    call.check_args(ctx, 2..=3)?;
    let text = call.eval_arg(0, ctx)?.as_string();
    let part = call.eval_arg(1, ctx)?.as_string();
    if call.eval_flag(2, false, ctx)? {
        Ok((text, part))
    } else {
        Ok((text.to_lowercase(), part.to_lowercase()))
    }
}

/// Case-insensitive substring test unless the third argument is true.
pub fn contain(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let (text, part) = text_pair(call, ctx)?;
    Ok(Value::Boolean(text.contains(&part)))
}

pub fn begin_with(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let (text, prefix) = text_pair(call, ctx)?;
    Ok(Value::Boolean(text.starts_with(&prefix)))
}

/// `@RegexMatch(text, regex)`. On a match the captures are bound to `_0`,
/// `_1`, ...; a failed match unbinds them.
pub fn regex_match(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=2)?;
    let text = call.eval_arg(0, ctx)?.as_string();
    let regex = match call.eval_arg(1, ctx)? {
        Value::Regex(r) => r.regex,
        other => match build_regex(&other.as_string(), "") {
            Some(regex) => regex,
            None => return Err(call.error(ctx, EvalErrorCode::InvalidArgValue)),
        },
    };

    match regex.captures(&text) {
        Some(captures) => {
            let groups: Vec<String> = captures
                .iter()
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            ctx.set_regex_result(&groups);
            Ok(Value::Boolean(true))
        }
        None => {
            ctx.set_regex_result(&[]);
            Ok(Value::Boolean(false))
        }
    }
}

/// Wrapping sum of all arguments.
pub fn add(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=usize::MAX)?;
    let mut sum: u64 = 0;
    for n in 0..call.arg_count() {
        sum = sum.wrapping_add(call.eval_arg(n, ctx)?.as_number());
    }
    Ok(Value::Number(sum))
}

pub fn minus(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=2)?;
    let lhs = call.eval_arg(0, ctx)?.as_number();
    let rhs = call.eval_arg(1, ctx)?.as_number();
    Ok(Value::Number(lhs.wrapping_sub(rhs)))
}
