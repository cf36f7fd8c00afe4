use crate::ast::FunctionCall;
use crate::context::MacroContext;
use crate::error::EvalResult;
use crate::value::Value;

pub fn concat(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let mut result = String::new();
    for n in 0..call.arg_count() {
        result.push_str(&call.eval_arg(n, ctx)?.as_string());
    }
    Ok(Value::String(result))
}

/// Length in characters, not bytes.
pub fn length(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=1)?;
    let text = call.eval_arg(0, ctx)?.as_string();
    Ok(Value::Number(text.chars().count() as u64))
}

/// `@Substring(text, begin[, length])`, counted in characters. Ranges past
/// the end are clamped.
pub fn substring(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=3)?;
    let text = call.eval_arg(0, ctx)?.as_string();
    let begin = usize::try_from(call.eval_arg(1, ctx)?.as_number()).unwrap_or(usize::MAX);
    let length = if call.arg_count() > 2 {
        usize::try_from(call.eval_arg(2, ctx)?.as_number()).unwrap_or(usize::MAX)
    } else {
        usize::MAX
    };
    Ok(Value::String(text.chars().skip(begin).take(length).collect()))
}
