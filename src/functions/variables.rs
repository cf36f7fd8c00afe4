use crate::ast::FunctionCall;
use crate::context::MacroContext;
use crate::error::EvalResult;
use crate::value::Value;

/// `@Set(name, value[, global])` returns the stored value.
pub fn set(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=3)?;
    let name = call.eval_arg(0, ctx)?.as_string();
    let value = call.eval_arg(1, ctx)?;
    let global = call.eval_flag(2, false, ctx)?;
    ctx.set_variable(&name, &value, global);
    Ok(value)
}

/// `@Variable(name[, default[, global]])`. A missing variable is
/// initialized with the default when one is given.
pub fn variable(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=3)?;
    let name = call.eval_arg(0, ctx)?.as_string();
    if let Some(value) = ctx.get_variable(&name) {
        return Ok(value);
    }
    if call.arg_count() < 2 {
        return Ok(Value::empty());
    }
    let value = call.eval_arg(1, ctx)?;
    let global = call.eval_flag(2, false, ctx)?;
    ctx.set_variable(&name, &value, global);
    Ok(value)
}

/// `@Defun(name, body)` stores the body unevaluated. Returns whether the
/// function was defined; an existing definition is kept.
pub fn defun(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=2)?;
    let name = call.eval_arg(0, ctx)?.as_string();
    let body = match call.arg(1) {
        Some(body) => body.clone(),
        None => return Ok(Value::Boolean(false)),
    };
    Ok(Value::Boolean(ctx.set_function(&name, body)))
}
