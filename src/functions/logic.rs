use crate::ast::FunctionCall;
use crate::context::MacroContext;
use crate::error::{EvalError, EvalErrorCode, EvalResult};
use crate::parser::Parser;
use crate::value::Value;

/// Short-circuits on the first false argument.
pub fn and(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=usize::MAX)?;
    for n in 0..call.arg_count() {
        if !call.eval_arg(n, ctx)?.as_boolean() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// Short-circuits on the first true argument.
pub fn or(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=usize::MAX)?;
    for n in 0..call.arg_count() {
        if call.eval_arg(n, ctx)?.as_boolean() {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

pub fn not(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=1)?;
    Ok(Value::Boolean(!call.eval_arg(0, ctx)?.as_boolean()))
}

/// `@If(c1, v1, c2, v2, ..., else)`. Only the chosen branch is evaluated.
pub fn if_(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let count = call.arg_count();
    if count < 3 || count % 2 == 0 {
        return Err(call.error(ctx, EvalErrorCode::InvalidArgSize));
    }
    for n in (0..count - 1).step_by(2) {
        if call.eval_arg(n, ctx)?.as_boolean() {
            return call.eval_arg(n + 1, ctx);
        }
    }
    call.eval_arg(count - 1, ctx)
}

pub fn true_(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::Boolean(true))
}

pub fn false_(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::Boolean(false))
}

pub fn progn(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=usize::MAX)?;
    let mut last = Value::empty();
    for n in 0..call.arg_count() {
        last = call.eval_arg(n, ctx)?;
    }
    Ok(last)
}

/// Runs the body while the condition holds and returns the final
/// condition value.
pub fn while_(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 2..=2)?;
    loop {
        let condition = call.eval_arg(0, ctx)?;
        if !condition.as_boolean() {
            return Ok(condition);
        }
        call.eval_arg(1, ctx)?;
    }
}

/// `@Catch(expr[, handler])`. `Exit` is never caught.
pub fn catch(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=2)?;
    let result = {
        let mut scope = ctx.catch_scope();
        call.eval_arg(0, &mut scope)
    };
    match result {
        Err(e) if e.code == EvalErrorCode::Exit => Err(e),
        Err(e) => {
            tracing::debug!(code = %e.code, "caught macro error");
            if call.arg_count() > 1 {
                call.eval_arg(1, ctx)
            } else {
                Ok(Value::empty())
            }
        }
        ok => ok,
    }
}

/// Parses the text with the kind of the running macro and evaluates it.
/// The parsed macro stays alive until the episode ends.
pub fn eval(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=1)?;
    let text = call.eval_arg(0, ctx)?.as_string();

    let mut parser = Parser::new(ctx.kind());
    if let Some(handler) = ctx.global().error_handler() {
        parser = parser.with_error_handler(handler);
    }
    let parsed = match parser.parse(&text) {
        Ok(parsed) => parsed,
        Err(_) => return Err(call.error(ctx, EvalErrorCode::Fail)),
    };

    let parsed = ctx.global().store_parsed_macro(parsed);
    parsed.evaluate(ctx)
}

/// Stops evaluation. Not reported as an error.
pub fn exit(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Err(EvalError::new(EvalErrorCode::Exit, call.to_string()))
}
