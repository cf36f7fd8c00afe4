//! Expression evaluation.
//!
//! Leaves produce values directly. Built-in calls hand their unevaluated
//! call node to the registered function. Calls to user-defined functions
//! evaluate their arguments eagerly, push them as one frame
//! `[name, arg1, arg2, ...]` and evaluate the stored body; the frame is
//! popped on every exit path.

use crate::ast::{Expr, FieldCacheKind, FunctionCall, Macro, VariableRef};
use crate::context::MacroContext;
use crate::error::{EvalErrorCode, EvalResult};
use crate::message::MessageType;
use crate::value::Value;

impl Expr {
    pub fn evaluate(&self, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
        match self {
            Expr::Literal(value) => Ok(Value::string(value.as_str())),
            Expr::Field(name) => {
                let message = ctx.get_message(MessageType::Header, Some(name.as_str()), name)?;
                Ok(Value::field(name.as_str(), message.header(name)))
            }
            Expr::FieldCache(kind) => eval_field_cache(*kind, ctx),
            Expr::Number(n) => Ok(Value::Number(*n as u64)),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Regex(regex) => Ok(Value::regex(regex.pattern(), regex.regex().clone())),
            Expr::Variable(VariableRef::Named(name)) => {
                Ok(ctx.get_variable(name).unwrap_or_else(Value::empty))
            }
            Expr::Variable(VariableRef::Argument(n)) => Ok(ctx.get_argument(*n)),
            Expr::Constant { value, .. } => value.evaluate(ctx),
            Expr::Function(call) => match call.definition() {
                Some(def) => (def.call)(call, ctx),
                None => call_user_function(call, ctx),
            },
        }
    }
}

fn eval_field_cache(kind: FieldCacheKind, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let holder = match ctx.message_holder() {
        Some(holder) => holder,
        None => {
            let source = Expr::FieldCache(kind).to_source();
            return Err(ctx.error(EvalErrorCode::NoContextMessage, &source));
        }
    };
    let value = match kind {
        FieldCacheKind::Id => Value::Number(holder.id()),
        FieldCacheKind::Date => Value::Time(holder.date()),
        FieldCacheKind::From => Value::String(holder.from()),
        FieldCacheKind::To => Value::String(holder.to()),
        FieldCacheKind::FromTo => Value::String(holder.from_to()),
        FieldCacheKind::Subject => Value::String(holder.subject()),
        FieldCacheKind::Size => Value::Number(holder.size()),
    };
    Ok(value)
}

fn call_user_function(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    let body = ctx
        .get_function(call.name())
        .ok_or_else(|| call.error(ctx, EvalErrorCode::UnknownFunction))?;

    let mut args = Vec::with_capacity(call.arg_count() + 1);
    args.push(Value::string(call.name()));
    for arg in call.args() {
        args.push(arg.evaluate(ctx)?);
    }

    let mut frame = ctx.argument_frame(args);
    body.evaluate(&mut frame)
}

impl Macro {
    /// Evaluates the root expression. Built-ins that parse further macro
    /// text (`@Eval`) use this macro's kind.
    pub fn evaluate(&self, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
        let outer = ctx.set_kind(self.kind());
        let result = self.root().evaluate(ctx);
        ctx.set_kind(outer);
        result
    }
}
