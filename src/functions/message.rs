use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeDelta, Utc};

use crate::ast::FunctionCall;
use crate::context::{ContextFlags, MacroContext};
use crate::error::{EvalErrorCode, EvalResult};
use crate::message::{MessageFlags, MessageHolder, MessageType};
use crate::value::{TIME_FORMAT, Value};

fn current_holder<'g>(
    call: &FunctionCall,
    ctx: &MacroContext<'g, '_>,
) -> EvalResult<&'g dyn MessageHolder> {
    ctx.message_holder()
        .ok_or_else(|| call.error(ctx, EvalErrorCode::NoContextMessage))
}

/// Holder for built-ins that change the message.
fn writable_holder<'g>(
    call: &FunctionCall,
    ctx: &MacroContext<'g, '_>,
) -> EvalResult<&'g dyn MessageHolder> {
    if !ctx.flags().contains(ContextFlags::MODIFY) {
        return Err(call.error(ctx, EvalErrorCode::ReadOnlyContext));
    }
    ctx.message_holder()
        .ok_or_else(|| call.error(ctx, EvalErrorCode::NoContextMessageHolder))
}

fn update_flags(
    call: &FunctionCall,
    ctx: &MacroContext<'_, '_>,
    flags: MessageFlags,
    on: bool,
) -> EvalResult<()> {
    let holder = writable_holder(call, ctx)?;
    let value = if on { flags } else { MessageFlags::empty() };
    if holder.set_flags(value, flags) {
        Ok(())
    } else {
        Err(call.error(ctx, EvalErrorCode::Fail))
    }
}

/// Tests `flag` on the current message. User flags accept one argument
/// that sets or clears the flag first.
fn flag_predicate(
    call: &FunctionCall,
    ctx: &mut MacroContext<'_, '_>,
    flag: MessageFlags,
) -> EvalResult<Value> {
    let modifiable = MessageFlags::USER_MASK.contains(flag);
    call.check_args(ctx, 0..=usize::from(modifiable))?;
    let holder = current_holder(call, ctx)?;
    if call.arg_count() == 1 {
        let on = call.eval_arg(0, ctx)?.as_boolean();
        update_flags(call, ctx, flag, on)?;
    }
    Ok(Value::Boolean(holder.flags().intersects(flag)))
}

pub fn seen(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::SEEN)
}

pub fn replied(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::REPLIED)
}

pub fn forwarded(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::FORWARDED)
}

pub fn sent(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::SENT)
}

pub fn draft(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::DRAFT)
}

pub fn marked(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::MARKED)
}

pub fn deleted(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::DELETED)
}

pub fn junk(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::JUNK)
}

pub fn multipart(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    flag_predicate(call, ctx, MessageFlags::MULTIPART)
}

pub fn new(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    let holder = current_holder(call, ctx)?;
    Ok(Value::Boolean(!holder.flags().contains(MessageFlags::SEEN)))
}

/// `@Flag(mask[, set])`. Only user flags can be set.
pub fn flag(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=2)?;
    let holder = current_holder(call, ctx)?;
    let bits = u32::try_from(call.eval_arg(0, ctx)?.as_number())
        .map_err(|_| call.error(ctx, EvalErrorCode::InvalidArgValue))?;
    let mask = MessageFlags::from_bits_retain(bits);
    if call.arg_count() == 2 {
        if !MessageFlags::USER_MASK.contains(mask) {
            return Err(call.error(ctx, EvalErrorCode::InvalidArgValue));
        }
        let on = call.eval_arg(1, ctx)?.as_boolean();
        update_flags(call, ctx, mask, on)?;
    }
    Ok(Value::Boolean(holder.flags().intersects(mask)))
}

/// `@Size([text-only])`
pub fn size(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=1)?;
    let holder = current_holder(call, ctx)?;
    let text_only = call.eval_flag(0, false, ctx)?;
    let size = if text_only {
        holder.text_size()
    } else {
        holder.size()
    };
    Ok(Value::Number(size))
}

pub fn subject(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::String(current_holder(call, ctx)?.subject()))
}

pub fn id(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::Number(current_holder(call, ctx)?.id()))
}

fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, TIME_FORMAT)
                .ok()
                .and_then(|naive| naive.and_local_timezone(Local).single())
                .map(|local| local.fixed_offset())
        })
}

/// `@Date([text])`. Without an argument, or with text that is not a date,
/// yields the current time.
pub fn date(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=1)?;
    let parsed = if call.arg_count() == 1 {
        parse_date(&call.eval_arg(0, ctx)?.as_string())
    } else {
        None
    };
    Ok(Value::Time(
        parsed.unwrap_or_else(|| Local::now().fixed_offset()),
    ))
}

/// `@Header([name])`. Without a name, the whole header block.
pub fn header(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=1)?;
    let source = call.to_string();
    if call.arg_count() == 0 {
        let message = ctx.get_message(MessageType::Header, None, &source)?;
        return Ok(Value::String(message.header_text()));
    }
    let name = call.eval_arg(0, ctx)?.as_string();
    let message = ctx.get_message(MessageType::Header, Some(&name), &source)?;
    let value = message.header(&name);
    Ok(Value::field(name, value))
}

pub fn body(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    let message = ctx.get_message(MessageType::Text, None, &call.to_string())?;
    match message.body() {
        Some(body) => Ok(Value::String(body)),
        None => Err(call.error(ctx, EvalErrorCode::Fail)),
    }
}

/// True when the message date plus `days` lies in the past.
pub fn passed(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 1..=1)?;
    let holder = current_holder(call, ctx)?;
    let days = call.eval_arg(0, ctx)?.as_number();
    let deadline = i64::try_from(days)
        .ok()
        .and_then(TimeDelta::try_days)
        .and_then(|delta| holder.date().checked_add_signed(delta));
    let passed = match deadline {
        Some(deadline) => deadline < Utc::now().fixed_offset(),
        None => false,
    };
    Ok(Value::Boolean(passed))
}

pub fn account(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::string(ctx.account().unwrap_or_default()))
}

pub fn folder(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    Ok(Value::string(ctx.folder().unwrap_or_default()))
}

/// Marks the current message deleted. Needs a modifiable context.
pub fn delete(call: &FunctionCall, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    call.check_args(ctx, 0..=0)?;
    update_flags(call, ctx, MessageFlags::DELETED, true)?;
    Ok(Value::Boolean(true))
}
