//! JSON <-> message and value conversion utilities

use chrono::DateTime;
use serde_json::{Map, Value as Json};

use super::CliError;
use crate::message::{MemoryMessage, MessageFlags};
use crate::value::{TIME_FORMAT, Value};

/// Builds a message from JSON such as
///
/// ```json
/// {
///   "id": 3,
///   "flags": ["seen", "marked"],
///   "date": "Tue, 1 Jul 2025 10:52:37 +0200",
///   "headers": { "Subject": "Weekly report", "From": "alice@example.org" },
///   "body": "..."
/// }
/// ```
///
/// `flags` may also be a number. `headers` may be an array of
/// `[name, value]` pairs when a header repeats.
pub fn json_to_message(json: Json) -> Result<MemoryMessage, CliError> {
    let Json::Object(mut obj) = json else {
        return Err(invalid("expected an object"));
    };

    let id = match obj.remove("id") {
        None => 0,
        Some(v) => v.as_u64().ok_or_else(|| invalid("'id' must be a number"))?,
    };
    let mut message = MemoryMessage::new(id);

    if let Some(flags) = obj.remove("flags") {
        message = message.with_flags(flags_from_json(flags)?);
    }
    if let Some(headers) = obj.remove("headers") {
        for (name, value) in headers_from_json(headers)? {
            message = message.with_header(name, value);
        }
    }
    if let Some(date) = obj.remove("date") {
        let text = date.as_str().ok_or_else(|| invalid("'date' must be a string"))?;
        let date = DateTime::parse_from_rfc2822(text)
            .or_else(|_| DateTime::parse_from_rfc3339(text))
            .map_err(|e| invalid(&format!("bad date '{text}': {e}")))?;
        message = message.with_date(date);
    }
    if let Some(body) = obj.remove("body") {
        let body = body.as_str().ok_or_else(|| invalid("'body' must be a string"))?;
        message = message.with_body(body);
    }
    if let Some(size) = obj.remove("size") {
        let size = size.as_u64().ok_or_else(|| invalid("'size' must be a number"))?;
        message = message.with_size(size);
    }

    if let Some(key) = obj.keys().next() {
        return Err(invalid(&format!("unknown key '{key}'")));
    }
    Ok(message)
}

fn flags_from_json(json: Json) -> Result<MessageFlags, CliError> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .and_then(|bits| u32::try_from(bits).ok())
            .map(MessageFlags::from_bits_retain)
            .ok_or_else(|| invalid("'flags' is out of range")),
        Json::Array(names) => names.iter().try_fold(MessageFlags::empty(), |flags, name| {
            let name = name.as_str().unwrap_or_default().to_uppercase();
            MessageFlags::from_name(&name)
                .map(|flag| flags | flag)
                .ok_or_else(|| invalid(&format!("unknown flag '{name}'")))
        }),
        _ => Err(invalid("'flags' must be a number or an array of names")),
    }
}

fn headers_from_json(json: Json) -> Result<Vec<(String, String)>, CliError> {
    let pair = |name: String, value: &Json| match value.as_str() {
        Some(v) => Ok((name, v.to_string())),
        None => Err(invalid(&format!("header '{name}' must be a string"))),
    };
    match json {
        Json::Object(map) => map.into_iter().map(|(name, value)| pair(name, &value)).collect(),
        Json::Array(pairs) => pairs
            .iter()
            .map(|p| match p.as_array().map(Vec::as_slice) {
                Some([Json::String(name), value]) => pair(name.clone(), value),
                _ => Err(invalid("headers must be [name, value] pairs")),
            })
            .collect(),
        _ => Err(invalid("'headers' must be an object or an array")),
    }
}

fn invalid(reason: &str) -> CliError {
    CliError::InvalidMessage(reason.to_string())
}

/// Convert a macro value to JSON
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Boolean(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number((*n).into()),
        Value::String(s) => Json::String(s.clone()),
        Value::Time(t) => Json::String(t.format(TIME_FORMAT).to_string()),
        Value::Regex(r) => Json::String(r.pattern.clone()),
        Value::Field(f) => {
            let mut obj = Map::new();
            obj.insert("name".to_string(), Json::String(f.name.clone()));
            obj.insert(
                "value".to_string(),
                f.value.clone().map(Json::String).unwrap_or(Json::Null),
            );
            Json::Object(obj)
        }
    }
}
