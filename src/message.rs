//! The message model the evaluator reads from.
//!
//! Mail storage is not part of this crate. Callers hand the evaluator a
//! [`MessageHolder`], a cheap handle carrying flags and a few cached
//! attributes, which can produce a [`Message`] with headers and body on
//! demand. [`MemoryMessage`] is a self-contained implementation of both.

use std::cell::Cell;

use bitflags::bitflags;
use chrono::{DateTime, FixedOffset, Utc};

/// How much of a message has to be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageType {
    Header,
    Text,
    All,
}

bitflags! {
    /// Per-message status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u32 {
        const SEEN = 0x0000_0001;
        const REPLIED = 0x0000_0002;
        const FORWARDED = 0x0000_0004;
        const SENT = 0x0000_0008;
        const DRAFT = 0x0000_0010;
        const MARKED = 0x0000_0020;
        const DELETED = 0x0000_0040;
        const DOWNLOAD = 0x0000_0080;
        const DOWNLOADTEXT = 0x0000_0100;
        const TOME = 0x0000_0200;
        const CCME = 0x0000_0400;
        const JUNK = 0x0000_0800;
        const USER1 = 0x0000_1000;
        const USER2 = 0x0000_2000;
        const USER3 = 0x0000_4000;
        const USER4 = 0x0000_8000;
        const USER_MASK = 0x0000_ffff;

        const MULTIPART = 0x0001_0000;
        const TEXT = 0x0002_0000;
        const NOTONSERVER = 0x0004_0000;
        const LOCAL = 0x0008_0000;
        const SYSTEM_MASK = 0x000f_0000;

        const INDEXONLY = 0x0100_0000;
        const HEADERONLY = 0x0200_0000;
        const TEXTONLY = 0x0400_0000;
        const HTMLONLY = 0x0800_0000;
        const PARTIAL_MASK = 0x0f00_0000;
    }
}

/// Loaded message content.
pub trait Message {
    /// Unfolded value of the first header called `name` (case-insensitive).
    fn header(&self, name: &str) -> Option<String>;

    /// The whole header block.
    fn header_text(&self) -> String {
        String::new()
    }

    /// Body text, or `None` if it could not be loaded.
    fn body(&self) -> Option<String>;
}

/// Handle to a stored message.
pub trait MessageHolder {
    fn id(&self) -> u64;

    fn flags(&self) -> MessageFlags;

    fn from(&self) -> String;

    fn to(&self) -> String;

    /// Recipient for messages this user sent, sender otherwise.
    fn from_to(&self) -> String {
        if self
            .flags()
            .intersects(MessageFlags::SENT | MessageFlags::DRAFT)
        {
            self.to()
        } else {
            self.from()
        }
    }

    fn subject(&self) -> String;

    fn date(&self) -> DateTime<FixedOffset>;

    fn size(&self) -> u64;

    /// Size of the text part only.
    fn text_size(&self) -> u64 {
        self.size()
    }

    /// Loads at least the `kind` portion of the message. `field` names the
    /// header the caller is after, if any. With `as_possible` the holder
    /// should return whatever is available locally instead of fetching.
    fn message(
        &self,
        kind: MessageType,
        field: Option<&str>,
        as_possible: bool,
    ) -> Option<&dyn Message>;

    /// Replaces the bits selected by `mask`. Returns false if the holder is
    /// read-only.
    fn set_flags(&self, _flags: MessageFlags, _mask: MessageFlags) -> bool {
        false
    }
}

/// A message held entirely in memory.
///
/// # Examples
///
/// ```
/// use qmacro::message::{MemoryMessage, Message, MessageFlags, MessageHolder};
///
/// let msg = MemoryMessage::new(1)
///     .with_header("Subject", "Hello")
///     .with_flags(MessageFlags::SEEN);
/// assert_eq!(msg.subject(), "Hello");
/// assert_eq!(msg.header("subject").as_deref(), Some("Hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMessage {
    id: u64,
    flags: Cell<MessageFlags>,
    date: Option<DateTime<FixedOffset>>,
    headers: Vec<(String, String)>,
    body: Option<String>,
    size: Option<u64>,
}

impl MemoryMessage {
    pub fn new(id: u64) -> Self {
        MemoryMessage {
            id,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_flags(self, flags: MessageFlags) -> Self {
        self.flags.set(flags);
        self
    }

    pub fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    fn header_or_empty(&self, name: &str) -> String {
        self.header(name).unwrap_or_default()
    }
}

impl Message for MemoryMessage {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn header_text(&self) -> String {
        self.headers
            .iter()
            .map(|(n, v)| format!("{}: {}\r\n", n, v))
            .collect()
    }

    fn body(&self) -> Option<String> {
        self.body.clone()
    }
}

impl MessageHolder for MemoryMessage {
    fn id(&self) -> u64 {
        self.id
    }

    fn flags(&self) -> MessageFlags {
        self.flags.get()
    }

    fn from(&self) -> String {
        self.header_or_empty("From")
    }

    fn to(&self) -> String {
        self.header_or_empty("To")
    }

    fn subject(&self) -> String {
        self.header_or_empty("Subject")
    }

    fn date(&self) -> DateTime<FixedOffset> {
        if let Some(date) = self.date {
            return date;
        }
        self.header("Date")
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.fixed_offset())
    }

    fn size(&self) -> u64 {
        if let Some(size) = self.size {
            return size;
        }
        let headers: usize = self
            .headers
            .iter()
            .map(|(n, v)| n.len() + v.len() + 4)
            .sum();
        (headers + 2 + self.text_size() as usize) as u64
    }

    fn text_size(&self) -> u64 {
        self.body.as_ref().map_or(0, |b| b.len() as u64)
    }

    fn message(
        &self,
        _kind: MessageType,
        _field: Option<&str>,
        _as_possible: bool,
    ) -> Option<&dyn Message> {
        Some(self)
    }

    fn set_flags(&self, flags: MessageFlags, mask: MessageFlags) -> bool {
        let current = self.flags.get();
        self.flags.set((current - mask) | (flags & mask));
        true
    }
}
