//! Evaluation state.
//!
//! A [`GlobalContext`] lives for one evaluation episode: it owns variables,
//! user-defined functions, the argument stack and any macros parsed during
//! evaluation. A [`MacroContext`] is a short-lived view over it for one
//! message. Several `MacroContext`s can be created one after another from
//! the same `GlobalContext`, and the borrow keeps any of them from
//! outliving it.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use bitflags::bitflags;

use crate::ast::{Expr, Macro};
use crate::error::{ErrorHandler, EvalError, EvalErrorCode, EvalResult};
use crate::message::{Message, MessageHolder, MessageType};
use crate::parser::MacroKind;
use crate::value::Value;

bitflags! {
    /// Capabilities of the environment a macro runs in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContextFlags: u32 {
        /// A user interface is available.
        const UI = 0x01;
        /// Evaluation runs on the UI thread.
        const UI_THREAD = 0x02;
        /// Macros may change messages.
        const MODIFY = 0x04;
        /// Use whatever part of a message is available instead of fetching.
        const GET_MESSAGE_AS_POSSIBLE = 0x08;
    }
}

/// Named variables. Names are case-sensitive.
///
/// Also used on its own as the store that survives across episodes.
#[derive(Debug, Clone, Default)]
pub struct VariableHolder {
    variables: HashMap<String, Value>,
}

impl VariableHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    /// Stores a copy of `value`, replacing any previous binding.
    pub fn set(&mut self, name: &str, value: &Value) {
        self.variables.insert(name.to_string(), value.clone());
    }

    pub fn remove(&mut self, name: &str) {
        self.variables.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// User-defined functions. Names are case-insensitive and the first
/// definition wins.
#[derive(Debug, Default)]
struct FunctionHolder {
    functions: HashMap<String, Rc<Expr>>,
}

impl FunctionHolder {
    fn get(&self, name: &str) -> Option<Rc<Expr>> {
        self.functions.get(&name.to_lowercase()).cloned()
    }

    fn set(&mut self, name: &str, body: Expr) -> bool {
        let key = name.to_lowercase();
        if self.functions.contains_key(&key) {
            return false;
        }
        self.functions.insert(key, Rc::new(body));
        true
    }
}

/// Stack of argument frames for user-defined function calls.
#[derive(Debug, Default)]
struct ArgumentHolder {
    frames: Vec<Vec<Value>>,
}

impl ArgumentHolder {
    fn push(&mut self, args: Vec<Value>) {
        self.frames.push(args);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn get(&self, n: usize) -> Value {
        self.frames
            .last()
            .and_then(|frame| frame.get(n))
            .cloned()
            .unwrap_or_else(Value::empty)
    }
}

/// State shared by every evaluation in one episode.
pub struct GlobalContext<'a> {
    flags: ContextFlags,
    error_handler: Option<&'a dyn ErrorHandler>,
    global_variables: Option<&'a mut VariableHolder>,
    variables: VariableHolder,
    functions: FunctionHolder,
    arguments: ArgumentHolder,
    regex_result_count: usize,
    catch_depth: usize,
    parsed_macros: Vec<Rc<Macro>>,
}

impl<'a> GlobalContext<'a> {
    pub fn new(flags: ContextFlags) -> Self {
        GlobalContext {
            flags,
            error_handler: None,
            global_variables: None,
            variables: VariableHolder::new(),
            functions: FunctionHolder::default(),
            arguments: ArgumentHolder::default(),
            regex_result_count: 0,
            catch_depth: 0,
            parsed_macros: Vec::new(),
        }
    }

    pub fn with_error_handler(mut self, handler: &'a dyn ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Attaches a store that outlives the episode. Variables set with the
    /// global flag go there, and lookups fall back to it.
    pub fn with_global_variables(mut self, holder: &'a mut VariableHolder) -> Self {
        self.global_variables = Some(holder);
        self
    }

    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    pub fn error_handler(&self) -> Option<&'a dyn ErrorHandler> {
        self.error_handler
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).or_else(|| {
            self.global_variables
                .as_ref()
                .and_then(|holder| holder.get(name))
        })
    }

    /// Without a global holder attached, global variables are stored
    /// locally.
    pub fn set_variable(&mut self, name: &str, value: &Value, global: bool) {
        match self.global_variables.as_mut() {
            Some(holder) if global => holder.set(name, value),
            _ => self.variables.set(name, value),
        }
    }

    pub fn remove_variable(&mut self, name: &str, global: bool) {
        match self.global_variables.as_mut() {
            Some(holder) if global => holder.remove(name),
            _ => self.variables.remove(name),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Expr>> {
        self.functions.get(name)
    }

    /// Returns false if a function with that name already exists.
    pub fn set_function(&mut self, name: &str, body: Expr) -> bool {
        let set = self.functions.set(name, body);
        tracing::trace!(name, set, "defined macro function");
        set
    }

    pub fn push_arguments(&mut self, args: Vec<Value>) {
        self.arguments.push(args);
        tracing::trace!(depth = self.arguments.frames.len(), "pushed argument frame");
    }

    pub fn pop_arguments(&mut self) {
        self.arguments.pop();
        tracing::trace!(depth = self.arguments.frames.len(), "popped argument frame");
    }

    /// Argument `n` of the innermost frame, or an empty string when there
    /// is no such argument.
    pub fn get_argument(&self, n: usize) -> Value {
        self.arguments.get(n)
    }

    pub fn argument_depth(&self) -> usize {
        self.arguments.frames.len()
    }

    /// Rebinds `_0`, `_1`, ... to the given captures, unbinding whatever the
    /// previous match left behind.
    pub fn set_regex_result(&mut self, captures: &[String]) {
        for n in 0..self.regex_result_count {
            self.variables.remove(&format!("_{}", n));
        }
        for (n, capture) in captures.iter().enumerate() {
            self.variables
                .set(&format!("_{}", n), &Value::string(capture.as_str()));
        }
        self.regex_result_count = captures.len();
    }

    pub fn push_catch(&mut self) {
        self.catch_depth += 1;
    }

    pub fn pop_catch(&mut self) {
        self.catch_depth = self.catch_depth.saturating_sub(1);
    }

    pub fn is_in_catch(&self) -> bool {
        self.catch_depth != 0
    }

    /// Keeps a macro parsed during evaluation alive until the episode ends.
    pub fn store_parsed_macro(&mut self, parsed: Macro) -> Rc<Macro> {
        let parsed = Rc::new(parsed);
        self.parsed_macros.push(Rc::clone(&parsed));
        tracing::trace!(retained = self.parsed_macros.len(), "retained parsed macro");
        parsed
    }

    pub fn parsed_macro_count(&self) -> usize {
        self.parsed_macros.len()
    }
}

impl Default for GlobalContext<'_> {
    fn default() -> Self {
        Self::new(ContextFlags::empty())
    }
}

/// Per-message view over a [`GlobalContext`].
pub struct MacroContext<'g, 'a> {
    global: &'g mut GlobalContext<'a>,
    message: Option<&'g dyn MessageHolder>,
    account: Option<String>,
    folder: Option<String>,
    kind: MacroKind,
    local_flags: ContextFlags,
    local_mask: ContextFlags,
}

impl<'g, 'a> MacroContext<'g, 'a> {
    pub fn new(global: &'g mut GlobalContext<'a>) -> Self {
        MacroContext {
            global,
            message: None,
            account: None,
            folder: None,
            kind: MacroKind::all(),
            local_flags: ContextFlags::empty(),
            local_mask: ContextFlags::empty(),
        }
    }

    pub fn with_message(mut self, message: &'g dyn MessageHolder) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Overrides one episode flag for this context only.
    pub fn with_flag(mut self, flag: ContextFlags, on: bool) -> Self {
        self.local_mask |= flag;
        self.local_flags.set(flag, on);
        self
    }

    pub fn global(&mut self) -> &mut GlobalContext<'a> {
        &mut *self.global
    }

    /// Episode flags with the local overrides applied.
    pub fn flags(&self) -> ContextFlags {
        (self.global.flags - self.local_mask) | (self.local_flags & self.local_mask)
    }

    pub fn message_holder(&self) -> Option<&'g dyn MessageHolder> {
        self.message
    }

    /// Drops the current message. Later message access fails with
    /// `NoContextMessage`.
    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Loads the current message far enough for `kind`.
    pub fn get_message(
        &self,
        kind: MessageType,
        field: Option<&str>,
        source: &str,
    ) -> EvalResult<&'g dyn Message> {
        let holder = self
            .message
            .ok_or_else(|| self.error(EvalErrorCode::NoContextMessage, source))?;
        let as_possible = self
            .flags()
            .contains(ContextFlags::GET_MESSAGE_AS_POSSIBLE);
        holder
            .message(kind, field, as_possible)
            .ok_or_else(|| self.error(EvalErrorCode::Fail, source))
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Kind of the macro being evaluated.
    pub fn kind(&self) -> MacroKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: MacroKind) -> MacroKind {
        std::mem::replace(&mut self.kind, kind)
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.global.get_variable(name)
    }

    pub fn set_variable(&mut self, name: &str, value: &Value, global: bool) {
        self.global.set_variable(name, value, global)
    }

    pub fn remove_variable(&mut self, name: &str, global: bool) {
        self.global.remove_variable(name, global)
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Expr>> {
        self.global.get_function(name)
    }

    pub fn set_function(&mut self, name: &str, body: Expr) -> bool {
        self.global.set_function(name, body)
    }

    pub fn get_argument(&self, n: usize) -> Value {
        self.global.get_argument(n)
    }

    pub fn set_regex_result(&mut self, captures: &[String]) {
        self.global.set_regex_result(captures)
    }

    pub fn is_in_catch(&self) -> bool {
        self.global.is_in_catch()
    }

    /// Pushes `args` as a new frame; the frame is popped when the guard
    /// drops, on every path.
    pub fn argument_frame(&mut self, args: Vec<Value>) -> ArgumentFrame<'_, 'g, 'a> {
        self.global.push_arguments(args);
        ArgumentFrame { context: self }
    }

    /// Enters a catch scope for the lifetime of the guard.
    pub fn catch_scope(&mut self) -> CatchScope<'_, 'g, 'a> {
        self.global.push_catch();
        CatchScope { context: self }
    }

    /// Reports an evaluation error and returns it for propagation.
    ///
    /// Logged unless inside a catch scope; the error handler always hears
    /// about it.
    pub fn error(&self, code: EvalErrorCode, source: &str) -> EvalError {
        if !self.is_in_catch() {
            tracing::warn!(%code, source, "macro evaluation failed");
        }
        if let Some(handler) = self.global.error_handler {
            handler.evaluation_error(code, source);
        }
        EvalError::new(code, source)
    }
}

pub struct ArgumentFrame<'s, 'g, 'a> {
    context: &'s mut MacroContext<'g, 'a>,
}

impl<'g, 'a> Deref for ArgumentFrame<'_, 'g, 'a> {
    type Target = MacroContext<'g, 'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for ArgumentFrame<'_, '_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for ArgumentFrame<'_, '_, '_> {
    fn drop(&mut self) {
        self.context.global.pop_arguments();
    }
}

pub struct CatchScope<'s, 'g, 'a> {
    context: &'s mut MacroContext<'g, 'a>,
}

impl<'g, 'a> Deref for CatchScope<'_, 'g, 'a> {
    type Target = MacroContext<'g, 'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for CatchScope<'_, '_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for CatchScope<'_, '_, '_> {
    fn drop(&mut self) {
        self.context.global.pop_catch();
    }
}
