// tests/evaluator_tests.rs

use std::cell::RefCell;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use qmacro::context::{ContextFlags, GlobalContext, MacroContext, VariableHolder};
use qmacro::error::{ErrorHandler, EvalErrorCode, EvalResult, ParseErrorCode, Position};
use qmacro::message::{MemoryMessage, MessageFlags, MessageHolder};
use qmacro::parser::{MacroKind, Parser};
use qmacro::value::Value;

fn eval_in(source: &str, ctx: &mut MacroContext<'_, '_>) -> EvalResult<Value> {
    Parser::new(MacroKind::all())
        .parse(source)
        .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", source, e))
        .evaluate(ctx)
}

fn eval(source: &str) -> EvalResult<Value> {
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global);
    eval_in(source, &mut ctx)
}

fn eval_message(source: &str, message: &MemoryMessage) -> EvalResult<Value> {
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global).with_message(message);
    eval_in(source, &mut ctx)
}

fn error_code(result: EvalResult<Value>) -> EvalErrorCode {
    match result {
        Ok(value) => panic!("expected an error, got {:?}", value),
        Err(e) => e.code,
    }
}

fn sample_message() -> MemoryMessage {
    MemoryMessage::new(7)
        .with_header("From", "Alice <alice@example.org>")
        .with_header("To", "bob@example.org")
        .with_header("Subject", "Weekly Report")
        .with_body("Numbers are up.\r\n")
        .with_flags(MessageFlags::SEEN | MessageFlags::MARKED)
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(eval("'abc'").unwrap(), Value::string("abc"));
    assert_eq!(eval("42").unwrap(), Value::Number(42));
    assert_eq!(eval("-1").unwrap(), Value::Number(u64::MAX));
    assert_eq!(eval("").unwrap(), Value::string(""));
    assert_eq!(eval(":MF_MARKED").unwrap(), Value::Number(0x20));
    assert_eq!(eval(":FALSE").unwrap(), Value::Boolean(false));
}

#[test]
fn test_missing_variable_is_empty() {
    assert_eq!(eval("$nothing").unwrap(), Value::string(""));
    assert_eq!(eval("$3").unwrap(), Value::string(""));
}

#[test]
fn test_field_reads_header() {
    let message = sample_message();
    assert_eq!(
        eval_message("Subject", &message).unwrap().as_string(),
        "Weekly Report"
    );
    let missing = eval_message("X-Spam", &message).unwrap();
    assert!(!missing.as_boolean());
    assert_eq!(missing.as_string(), "");
}

#[test]
fn test_field_without_message() {
    assert_eq!(error_code(eval("Subject")), EvalErrorCode::NoContextMessage);
    assert_eq!(error_code(eval("%Subject")), EvalErrorCode::NoContextMessage);
}

#[test]
fn test_field_cache() {
    let message = sample_message();
    assert_eq!(eval_message("%Id", &message).unwrap(), Value::Number(7));
    assert_eq!(
        eval_message("%From", &message).unwrap().as_string(),
        "Alice <alice@example.org>"
    );
    assert_eq!(
        eval_message("%FromTo", &message).unwrap().as_string(),
        "Alice <alice@example.org>"
    );

    let sent = MemoryMessage::new(1)
        .with_header("From", "me@example.org")
        .with_header("To", "you@example.org")
        .with_flags(MessageFlags::SENT);
    assert_eq!(
        eval_message("%FromTo", &sent).unwrap().as_string(),
        "you@example.org"
    );
}

// ============================================================================
// Logic
// ============================================================================

#[test]
fn test_and_or_short_circuit() {
    assert_eq!(eval("@And(@True(), 1, 'x')").unwrap(), Value::Boolean(true));
    assert_eq!(eval("@Or('', 0, @False())").unwrap(), Value::Boolean(false));
    // the unknown function would fail if it were evaluated
    assert_eq!(eval("@And(@False(), @Missing())").unwrap(), Value::Boolean(false));
    assert_eq!(eval("@Or(@True(), @Missing())").unwrap(), Value::Boolean(true));
    assert_eq!(error_code(eval("@And()")), EvalErrorCode::InvalidArgSize);
}

#[test]
fn test_if_is_lazy() {
    assert_eq!(eval("@If(@True(), 'a', @Missing())").unwrap(), Value::string("a"));
    assert_eq!(eval("@If(0, 'a', '', 'b', 'c')").unwrap(), Value::string("c"));
    assert_eq!(eval("@If(0, 'a', 1, 'b', 'c')").unwrap(), Value::string("b"));
    assert_eq!(error_code(eval("@If(1, 2)")), EvalErrorCode::InvalidArgSize);
    assert_eq!(error_code(eval("@If(1, 2, 3, 4)")), EvalErrorCode::InvalidArgSize);
}

#[test]
fn test_not_and_arity() {
    assert_eq!(eval("@Not('')").unwrap(), Value::Boolean(true));
    assert_eq!(error_code(eval("@Not(1, 2)")), EvalErrorCode::InvalidArgSize);
    assert_eq!(error_code(eval("@True(1)")), EvalErrorCode::InvalidArgSize);
}

#[test]
fn test_progn_and_while() {
    let source = "@Progn(@Set('i', 0), @Set('s', ''), \
                  @While(@Less($i, 3), @Progn(@Set('s', @Concat($s, $i)), @Set('i', @Add($i, 1)))), \
                  $s)";
    assert_eq!(eval(source).unwrap(), Value::string("012"));

    let result = eval("@Progn(@Set('i', 0), @While(@Less($i, 2), @Set('i', @Add($i, 1))))");
    assert_eq!(result.unwrap(), Value::Boolean(false));
}

#[test]
fn test_catch() {
    assert_eq!(eval("@Catch(@Missing())").unwrap(), Value::string(""));
    assert_eq!(eval("@Catch(@Missing(), 'fallback')").unwrap(), Value::string("fallback"));
    assert_eq!(eval("@Catch('fine', 'fallback')").unwrap(), Value::string("fine"));
    assert_eq!(error_code(eval("@Catch(@Exit(), 'x')")), EvalErrorCode::Exit);
}

#[test]
fn test_exit() {
    let result = eval("@Progn(@Set('a', 1), @Exit(), @Set('a', 2))");
    let err = result.unwrap_err();
    assert_eq!(err.code, EvalErrorCode::Exit);
    assert_eq!(err.text, "@Exit()");
}

#[test]
fn test_eval_parses_and_retains() {
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global);
    let value = eval_in("@Eval(@Concat('@Add(', 1, ', 2)'))", &mut ctx).unwrap();
    assert_eq!(value, Value::Number(3));
    drop(ctx);
    assert_eq!(global.parsed_macro_count(), 1);
}

#[test]
fn test_eval_uses_caller_kind() {
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global);
    let parsed = Parser::new(MacroKind::SEARCH)
        .parse("@Eval('@Delete()')")
        .unwrap();
    let err = parsed.evaluate(&mut ctx).unwrap_err();
    assert_eq!(err.code, EvalErrorCode::Fail);
    assert_eq!(err.text, "@Eval('@Delete()')");
}

// ============================================================================
// Variables and user functions
// ============================================================================

#[test]
fn test_set_and_variable() {
    assert_eq!(eval("@Set('x', 'v')").unwrap(), Value::string("v"));
    assert_eq!(eval("@Progn(@Set('x', 'v'), $x)").unwrap(), Value::string("v"));
    assert_eq!(eval("@Progn(@Set('x', 'v'), $X)").unwrap(), Value::string(""));
    assert_eq!(
        eval("@Progn(@Variable('n', 5), @Variable('n', 6))").unwrap(),
        Value::Number(5)
    );
    assert_eq!(eval("@Variable('unset')").unwrap(), Value::string(""));
}

#[test]
fn test_global_variables_survive_episode() {
    let mut store = VariableHolder::new();
    {
        let mut global = GlobalContext::default().with_global_variables(&mut store);
        let mut ctx = MacroContext::new(&mut global);
        eval_in("@Progn(@Set('count', 1, @True()), @Set('local', 1))", &mut ctx).unwrap();
    }
    assert_eq!(store.get("count"), Some(Value::Number(1)));
    assert!(!store.contains("local"));

    let mut global = GlobalContext::default().with_global_variables(&mut store);
    let mut ctx = MacroContext::new(&mut global);
    assert_eq!(eval_in("$count", &mut ctx).unwrap(), Value::Number(1));
}

#[test]
fn test_user_function_arguments() {
    let source = "@Progn(\
                    @Defun('greet', @Concat($0, ': hello ', $1, $2)), \
                    @greet('world'))";
    assert_eq!(eval(source).unwrap(), Value::string("greet: hello world"));
}

#[test]
fn test_user_function_nesting() {
    let source = "@Progn(\
                    @Defun('inner', @Add($1, 1)), \
                    @Defun('outer', @Concat($1, '-', @inner($1), '-', $1)), \
                    @outer(10))";
    assert_eq!(eval(source).unwrap(), Value::string("10-11-10"));
}

#[test]
fn test_defun_first_definition_wins() {
    let source = "@Progn(\
                    @Set('a', @Defun('f', 1)), \
                    @Set('b', @Defun('F', 2)), \
                    @Concat($a, $b, @f()))";
    assert_eq!(eval(source).unwrap(), Value::string("truefalse1"));
}

#[test]
fn test_unknown_function() {
    let err = eval("@Nope(1)").unwrap_err();
    assert_eq!(err.code, EvalErrorCode::UnknownFunction);
    assert_eq!(err.text, "@Nope(1)");
}

#[test]
fn test_argument_stack_is_balanced() {
    let mut global = GlobalContext::default();
    {
        let mut ctx = MacroContext::new(&mut global);
        eval_in("@Progn(@Defun('f', @Add($1, 1)), @f(@f(1)))", &mut ctx).unwrap();
        assert!(eval_in("@Progn(@Defun('g', @Missing()), @g(1))", &mut ctx).is_err());
        assert!(eval_in("@Catch(@f(@g()))", &mut ctx).is_ok());
    }
    assert_eq!(global.argument_depth(), 0);
    assert!(!global.is_in_catch());
}

// ============================================================================
// Comparison and arithmetic
// ============================================================================

#[test]
fn test_compare() {
    assert_eq!(eval("@Equal(10, 10)").unwrap(), Value::Boolean(true));
    assert_eq!(eval("@Equal('abc', 'ABC')").unwrap(), Value::Boolean(true));
    assert_eq!(eval("@Equal('abc', 'ABC', @True())").unwrap(), Value::Boolean(false));
    assert_eq!(eval("@Less(9, 10)").unwrap(), Value::Boolean(true));
    // text comparison is lexicographic
    assert_eq!(eval("@Less('9', '10')").unwrap(), Value::Boolean(false));
    assert_eq!(eval("@Greater(@True(), @False())").unwrap(), Value::Boolean(true));
}

#[test]
fn test_contain_and_begin_with() {
    assert_eq!(eval("@Contain('Weekly Report', 'report')").unwrap(), Value::Boolean(true));
    assert_eq!(
        eval("@Contain('Weekly Report', 'report', @True())").unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(eval("@BeginWith('Re: hi', 're:')").unwrap(), Value::Boolean(true));
    assert_eq!(eval("@BeginWith('hi', 're:')").unwrap(), Value::Boolean(false));
}

#[test]
fn test_regex_match_binds_captures() {
    let source = "@Progn(@RegexMatch('alice@example.org', /(\\w+)@(\\w+)/), @Concat($_1, '/', $_2))";
    assert_eq!(eval(source).unwrap(), Value::string("alice/example"));

    let source = "@Progn(@RegexMatch('abc', 'b+'), $_0)";
    assert_eq!(eval(source).unwrap(), Value::string("b"));

    let source = "@Progn(@RegexMatch('ab', /(a)(b)/), @RegexMatch('zz', /a/), @Concat($_0, $_1))";
    assert_eq!(eval(source).unwrap(), Value::string(""));

    assert_eq!(
        error_code(eval("@RegexMatch('x', '(')")),
        EvalErrorCode::InvalidArgValue
    );
}

#[test]
fn test_arithmetic_wraps() {
    assert_eq!(eval("@Add(1, 2, 3)").unwrap(), Value::Number(6));
    assert_eq!(eval("@Add('4', @True())").unwrap(), Value::Number(5));
    assert_eq!(eval("@Minus(1, 2)").unwrap(), Value::Number(u64::MAX));
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_text_functions() {
    assert_eq!(eval("@Concat()").unwrap(), Value::string(""));
    assert_eq!(eval("@Concat('a', 1, @True())").unwrap(), Value::string("a1true"));
    assert_eq!(eval("@Length('héllo')").unwrap(), Value::Number(5));
    assert_eq!(eval("@Substring('héllo', 1, 3)").unwrap(), Value::string("éll"));
    assert_eq!(eval("@Substring('hello', 3)").unwrap(), Value::string("lo"));
    assert_eq!(eval("@Substring('hello', 10)").unwrap(), Value::string(""));
}

// ============================================================================
// Message functions
// ============================================================================

#[test]
fn test_flag_predicates() {
    let message = sample_message();
    assert_eq!(eval_message("@Seen()", &message).unwrap(), Value::Boolean(true));
    assert_eq!(eval_message("@Marked()", &message).unwrap(), Value::Boolean(true));
    assert_eq!(eval_message("@Deleted()", &message).unwrap(), Value::Boolean(false));
    assert_eq!(eval_message("@New()", &message).unwrap(), Value::Boolean(false));
    assert_eq!(eval_message("@Flag(:MF_MARKED)", &message).unwrap(), Value::Boolean(true));
    assert_eq!(error_code(eval("@Seen()")), EvalErrorCode::NoContextMessage);
}

#[test]
fn test_setting_flags_needs_modify() {
    let message = sample_message();
    assert_eq!(
        error_code(eval_message("@Seen(@False())", &message)),
        EvalErrorCode::ReadOnlyContext
    );

    let mut global = GlobalContext::new(ContextFlags::MODIFY);
    let mut ctx = MacroContext::new(&mut global).with_message(&message);
    assert_eq!(
        eval_in("@Seen(@False())", &mut ctx).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(eval_in("@Flag(:MF_USER1, 1)", &mut ctx).unwrap(), Value::Boolean(true));
    assert_eq!(
        error_code(eval_in("@Flag(:MF_MULTIPART, 1)", &mut ctx)),
        EvalErrorCode::InvalidArgValue
    );
    assert!(!message.flags().contains(MessageFlags::SEEN));
    assert!(message.flags().contains(MessageFlags::USER1));
}

#[test]
fn test_delete() {
    let message = sample_message();
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global)
        .with_message(&message)
        .with_flag(ContextFlags::MODIFY, true);
    assert_eq!(eval_in("@Delete()", &mut ctx).unwrap(), Value::Boolean(true));
    assert!(message.flags().contains(MessageFlags::DELETED));

    let mut global = GlobalContext::new(ContextFlags::MODIFY);
    let mut ctx = MacroContext::new(&mut global);
    assert_eq!(
        error_code(eval_in("@Delete()", &mut ctx)),
        EvalErrorCode::NoContextMessageHolder
    );
}

#[test]
fn test_local_flags_override_global() {
    let message = sample_message();
    let mut global = GlobalContext::new(ContextFlags::MODIFY);
    let mut ctx = MacroContext::new(&mut global)
        .with_message(&message)
        .with_flag(ContextFlags::MODIFY, false);
    assert_eq!(
        error_code(eval_in("@Delete()", &mut ctx)),
        EvalErrorCode::ReadOnlyContext
    );
}

#[test]
fn test_header_body_subject() {
    let message = sample_message();
    assert_eq!(
        eval_message("@Subject()", &message).unwrap().as_string(),
        "Weekly Report"
    );
    assert_eq!(
        eval_message("@Header('to')", &message).unwrap().as_string(),
        "bob@example.org"
    );
    assert!(
        eval_message("@Header()", &message)
            .unwrap()
            .as_string()
            .starts_with("From: Alice")
    );
    assert_eq!(
        eval_message("@Body()", &message).unwrap().as_string(),
        "Numbers are up.\r\n"
    );
    assert_eq!(
        error_code(eval_message("@Body()", &MemoryMessage::new(1))),
        EvalErrorCode::Fail
    );
}

#[test]
fn test_size() {
    let message = MemoryMessage::new(1).with_size(2048);
    assert_eq!(eval_message("@Size()", &message).unwrap(), Value::Number(2048));
    assert_eq!(eval_message("%Size", &message).unwrap(), Value::Number(2048));
    assert_eq!(
        eval_message("@Greater(@Size(), 1024)", &message).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_passed() {
    let old = (Utc::now() - Duration::days(10)).fixed_offset();
    let message = MemoryMessage::new(1).with_date(old);
    assert_eq!(eval_message("@Passed(7)", &message).unwrap(), Value::Boolean(true));
    assert_eq!(eval_message("@Passed(30)", &message).unwrap(), Value::Boolean(false));
}

#[test]
fn test_date() {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let expected = offset.with_ymd_and_hms(2025, 7, 1, 10, 52, 37).unwrap();
    assert_eq!(
        eval("@Date('Tue, 1 Jul 2025 10:52:37 +0200')").unwrap(),
        Value::Time(expected)
    );
    assert!(matches!(eval("@Date()").unwrap(), Value::Time(_)));

    let message = MemoryMessage::new(1).with_header("Date", "Tue, 1 Jul 2025 10:52:37 +0200");
    assert_eq!(eval_message("%Date", &message).unwrap(), Value::Time(expected));
}

#[test]
fn test_account_and_folder() {
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global)
        .with_account("work")
        .with_folder("Inbox");
    assert_eq!(
        eval_in("@Concat(@Account(), '/', @Folder())", &mut ctx).unwrap(),
        Value::string("work/Inbox")
    );
    assert_eq!(eval("@Account()").unwrap(), Value::string(""));
}

#[test]
fn test_cleared_message() {
    let message = sample_message();
    let mut global = GlobalContext::default();
    let mut ctx = MacroContext::new(&mut global).with_message(&message);
    assert!(eval_in("@Seen()", &mut ctx).is_ok());
    ctx.clear_message();
    assert_eq!(
        error_code(eval_in("@Subject()", &mut ctx)),
        EvalErrorCode::NoContextMessage
    );
}

// ============================================================================
// Error reporting
// ============================================================================

#[derive(Default)]
struct RecordingHandler {
    parse_errors: RefCell<Vec<ParseErrorCode>>,
    eval_errors: RefCell<Vec<(EvalErrorCode, String)>>,
}

impl ErrorHandler for RecordingHandler {
    fn parse_error(&self, code: ParseErrorCode, _position: Position) {
        self.parse_errors.borrow_mut().push(code);
    }

    fn evaluation_error(&self, code: EvalErrorCode, source: &str) {
        self.eval_errors.borrow_mut().push((code, source.to_string()));
    }
}

#[test]
fn test_error_handler_sees_caught_errors() {
    let handler = RecordingHandler::default();
    let mut global = GlobalContext::default().with_error_handler(&handler);
    let mut ctx = MacroContext::new(&mut global);
    assert_eq!(
        eval_in("@Catch(@Length(1, 2), 'x')", &mut ctx).unwrap(),
        Value::string("x")
    );
    assert_eq!(
        *handler.eval_errors.borrow(),
        vec![(EvalErrorCode::InvalidArgSize, "@Length(1,2)".to_string())]
    );
}

#[test]
fn test_error_handler_sees_eval_parse_errors() {
    let handler = RecordingHandler::default();
    let mut global = GlobalContext::default().with_error_handler(&handler);
    let mut ctx = MacroContext::new(&mut global);
    assert!(eval_in("@Eval('@Seen(')", &mut ctx).is_err());
    assert_eq!(*handler.parse_errors.borrow(), vec![ParseErrorCode::SyntaxError]);
    assert_eq!(handler.eval_errors.borrow()[0].0, EvalErrorCode::Fail);
}

#[test]
fn test_exit_is_not_reported() {
    let handler = RecordingHandler::default();
    let mut global = GlobalContext::default().with_error_handler(&handler);
    let mut ctx = MacroContext::new(&mut global);
    assert!(eval_in("@Exit()", &mut ctx).is_err());
    assert!(handler.eval_errors.borrow().is_empty());
}
