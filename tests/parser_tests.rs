// tests/parser_tests.rs

use std::cell::RefCell;

use proptest::prelude::*;
use qmacro::ast::{Expr, FieldCacheKind, VariableRef};
use qmacro::error::{ErrorHandler, EvalErrorCode, ParseErrorCode, Position};
use qmacro::message::MessageType;
use qmacro::parser::{MacroKind, Parser};

fn parse(source: &str) -> Expr {
    Parser::new(MacroKind::all())
        .parse(source)
        .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", source, e))
        .into_root()
}

fn parse_error(source: &str) -> ParseErrorCode {
    match Parser::new(MacroKind::all()).parse(source) {
        Ok(parsed) => panic!("{:?} parsed to {:?}", source, parsed),
        Err(e) => e.code,
    }
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn test_empty_macro() {
    assert_eq!(parse(""), Expr::Literal(String::new()));
    assert_eq!(parse("  # just a comment\n"), Expr::Literal(String::new()));
}

#[test]
fn test_number_and_field() {
    assert_eq!(parse("42"), Expr::Number(42));
    assert_eq!(parse("-7"), Expr::Number(-7));
    assert_eq!(parse("Subject"), Expr::Field("Subject".to_string()));
    assert_eq!(parse("12abc"), Expr::Field("12abc".to_string()));
}

#[test]
fn test_number_out_of_range() {
    assert_eq!(parse_error("99999999999999999999"), ParseErrorCode::SyntaxError);
}

#[test]
fn test_variables() {
    assert_eq!(
        parse("$name"),
        Expr::Variable(VariableRef::Named("name".to_string()))
    );
    assert_eq!(parse("$2"), Expr::Variable(VariableRef::Argument(2)));
    assert_eq!(parse_error("$2x"), ParseErrorCode::InvalidVariableName);
    assert_eq!(parse_error("$ ,"), ParseErrorCode::InvalidVariableName);
}

#[test]
fn test_field_cache() {
    assert_eq!(parse("%subject"), Expr::FieldCache(FieldCacheKind::Subject));
    assert_eq!(parse("%FromTo"), Expr::FieldCache(FieldCacheKind::FromTo));
    assert_eq!(parse_error("%Nope"), ParseErrorCode::InvalidFieldName);
}

#[test]
fn test_constants() {
    match parse(":mf_seen") {
        Expr::Constant { name, value } => {
            assert_eq!(name, "MF_SEEN");
            assert_eq!(*value, Expr::Number(1));
        }
        other => panic!("expected constant, got {:?}", other),
    }
    assert!(matches!(
        parse(":TRUE"),
        Expr::Constant { value, .. } if *value == Expr::Boolean(true)
    ));
    assert_eq!(parse_error(":NO_SUCH_CONSTANT"), ParseErrorCode::InvalidConstantName);
}

#[test]
fn test_regex() {
    match parse("/^re:/i") {
        Expr::Regex(regex) => {
            assert_eq!(regex.pattern(), "^re:");
            assert_eq!(regex.flags(), "i");
            assert!(regex.regex().is_match("RE: hello"));
        }
        other => panic!("expected regex, got {:?}", other),
    }
    assert_eq!(parse_error("/(/"), ParseErrorCode::InvalidRegex);
    assert_eq!(parse_error("/a/x"), ParseErrorCode::InvalidRegex);
}

// ============================================================================
// Function calls
// ============================================================================

#[test]
fn test_builtin_names_are_canonical() {
    let expr = parse("@contain(%subject, 'x')");
    let Expr::Function(call) = &expr else {
        panic!("expected function");
    };
    assert_eq!(call.name(), "Contain");
    assert!(call.is_builtin());
    assert_eq!(call.arg_count(), 2);
    assert_eq!(expr.to_source(), "@Contain(%Subject,'x')");
}

#[test]
fn test_user_function() {
    let Expr::Function(call) = parse("@MyHelper($1, 2)") else {
        panic!("expected function");
    };
    assert_eq!(call.name(), "MyHelper");
    assert!(!call.is_builtin());
    assert_eq!(call.args()[1], Expr::Number(2));
}

#[test]
fn test_nested_calls() {
    let expr = parse("@If(@Seen(), @Concat('a', @Subject()), \"b\")");
    let Expr::Function(call) = &expr else {
        panic!("expected function");
    };
    assert_eq!(call.name(), "If");
    assert_eq!(call.arg_count(), 3);
    assert_eq!(call.args()[1].function_name(), Some("Concat"));
}

#[test]
fn test_function_syntax_errors() {
    let cases = vec![
        ("@", ParseErrorCode::InvalidFunctionName),
        ("@(1)", ParseErrorCode::InvalidFunctionName),
        ("@Seen", ParseErrorCode::FunctionWithoutParenthesis),
        ("@Seen 1", ParseErrorCode::FunctionWithoutParenthesis),
        ("@Seen(", ParseErrorCode::SyntaxError),
        ("@Seen())", ParseErrorCode::SyntaxError),
        ("@F(a,)", ParseErrorCode::SyntaxError),
        ("@F(,a)", ParseErrorCode::SyntaxError),
        ("@F(a b)", ParseErrorCode::SyntaxError),
        ("@F(a,,b)", ParseErrorCode::SyntaxError),
        ("(1)", ParseErrorCode::SyntaxError),
        (")", ParseErrorCode::SyntaxError),
        ("a, b", ParseErrorCode::SyntaxError),
        ("'unterminated", ParseErrorCode::SyntaxError),
    ];

    for (source, expected) in cases {
        assert_eq!(parse_error(source), expected, "source: {:?}", source);
    }
}

#[test]
fn test_more_than_one_expression() {
    assert_eq!(
        parse_error("@Seen() @Marked()"),
        ParseErrorCode::MacroContainsMoreThanOneExpr
    );
    assert_eq!(parse_error("1 2"), ParseErrorCode::MacroContainsMoreThanOneExpr);
}

#[test]
fn test_restricted_function() {
    assert!(Parser::new(MacroKind::RULE).parse("@Delete()").is_ok());
    assert!(Parser::new(MacroKind::MESSAGE).parse("@Delete()").is_ok());
    let err = Parser::new(MacroKind::SEARCH)
        .parse("@And(@Seen(), @Delete())")
        .unwrap_err();
    assert_eq!(err.code, ParseErrorCode::InvalidFunctionName);
    assert_eq!(err.position, Position::new(14, 1, 15));
}

#[test]
fn test_error_position() {
    let err = Parser::new(MacroKind::all())
        .parse("@And(\n  @Seen(),\n  %Bogus)")
        .unwrap_err();
    assert_eq!(err.code, ParseErrorCode::InvalidFieldName);
    assert_eq!(err.position.line, 3);
    assert_eq!(err.position.column, 3);
}

#[derive(Default)]
struct RecordingHandler {
    parse_errors: RefCell<Vec<(ParseErrorCode, Position)>>,
}

impl ErrorHandler for RecordingHandler {
    fn parse_error(&self, code: ParseErrorCode, position: Position) {
        self.parse_errors.borrow_mut().push((code, position));
    }

    fn evaluation_error(&self, _code: EvalErrorCode, _source: &str) {}
}

#[test]
fn test_error_handler_is_notified() {
    let handler = RecordingHandler::default();
    let parser = Parser::new(MacroKind::FILTER).with_error_handler(&handler);
    assert!(parser.parse("@Seen()").is_ok());
    assert!(parser.parse("@Seen() x").is_err());

    let errors = handler.parse_errors.borrow();
    assert_eq!(
        *errors,
        vec![(
            ParseErrorCode::MacroContainsMoreThanOneExpr,
            Position::new(8, 1, 9)
        )]
    );
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_to_source() {
    let cases = vec![
        ("@and( @seen() , Subject )", "@And(@Seen(),Subject)"),
        ("\"it's\"", r"'it\'s'"),
        ("/a\\/b/i", r"/a\/b/i"),
        (":mf_seen", ":MF_SEEN"),
        ("$x", "$x"),
        ("$0", "$0"),
        ("%size", "%Size"),
        ("-3", "-3"),
        ("<<E\nx\nE\n", r"'x\n'"),
    ];

    for (source, expected) in cases {
        assert_eq!(parse(source).to_source(), expected, "source: {:?}", source);
    }
}

#[test]
fn test_round_trip() {
    let sources = vec![
        "@If(@Contain(%Subject, 'a\\tb'), @Set('x', 1), @Progn(@Seen(), $x))",
        "@RegexMatch(From, /(\\w+)@example\\.(org|com)/i)",
        "@Defun('twice', @Add($1, $1))",
        "@Equal(:MF_SEEN, @Flag(:MF_SEEN))",
        "'quote \" and \\\\ backslash'",
    ];

    for source in sources {
        let first = parse(source);
        let second = parse(&first.to_source());
        assert_eq!(first, second, "source: {:?}", source);
    }
}

#[test]
fn test_message_type_hint() {
    let hint = |source: &str| {
        Parser::new(MacroKind::all())
            .parse(source)
            .unwrap()
            .message_type_hint()
    };
    assert_eq!(hint("@Seen()"), None);
    assert_eq!(hint("%Subject"), None);
    assert_eq!(hint("@Contain(Subject, 'x')"), Some(MessageType::Header));
    assert_eq!(hint("@Header('X-Spam')"), Some(MessageType::Header));
    assert_eq!(
        hint("@Or(@Contain(Subject, 'x'), @Contain(@Body(), 'y'))"),
        Some(MessageType::Text)
    );
}

// ============================================================================
// Macro kinds
// ============================================================================

#[test]
fn test_macro_kind_from_name_ignores_case() {
    assert_eq!(MacroKind::from_name_ignore_case("filter"), Some(MacroKind::FILTER));
    assert_eq!(MacroKind::from_name_ignore_case("FILTER"), Some(MacroKind::FILTER));
    assert_eq!(MacroKind::from_name_ignore_case("SyncFilter"), Some(MacroKind::SYNCFILTER));
    assert_eq!(MacroKind::from_name_ignore_case("nope"), None);
    assert_eq!(MacroKind::from_name("filter"), None);
}

proptest! {
    #[test]
    fn prop_literal_round_trip(text in "[a-zA-Z0-9 \\n\\t\\\\\"'/@$:%(),#<>]{0,40}") {
        let source = Expr::Literal(text.clone()).to_source();
        let parsed = Parser::new(MacroKind::all()).parse(&source).unwrap();
        prop_assert_eq!(parsed.into_root(), Expr::Literal(text));
    }
}
