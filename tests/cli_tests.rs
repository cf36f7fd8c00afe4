// tests/cli_tests.rs

#![cfg(feature = "cli")]

use qmacro::MacroKind;
use qmacro::cli::{
    CheckMode, CheckOptions, CheckResult, CliError, execute_check, functions_listing,
    json_to_message, parse_assignment, value_to_json,
};
use qmacro::message::{Message, MessageFlags, MessageHolder};
use qmacro::value::Value;
use serde_json::json;

fn options(source: &str, mode: CheckMode) -> CheckOptions {
    CheckOptions {
        source: source.to_string(),
        mode,
        ..CheckOptions::default()
    }
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn test_syntax_mode() {
    let result = execute_check(&options("@Seen()", CheckMode::Syntax)).unwrap();
    assert!(matches!(result, CheckResult::SyntaxValid));

    let err = execute_check(&options("@Seen(", CheckMode::Syntax)).unwrap_err();
    assert!(matches!(err, CliError::Parse(_)));
}

#[test]
fn test_format_mode() {
    let result = execute_check(&options("@and( @seen() , :mf_seen )", CheckMode::Format)).unwrap();
    match result {
        CheckResult::Formatted(text) => assert_eq!(text, "@And(@Seen(),:MF_SEEN)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_conditions_mode() {
    let result =
        execute_check(&options("@Or(@Seen(), @Not(@New()))", CheckMode::Conditions)).unwrap();
    match result {
        CheckResult::Conditions(json) => {
            assert_eq!(json["combinator"], "Or");
            assert_eq!(json["conditions"][1]["name"], "Old");
        }
        other => panic!("unexpected {:?}", other),
    }

    let result = execute_check(&options("@Concat('a')", CheckMode::Conditions)).unwrap();
    assert!(matches!(result, CheckResult::NotRepresentable));
}

#[test]
fn test_eval_mode() {
    let mut opts = options(
        "@If(@Contain(Subject, 'report'), @Concat($who, ' in ', @Folder()), 'no')",
        CheckMode::Eval,
    );
    opts.message = Some(r#"{"headers": {"Subject": "Weekly report"}}"#.to_string());
    opts.variables = vec![("who".to_string(), "me".to_string())];
    opts.folder = Some("Inbox".to_string());

    match execute_check(&opts).unwrap() {
        CheckResult::Value(json) => assert_eq!(json, json!("me in Inbox")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_eval_kind_and_modify() {
    let mut opts = options("@Delete()", CheckMode::Eval);
    opts.kind = MacroKind::SEARCH;
    assert!(matches!(execute_check(&opts), Err(CliError::Parse(_))));

    opts.kind = MacroKind::RULE;
    opts.message = Some(r#"{"id": 1}"#.to_string());
    assert!(matches!(execute_check(&opts), Err(CliError::Eval(_))));

    opts.modify = true;
    match execute_check(&opts).unwrap() {
        CheckResult::Value(json) => assert_eq!(json, json!(true)),
        other => panic!("unexpected {:?}", other),
    }
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_json_to_message() {
    let message = json_to_message(json!({
        "id": 9,
        "flags": ["seen", "junk"],
        "date": "2025-07-01T10:52:37+02:00",
        "headers": [["Received", "a"], ["Received", "b"], ["Subject", "hi"]],
        "body": "text",
    }))
    .unwrap();

    assert_eq!(message.id(), 9);
    assert_eq!(message.flags(), MessageFlags::SEEN | MessageFlags::JUNK);
    assert_eq!(message.subject(), "hi");
    assert_eq!(message.header("received").as_deref(), Some("a"));
    assert_eq!(message.body().as_deref(), Some("text"));
}

#[test]
fn test_json_to_message_errors() {
    let cases = vec![
        json!([]),
        json!({"id": "x"}),
        json!({"flags": ["bogus"]}),
        json!({"headers": {"Subject": 1}}),
        json!({"date": "yesterday"}),
        json!({"unexpected": true}),
    ];

    for case in cases {
        assert!(
            matches!(json_to_message(case.clone()), Err(CliError::InvalidMessage(_))),
            "case: {}",
            case
        );
    }
}

#[test]
fn test_value_to_json() {
    assert_eq!(value_to_json(&Value::Boolean(true)), json!(true));
    assert_eq!(value_to_json(&Value::Number(3)), json!(3));
    assert_eq!(value_to_json(&Value::string("x")), json!("x"));
    assert_eq!(
        value_to_json(&Value::field("X-Spam", None)),
        json!({"name": "X-Spam", "value": null})
    );
}

#[test]
fn test_parse_assignment() {
    assert_eq!(
        parse_assignment("a=b=c").unwrap(),
        ("a".to_string(), "b=c".to_string())
    );
    assert!(matches!(
        parse_assignment("=x"),
        Err(CliError::InvalidVariable(_))
    ));
    assert!(parse_assignment("novalue").is_err());
}

#[test]
fn test_functions_listing() {
    let listing = functions_listing();
    assert!(listing.contains("@RegexMatch"));
    assert!(listing.contains("[MESSAGE|RULE]"));
}
