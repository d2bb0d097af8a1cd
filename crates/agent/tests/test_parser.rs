//! Tests for the robust action parser against a scripted model

mod common;

use common::ScriptedModel;
use stepwise_agent::{AgentError, RobustActionParser};

#[tokio::test]
async fn test_valid_output_never_calls_the_model() {
    let model = ScriptedModel::new(&[]);
    let parser = RobustActionParser::new(model.clone());

    let action = parser
        .parse(r#"{ "name": "list_dir", "args": { "path": "." } }"#)
        .await
        .unwrap();

    assert_eq!(action.name, "list_dir");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_repair_pass_fixes_malformed_output() {
    let model = ScriptedModel::new(&[r#"{ "name": "read_file", "args": { "path": "a.txt" } }"#]);
    let parser = RobustActionParser::new(model.clone());

    let action = parser
        .parse("I would like to read a.txt please")
        .await
        .unwrap();

    assert_eq!(action.name, "read_file");
    assert_eq!(model.calls(), 1);
    assert!(model.prompts()[0].contains("I would like to read a.txt please"));
}

#[tokio::test]
async fn test_repair_is_attempted_exactly_once() {
    let model = ScriptedModel::new(&["nope, still not json"]);
    let parser = RobustActionParser::new(model.clone());

    let err = parser.parse("first garbage").await.unwrap_err();

    assert_eq!(model.calls(), 1);
    match err {
        AgentError::Unparsable { raw } => assert_eq!(raw, "first garbage"),
        other => panic!("expected Unparsable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fenced_reply_accepted_without_repair() {
    let model = ScriptedModel::new(&[]);
    let parser = RobustActionParser::new(model.clone());

    let action = parser
        .parse("My choice:\n```json\n{ \"name\": \"FINISH\" }\n```")
        .await
        .unwrap();

    assert!(action.is_terminal());
    assert_eq!(model.calls(), 0);
}
