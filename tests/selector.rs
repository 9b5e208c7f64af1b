//! End-to-end selection tests against a local chat-completion stub.

use std::io::Read;
use std::io::Write;
use std::thread;

use serde_json::{json, Value as JsonValue};
use tiny_http::{Header, Response, Server};

use llm_action_selector::{
    ActionSelector, CandidateAction, InputField, Role, Selection, SelectorConfig,
};

/// Serve the given `(status, body)` replies in order on an ephemeral port,
/// returning the port and a handle that yields the captured request bodies.
fn spawn_llm_stub(replies: Vec<(u16, String)>) -> (u16, thread::JoinHandle<Vec<String>>) {
    let server = Server::http("127.0.0.1:0").expect("bind stub server");
    let port = server.server_addr().to_ip().expect("ip addr").port();
    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in replies {
            let mut request = server.recv().expect("stub request");
            let mut received = String::new();
            request
                .as_reader()
                .read_to_string(&mut received)
                .expect("read request body");
            captured.push(received);
            let header: Header = "Content-Type: application/json".parse().expect("header");
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            request.respond(response).expect("respond");
        }
        captured
    });
    (port, handle)
}

/// OpenAI-shaped 200 body whose message content is `content`.
fn openai_reply(content: &str) -> (u16, String) {
    let body = json!({
        "choices": [{"message": {"content": content}}],
        "usage": {"total_tokens": 42}
    })
    .to_string();
    (200, body)
}

fn selector(port: u16) -> ActionSelector {
    let config = SelectorConfig::new("http://127.0.0.1", port)
        .goal("Log in with username john and password demo")
        .app("Parabank");
    ActionSelector::new(config).expect("selector")
}

fn login_candidates() -> Vec<CandidateAction> {
    vec![CandidateAction::click("ACT01", "Login button")]
}

#[test]
fn selected_click_action_round_trip() {
    let (port, stub) = spawn_llm_stub(vec![openai_reply(r#"{"actionId":"ACT01","input":""}"#)]);
    let mut selector = selector(port);

    let outcome = selector.select(&login_candidates());

    match outcome {
        Selection::Execute(resolved) => {
            assert_eq!(resolved.id, "ACT01");
            assert_eq!(resolved.description, "Login button");
            assert_eq!(resolved.input, None);
        }
        other => panic!("expected an action, got {other:?}"),
    }

    // Prompt and reply, nothing else.
    assert_eq!(selector.conversation().len(), 2);
    assert_eq!(selector.conversation().snapshot()[0].role, Role::User);
    assert_eq!(selector.conversation().snapshot()[1].role, Role::Assistant);
    assert_eq!(selector.history().len(), 1);
    assert_eq!(selector.tokens_used(), 42);

    let requests = stub.join().unwrap();
    let body: JsonValue = serde_json::from_str(&requests[0]).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("ACT01: Click on 'Login button'"));
    assert!(prompt.contains("Which action should be executed to accomplish the test goal?"));
}

#[test]
fn typed_input_is_bound_and_recorded_in_history() {
    let (port, stub) = spawn_llm_stub(vec![openai_reply(
        r#"{"actionId":"ACT02","input":"john"}"#,
    )]);
    let mut selector = selector(port);
    let candidates = vec![
        CandidateAction::click("ACT01", "Login button"),
        CandidateAction::type_into("ACT02", "Username", InputField::default()),
    ];

    let outcome = selector.select(&candidates);

    match outcome {
        Selection::Execute(resolved) => {
            assert_eq!(resolved.input.as_deref(), Some("john"));
        }
        other => panic!("expected an action, got {other:?}"),
    }
    let history: Vec<&str> = selector.history().iter().collect();
    assert_eq!(history, vec!["Type 'john' into 'Username'"]);
    stub.join().unwrap();
}

#[test]
fn complete_reply_terminates_without_assistant_message() {
    let (port, stub) = spawn_llm_stub(vec![openai_reply(r#"{"actionId":"complete"}"#)]);
    let mut selector = selector(port);

    let outcome = selector.select(&login_candidates());

    assert_eq!(outcome, Selection::Terminate);
    // Only the prompt was appended; no assistant reply follows it.
    assert_eq!(selector.conversation().len(), 1);
    assert_eq!(selector.conversation().snapshot()[0].role, Role::User);
    assert!(selector.history().is_empty());
    stub.join().unwrap();
}

#[test]
fn malformed_reply_appends_one_corrective_message() {
    let (port, stub) = spawn_llm_stub(vec![openai_reply("not-json")]);
    let mut selector = selector(port);

    let outcome = selector.select(&login_candidates());

    assert_eq!(outcome, Selection::NoOp);
    // Prompt plus exactly one corrective user message describing the shape.
    assert_eq!(selector.conversation().len(), 2);
    let corrective = &selector.conversation().snapshot()[1];
    assert_eq!(corrective.role, Role::User);
    assert!(corrective.content.contains("was not formatted correctly"));
    assert!(corrective.content.contains("\"actionId\""));
    assert!(selector.history().is_empty());
    stub.join().unwrap();
}

#[test]
fn out_of_range_reply_appends_invalid_id_message() {
    let (port, stub) = spawn_llm_stub(vec![openai_reply(r#"{"actionId":"ACT99"}"#)]);
    let mut selector = selector(port);

    let outcome = selector.select(&login_candidates());

    assert_eq!(outcome, Selection::NoOp);
    assert_eq!(selector.conversation().len(), 2);
    let corrective = &selector.conversation().snapshot()[1];
    assert_eq!(corrective.role, Role::User);
    assert!(corrective.content.contains("'ACT99'"));
    assert!(corrective.content.contains("invalid"));
    assert!(selector.history().is_empty());
    stub.join().unwrap();
}

#[test]
fn http_error_leaves_conversation_and_history_untouched() {
    let (port, stub) = spawn_llm_stub(vec![(500, "model exploded".to_string())]);
    let mut selector = selector(port);

    let outcome = selector.select(&login_candidates());

    assert_eq!(outcome, Selection::NoOp);
    assert_eq!(selector.conversation().len(), 0);
    assert!(selector.history().is_empty());
    stub.join().unwrap();
}

#[test]
fn unreachable_endpoint_leaves_conversation_untouched() {
    // Nothing listens on port 1.
    let mut selector = selector(1);

    let outcome = selector.select(&login_candidates());

    assert_eq!(outcome, Selection::NoOp);
    assert_eq!(selector.conversation().len(), 0);
    assert!(selector.history().is_empty());
}

#[test]
fn fewshot_priming_is_sent_ahead_of_the_live_prompt() {
    let mut fewshot = tempfile::NamedTempFile::new().expect("temp file");
    fewshot
        .write_all(
            br#"[
                {"role": "system", "content": "You select test actions."},
                {"role": "user", "content": "Example prompt"},
                {"role": "assistant", "content": "{\"actionId\": \"ACT01\"}"}
            ]"#,
        )
        .expect("write fewshot");

    let (port, stub) = spawn_llm_stub(vec![openai_reply(r#"{"actionId":"ACT01","input":""}"#)]);
    let config = SelectorConfig::new("http://127.0.0.1", port)
        .goal("Log in")
        .app("Parabank")
        .fewshot(fewshot.path());
    let mut selector = ActionSelector::new(config).expect("selector");

    let outcome = selector.select(&login_candidates());
    assert!(matches!(outcome, Selection::Execute(_)));

    // 3 priming messages + prompt + assistant reply.
    assert_eq!(selector.conversation().len(), 5);

    let requests = stub.join().unwrap();
    let body: JsonValue = serde_json::from_str(&requests[0]).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[3]["role"], "user");
}

#[test]
fn consecutive_failures_hit_the_recovery_limit() {
    let (port, stub) = spawn_llm_stub(vec![
        openai_reply("not-json"),
        openai_reply("still not json"),
    ]);
    let config = SelectorConfig::new("http://127.0.0.1", port)
        .goal("Log in")
        .app("Parabank")
        .recovery_limit(1);
    let mut selector = ActionSelector::new(config).expect("selector");

    assert_eq!(selector.select(&login_candidates()), Selection::NoOp);
    assert_eq!(selector.select(&login_candidates()), Selection::Terminate);
    stub.join().unwrap();
}

#[test]
fn successful_selection_resets_the_recovery_counter() {
    let (port, stub) = spawn_llm_stub(vec![
        openai_reply("not-json"),
        openai_reply(r#"{"actionId":"ACT01","input":""}"#),
        openai_reply("not-json"),
    ]);
    let config = SelectorConfig::new("http://127.0.0.1", port)
        .goal("Log in")
        .app("Parabank")
        .recovery_limit(1);
    let mut selector = ActionSelector::new(config).expect("selector");

    assert_eq!(selector.select(&login_candidates()), Selection::NoOp);
    assert!(matches!(
        selector.select(&login_candidates()),
        Selection::Execute(_)
    ));
    // The counter was reset, so one more failure is still tolerated.
    assert_eq!(selector.select(&login_candidates()), Selection::NoOp);
    stub.join().unwrap();
}

#[test]
fn history_window_feeds_back_into_the_next_prompt() {
    let (port, stub) = spawn_llm_stub(vec![
        openai_reply(r#"{"actionId":"ACT01","input":""}"#),
        openai_reply(r#"{"actionId":"ACT01","input":""}"#),
    ]);
    let mut selector = selector(port);

    selector.select(&login_candidates());
    selector.select(&login_candidates());

    let requests = stub.join().unwrap();
    let first: JsonValue = serde_json::from_str(&requests[0]).unwrap();
    let second: JsonValue = serde_json::from_str(&requests[1]).unwrap();
    let first_prompt = first["messages"][0]["content"].as_str().unwrap();
    let second_prompt = second["messages"][2]["content"].as_str().unwrap();
    assert!(!first_prompt.contains("Previously executed"));
    assert!(second_prompt.contains("Previously executed: Click on 'Login button'"));
}

#[test]
fn invalid_configuration_fails_at_construction() {
    let config = SelectorConfig::new("", 1234);
    assert!(ActionSelector::new(config).is_err());
}
