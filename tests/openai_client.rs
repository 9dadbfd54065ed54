use menu_structurer::{DisambiguationError, Disambiguator, OpenAiDisambiguator, parse_item_list};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiDisambiguator {
    OpenAiDisambiguator::new(
        "sk-test-key",
        "gpt-4o-mini",
        format!("{}/v1/chat/completions", server.uri()),
    )
    .unwrap()
}

fn items() -> Vec<String> {
    vec!["Buffalo Honey BBQ".to_string(), "Cajun".to_string()]
}

#[tokio::test]
async fn sends_chat_request_and_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.7,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "['Buffalo', 'Honey BBQ', 'Cajun']"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client_for(&server).disambiguate(&items()).await.unwrap();
    assert_eq!(parse_item_list(&answer), vec!["Buffalo", "Honey BBQ", "Cajun"]);

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(
        body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Buffalo Honey BBQ")
    );
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).disambiguate(&items()).await.unwrap_err();
    assert!(matches!(err, DisambiguationError::MalformedResponse(_)));
}

#[tokio::test]
async fn unexpected_shape_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let err = client_for(&server).disambiguate(&items()).await.unwrap_err();
    assert!(matches!(err, DisambiguationError::Http(_)));
}

#[tokio::test]
async fn error_status_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})))
        .mount(&server)
        .await;

    let err = client_for(&server).disambiguate(&items()).await.unwrap_err();
    match err {
        DisambiguationError::Http(inner) => {
            assert_eq!(inner.status().map(|s| s.as_u16()), Some(401));
        }
        other => panic!("expected http error, got {other:?}"),
    }
}
