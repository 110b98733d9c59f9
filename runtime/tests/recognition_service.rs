//! The chat-completions recognizer against a mock HTTP service.

use scout_runtime::config::RecognitionConfig;
use scout_runtime::locate::Locator;
use scout_runtime::recognition::{OpenAiRecognizer, MARKUP_CAP};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> RecognitionConfig {
    RecognitionConfig {
        api_key: "sk-test".into(),
        model: "test-model".into(),
        base_url: format!("{}/v1/", server.uri()),
        temperature: 0.7,
    }
}

fn reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_reply_with_fenced_json_is_parsed() {
    let server = MockServer::start().await;
    let content = "Here you go:\n```json\n{\"username_xpath\": \"//input[@name='user']\", \
                   \"password_xpath\": \"//input[@type='password']\", \"captcha_xpath\": \"\", \
                   \"login_button_xpath\": \"//button[@type='submit']\"}\n```";
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(content)))
        .expect(1)
        .mount(&server)
        .await;

    let recognizer = OpenAiRecognizer::new(config(&server));
    let found = recognizer.recognize_markup("<form><input name='user'></form>").await;

    assert_eq!(found.username, Some(Locator::xpath("//input[@name='user']")));
    assert_eq!(found.password, Some(Locator::xpath("//input[@type='password']")));
    assert_eq!(found.captcha, None);
    assert_eq!(found.submit, Some(Locator::xpath("//button[@type='submit']")));
}

#[tokio::test]
async fn test_server_error_yields_empty_elements() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let found = OpenAiRecognizer::new(config(&server))
        .recognize_markup("<form></form>")
        .await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_malformed_reply_yields_empty_elements() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("I could not find a login form {oops")))
        .mount(&server)
        .await;

    let found = OpenAiRecognizer::new(config(&server))
        .recognize_markup("<form></form>")
        .await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_unparseable_css_locator_is_discarded() {
    let server = MockServer::start().await;
    let content = r##"{"username_xpath": "input[[name", "password_xpath": "#pwd", "captcha_xpath": null, "login_button_xpath": ""}"##;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(content)))
        .mount(&server)
        .await;

    let found = OpenAiRecognizer::new(config(&server))
        .recognize_markup("<form></form>")
        .await;
    assert_eq!(found.username, None);
    assert_eq!(found.password, Some(Locator::css("#pwd")));
    assert_eq!(found.submit, None);
}

#[tokio::test]
async fn test_unconfigured_service_is_never_called() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.api_key = "  ".into();
    let found = OpenAiRecognizer::new(cfg).recognize_markup("<form></form>").await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_markup_is_capped_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("{}")))
        .mount(&server)
        .await;

    let markup = "§".repeat(MARKUP_CAP + 5_000);
    OpenAiRecognizer::new(config(&server))
        .recognize_markup(&markup)
        .await;

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 1000);
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert_eq!(user.chars().filter(|c| *c == '§').count(), MARKUP_CAP);
}
