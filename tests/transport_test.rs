//! End-to-end tests of the enhancement core over real HTTP against a mock server.

use pmpt::config::{Config, Provider};
use pmpt::dispatcher::{Dispatcher, ANTHROPIC_VERSION};
use pmpt::enhancer::Enhancer;
use pmpt::error::{ConfigurationError, Error, Phase};
use pmpt::http_client::ReqwestHttpClient;
use pmpt::providers::Protocol;
use pmpt::styles::StyleKey;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn custom_config(base_url: &str) -> Config {
    Config {
        base_url: Some(format!("{}/v1", base_url)),
        api_key: Some("sk-test".to_string()),
        model: Some("test-model".to_string()),
        ..Config::default()
    }
}

fn enhancer(config: Config, timeout: Duration) -> Enhancer {
    let http = ReqwestHttpClient::new(timeout).expect("client should build");
    Enhancer::new(Arc::new(config), Dispatcher::new(Arc::new(http)))
}

#[tokio::test]
async fn test_openai_compatible_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "temperature": 0.7,
            "messages": [
                {"role": "system", "content": StyleKey::Gentle.system_instruction(None)},
                {"role": "user", "content": "make it better"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "\n Make it much better. \n"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = enhancer(custom_config(&server.uri()), Duration::from_secs(5))
        .enhance("make it better", None)
        .await
        .unwrap();

    assert_eq!(result, "Make it much better.");
}

#[tokio::test]
async fn test_anthropic_compatible_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", ANTHROPIC_VERSION))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 2000,
            "messages": [{"role": "user", "content": "summarize this"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "  Summarize the following text.  "}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = custom_config(&server.uri());
    config.protocol = Some("anthropic".to_string());

    let result = enhancer(config, Duration::from_secs(5))
        .enhance("summarize this", None)
        .await
        .unwrap();

    assert_eq!(result, "Summarize the following text.");
}

#[tokio::test]
async fn test_rate_limit_is_response_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = enhancer(custom_config(&server.uri()), Duration::from_secs(5))
        .enhance("prompt", None)
        .await
        .unwrap_err();

    match err {
        Error::Enhancement(err) => {
            assert_eq!(err.phase, Phase::Response);
            assert_eq!(err.protocol, Protocol::OpenAiCompatible);
            assert_eq!(err.cause, "HTTP 429: Rate limit reached");
        }
        other => panic!("expected enhancement error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_request_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({"choices": [{"message": {"content": "late"}}]})),
        )
        .mount(&server)
        .await;

    let err = enhancer(custom_config(&server.uri()), Duration::from_millis(200))
        .enhance("prompt", None)
        .await
        .unwrap_err();

    match err {
        Error::Enhancement(err) => {
            assert_eq!(err.phase, Phase::Request);
            assert!(!err.cause.is_empty());
        }
        other => panic!("expected enhancement error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let err = enhancer(custom_config("http://127.0.0.1:1"), Duration::from_secs(2))
        .enhance("prompt", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Enhancement(ref e) if e.phase == Phase::Request));
}

#[tokio::test]
async fn test_missing_endpoint_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        api_key: Some("sk-test".to_string()),
        model: Some("test-model".to_string()),
        ..Config::default()
    };

    let err = enhancer(config, Duration::from_secs(5))
        .enhance("prompt", None)
        .await
        .unwrap_err();

    assert_eq!(err, Error::Configuration(ConfigurationError::NoEndpoint));
}

#[tokio::test]
async fn test_concurrent_enhancements_get_their_own_results() {
    let server = MockServer::start().await;

    for (prompt, answer, delay) in [("first", "First, improved.", 300), ("second", "Second, improved.", 10)] {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"messages": [{"role": "system"}, {"role": "user", "content": prompt}]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(delay))
                    .set_body_json(json!({"choices": [{"message": {"content": answer}}]})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let enhancer = enhancer(custom_config(&server.uri()), Duration::from_secs(5));
    let (first, second) = tokio::join!(enhancer.enhance("first", None), enhancer.enhance("second", None));

    assert_eq!(first.unwrap(), "First, improved.");
    assert_eq!(second.unwrap(), "Second, improved.");
}

#[test]
fn test_named_provider_endpoints() {
    let config = Config {
        provider: Some(Provider::OpenRouter),
        ..Config::default()
    };
    let resolved = pmpt::providers::resolve(&config).unwrap();

    assert_eq!(resolved.endpoint, "https://openrouter.ai/api/v1");
    assert!(resolved.extra_headers.iter().any(|(k, v)| k == "HTTP-Referer" && v == "pmpt-cli"));
}
