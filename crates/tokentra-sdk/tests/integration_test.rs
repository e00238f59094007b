//! End-to-end tests for the TokenTra SDK
//!
//! Real pipeline, real HTTP sink, collector mocked with wiremock.

use serde_json::{json, Value};
use std::time::Duration;
use tokentra_sdk::{
    Attribution, ManualUsage, Provider, ProviderClient, TokenTra, TokenTraConfig, TokenTraError,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

mod openai {
    use async_trait::async_trait;
    use serde::Serialize;
    use serde_json::{json, Value};
    use tokentra_sdk::ProviderClient;

    #[derive(Debug, Serialize)]
    pub struct ChatCompletionRequest {
        pub model: String,
        pub messages: Vec<Value>,
        pub stream: bool,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum OpenAIError {
        #[error("rate limited by provider")]
        RateLimited,
    }

    /// Stand-in for an OpenAI client; detected by its type path
    pub struct OpenAI {
        pub reject: bool,
    }

    #[async_trait]
    impl ProviderClient for OpenAI {
        type Request = ChatCompletionRequest;
        type Response = Value;
        type Error = OpenAIError;

        async fn create(&self, request: ChatCompletionRequest) -> Result<Value, OpenAIError> {
            if self.reject {
                return Err(OpenAIError::RateLimited);
            }
            Ok(json!({
                "model": request.model,
                "choices": [{"message": {"role": "assistant", "content": "hi"}}],
                "usage": {
                    "prompt_tokens": 1000,
                    "completion_tokens": 500,
                    "total_tokens": 1500
                }
            }))
        }
    }
}

mod anthropic {
    use async_trait::async_trait;
    use serde::Serialize;
    use serde_json::{json, Value};
    use tokentra_sdk::ProviderClient;

    #[derive(Debug, Serialize)]
    pub struct MessageRequest {
        pub model: String,
        pub max_tokens: u32,
        pub messages: Vec<Value>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("overloaded")]
    pub struct OverloadedError;

    pub struct Anthropic {
        pub fail: bool,
    }

    #[async_trait]
    impl ProviderClient for Anthropic {
        type Request = MessageRequest;
        type Response = Value;
        type Error = OverloadedError;

        async fn create(&self, _request: MessageRequest) -> Result<Value, OverloadedError> {
            if self.fail {
                return Err(OverloadedError);
            }
            Ok(json!({
                "type": "message",
                "usage": {
                    "input_tokens": 2000,
                    "output_tokens": 100,
                    "cache_read_input_tokens": 1000000
                }
            }))
        }
    }
}

mod cohere {
    use async_trait::async_trait;
    use serde_json::Value;
    use tokentra_sdk::ProviderClient;

    pub struct CohereClient;

    #[async_trait]
    impl ProviderClient for CohereClient {
        type Request = Value;
        type Response = Value;
        type Error = std::io::Error;

        async fn create(&self, request: Value) -> Result<Value, std::io::Error> {
            Ok(request)
        }
    }
}

async fn collector() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sdk/ingest"))
        .and(header("authorization", "Bearer tt_test_integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
        .mount(&server)
        .await;
    server
}

fn config(server: &MockServer) -> TokenTraConfig {
    TokenTraConfig::builder("tt_test_integration")
        .api_url(server.uri())
        .batch_size(10)
        .flush_interval(Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn received_events(server: &MockServer) -> Vec<Value> {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    requests
        .iter()
        .flat_map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["events"].as_array().cloned().unwrap_or_default()
        })
        .collect()
}

#[tokio::test]
async fn test_manual_tracking_end_to_end() {
    let server = collector().await;
    let sdk = TokenTra::start(config(&server)).unwrap();

    for _ in 0..5 {
        assert!(sdk.track(ManualUsage::new("openai", "gpt-4o", 1000, 500)));
    }
    sdk.flush().await;

    let stats = sdk.stats();
    assert_eq!(stats.requests_tracked, 5);
    assert_eq!(stats.telemetry_sent, 5);
    assert_eq!(stats.telemetry_failed, 0);
    assert_eq!(stats.telemetry_buffered, 0);

    let events = received_events(&server).await;
    assert_eq!(events.len(), 5);
    for event in &events {
        assert!((event["total_cost"].as_f64().unwrap() - 0.0075).abs() < 1e-9);
        assert_eq!(event["total_tokens"], 1500);
        assert_eq!(event["environment"], "production");
        assert_eq!(event["sdk_language"], "rust");
    }

    sdk.shutdown().await;
}

#[tokio::test]
async fn test_wrapped_clients_are_detected_and_metered() {
    let server = collector().await;
    let sdk = TokenTra::start(config(&server)).unwrap();

    let openai = sdk.wrap(openai::OpenAI { reject: false }).unwrap();
    let anthropic = sdk.wrap(anthropic::Anthropic { fail: false }).unwrap();
    assert_eq!(openai.provider(), Provider::OpenAi);
    assert_eq!(anthropic.provider(), Provider::Anthropic);

    let response = openai
        .create_with(
            openai::ChatCompletionRequest {
                model: "gpt-4o".into(),
                messages: vec![json!({"role": "user", "content": "hello"})],
                stream: true,
            },
            Some(Attribution::new().with_feature("chat").with_team("growth")),
        )
        .await
        .unwrap();
    assert_eq!(response["choices"][0]["message"]["content"], "hi");

    anthropic
        .create(anthropic::MessageRequest {
            model: "claude-3-5-sonnet-latest".into(),
            max_tokens: 256,
            messages: vec![json!({"role": "user", "content": "hello"})],
        })
        .await
        .unwrap();

    sdk.shutdown().await;

    let stats = sdk.stats();
    assert_eq!(stats.requests_tracked, 2);
    assert_eq!(stats.telemetry_sent, 2);
    assert_eq!((stats.cache_hits, stats.cache_misses), (1, 1));

    let events = received_events(&server).await;
    let openai_event = events.iter().find(|e| e["provider"] == "openai").unwrap();
    assert_eq!(openai_event["method_path"], "chat.completions.create");
    assert_eq!(openai_event["is_streaming"], true);
    assert_eq!(openai_event["feature"], "chat");
    assert_eq!(openai_event["team"], "growth");
    assert!(openai_event.get("cached_tokens").is_none());
    assert!(openai_event.get("prompt_hash").is_none());

    let anthropic_event = events.iter().find(|e| e["provider"] == "anthropic").unwrap();
    assert_eq!(anthropic_event["method_path"], "messages.create");
    assert_eq!(anthropic_event["cached_tokens"], 1_000_000);
    assert!((anthropic_event["cached_cost"].as_f64().unwrap() - 0.3).abs() < 1e-9);
    assert_eq!(anthropic_event["environment"], "production");
    assert!(anthropic_event.get("is_streaming").is_none());
}

#[tokio::test]
async fn test_provider_errors_pass_through_and_are_reported() {
    let server = collector().await;
    let sdk = TokenTra::start(config(&server)).unwrap();

    let openai = sdk.wrap(openai::OpenAI { reject: true }).unwrap();
    let anthropic = sdk.wrap(anthropic::Anthropic { fail: true }).unwrap();

    let err = openai
        .create(openai::ChatCompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![],
            stream: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, openai::OpenAIError::RateLimited));

    let err = anthropic
        .create(anthropic::MessageRequest {
            model: "claude-3-haiku-20240307".into(),
            max_tokens: 16,
            messages: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "overloaded");

    sdk.shutdown().await;
    assert_eq!(sdk.stats().errors, 2);

    let events = received_events(&server).await;
    assert_eq!(events.len(), 2);
    let codes: Vec<_> = events.iter().map(|e| e["error_code"].clone()).collect();
    assert!(codes.contains(&json!("OpenAIError")));
    assert!(codes.contains(&json!("OverloadedError")));
    for event in &events {
        assert_eq!(event["is_error"], true);
        assert_eq!(event["total_tokens"], 0);
        assert_eq!(event["total_cost"], 0.0);
    }
}

#[tokio::test]
async fn test_unsupported_client_is_rejected() {
    let server = collector().await;
    let sdk = TokenTra::start(config(&server)).unwrap();

    match sdk.wrap(cohere::CohereClient) {
        Err(TokenTraError::UnsupportedProvider(message)) => {
            assert!(message.contains("CohereClient"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("cohere client should not be wrappable"),
    }

    sdk.shutdown().await;
}

#[test]
fn test_invalid_api_key_is_rejected() {
    for key in ["sk-live-123", "tt_prod_123", "", "   "] {
        let result = TokenTraConfig::builder(key).build();
        assert!(
            matches!(result, Err(TokenTraError::InvalidApiKey(_))),
            "key {:?} should be rejected",
            key
        );
    }
}

#[tokio::test]
async fn test_collector_failure_never_reaches_callers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = TokenTraConfig::builder("tt_test_integration")
        .api_url(server.uri())
        .batch_size(2)
        .build()
        .unwrap();
    let sdk = TokenTra::start(config).unwrap();

    for _ in 0..3 {
        assert!(sdk.track(ManualUsage::new("openai", "gpt-4o", 10, 10)));
    }
    sdk.shutdown().await;

    let stats = sdk.stats();
    assert_eq!(stats.telemetry_failed, 3);
    assert_eq!(stats.telemetry_sent, 0);
    assert_eq!(sdk.queue_depth(), 0);
}

#[tokio::test]
async fn test_full_queue_drops_are_counted() {
    let server = collector().await;
    let config = TokenTraConfig::builder("tt_test_integration")
        .api_url(server.uri())
        .max_queue_size(3)
        .build()
        .unwrap();
    let sdk = TokenTra::start(config).unwrap();

    // Producers never yield here, so the worker cannot drain in between.
    let accepted = (0..5)
        .filter(|_| sdk.track(ManualUsage::new("openai", "gpt-4o", 1, 1)))
        .count();
    assert_eq!(accepted, 3);
    assert_eq!(sdk.stats().telemetry_dropped, 2);

    sdk.shutdown().await;
    assert_eq!(sdk.stats().telemetry_sent, 3);
}
