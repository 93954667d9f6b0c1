//! HTTP background generator against a mock `:predict` endpoint.

mod common;

use poster_core::{AspectRatio, Rgba};
use poster_studio::{BackgroundGenerator, GenerationError, GeneratorConfig, HttpBackgroundGenerator};
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREDICT_PATH: &str = "/v1beta/models/imagen:predict";

fn generator(server: &MockServer, api_key: Option<&str>) -> HttpBackgroundGenerator {
    HttpBackgroundGenerator::new(&GeneratorConfig {
        endpoint: format!("{}{PREDICT_PATH}", server.uri()),
        api_key: api_key.map(str::to_string),
    })
    .expect("generator")
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_generate_returns_data_uri() {
    let server = MockServer::start().await;
    let payload = common::png_base64(9, 16, Rgba::rgb(0, 128, 255));

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "parameters": {"sampleCount": 1, "aspectRatio": "9:16"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": payload, "mimeType": "image/png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = generator(&server, Some("test-key"))
        .generate("aurora over mountains", AspectRatio::Portrait)
        .await
        .expect("generated");

    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data_uri, format!("data:image/png;base64,{payload}"));
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_prompt_carries_theme() {
    let server = MockServer::start().await;
    let payload = common::png_base64(4, 3, Rgba::WHITE);

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": payload}]
        })))
        .mount(&server)
        .await;

    let image = generator(&server, Some("k"))
        .generate("jazz night", AspectRatio::Classic)
        .await
        .expect("generated");
    // No mimeType in the response: sniffed from the payload.
    assert_eq!(image.mime_type, "image/png");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("json request body");
    let prompt = body["instances"][0]["prompt"].as_str().expect("prompt");
    assert!(prompt.contains("jazz night"));
    assert_eq!(body["parameters"]["aspectRatio"], "4:3");
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_service_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "prompt blocked by safety filter"}
        })))
        .mount(&server)
        .await;

    let err = generator(&server, Some("k"))
        .generate("anything", AspectRatio::Square)
        .await
        .expect_err("service error");

    match err {
        GenerationError::Service { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "prompt blocked by safety filter");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_empty_predictions_are_an_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = generator(&server, Some("k"))
        .generate("anything", AspectRatio::Square)
        .await
        .expect_err("empty");
    assert!(matches!(err, GenerationError::EmptyResult));
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_garbage_payload_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": "***not base64***"}]
        })))
        .mount(&server)
        .await;

    let err = generator(&server, Some("k"))
        .generate("anything", AspectRatio::Square)
        .await
        .expect_err("decode");
    assert!(matches!(err, GenerationError::Decode(_)));
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_valid_base64_that_is_not_an_image_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": "AAAAAAAA", "mimeType": "image/png"}]
        })))
        .mount(&server)
        .await;

    let err = generator(&server, Some("k"))
        .generate("anything", AspectRatio::Square)
        .await
        .expect_err("not an image");
    assert!(matches!(err, GenerationError::Decode(_)));
}

#[tokio::test]
#[cfg_attr(target_os = "macos", ignore = "wiremock/reqwest system-configuration issue on macOS")]
async fn test_missing_credential_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = generator(&server, None)
        .generate("anything", AspectRatio::Square)
        .await
        .expect_err("missing key");
    assert!(matches!(err, GenerationError::MissingCredential));
    assert!(server
        .received_requests()
        .await
        .expect("recording enabled")
        .is_empty());
}
