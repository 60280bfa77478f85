use super::*;
use riaa_protocols::selection::SelectionDescriptor;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RecommendClient {
    let endpoint = Url::parse(&format!("{}/v1/image-recommendations", server.uri())).unwrap();
    RecommendClient::new(endpoint, Duration::from_secs(2)).unwrap()
}

fn sample_request() -> RecommendationRequest {
    let descriptor = SelectionDescriptor::new()
        .with_id("hero")
        .with_label("Hero image")
        .with_tag_name("img")
        .with_selector("main img");
    RecommendationRequest::for_descriptor(
        &descriptor,
        MeasuredWidths {
            desktop: 640,
            mobile: 320,
        },
    )
}

#[tokio::test]
async fn test_recommend_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/image-recommendations"))
        .and(body_partial_json(serde_json::json!({
            "element": {"tagName": "img", "label": "Hero image"},
            "widths": {"desktop": 640, "mobile": 320}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "universalUploadSize": 1536,
            "desktopRenderSize": 640,
            "mobileRenderSize": 320,
            "explanation": "covers 2x desktop density"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).recommend(&sample_request()).await.unwrap();
    assert_eq!(response.universal_upload_size, Some(1536));
    assert_eq!(response.desktop_render_size, Some(640));
    assert_eq!(
        response.explanation.as_deref(),
        Some("covers 2x desktop density")
    );
}

#[tokio::test]
async fn test_recommend_empty_body_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let response = client_for(&server).recommend(&sample_request()).await.unwrap();
    assert_eq!(response.universal_upload_size, None);
    assert_eq!(response.explanation, None);
}

#[tokio::test]
async fn test_recommend_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).recommend(&sample_request()).await.unwrap_err();
    match err {
        RecommendError::Status { status } => assert_eq!(status, 503),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_recommend_network_failure() {
    // Nothing listens on this port.
    let endpoint = Url::parse("http://127.0.0.1:9/reco").unwrap();
    let client = RecommendClient::new(endpoint, Duration::from_millis(200)).unwrap();
    let err = client.recommend(&sample_request()).await.unwrap_err();
    assert!(matches!(err, RecommendError::Network(_)));
}

#[tokio::test]
async fn test_recommend_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).recommend(&sample_request()).await.unwrap_err();
    assert!(matches!(err, RecommendError::InvalidResponse(_)));
}

#[test]
fn test_request_metadata_source_host() {
    let descriptor = SelectionDescriptor::new().with_id("x").with_widths(
        riaa_protocols::selection::BreakpointWidths {
            desktop: Some(800),
            tablet: None,
            mobile: None,
        },
    );
    let request = RecommendationRequest::for_descriptor(
        &descriptor,
        MeasuredWidths {
            desktop: 800,
            mobile: 800,
        },
    );
    assert_eq!(
        request.metadata.unwrap().source.as_deref(),
        Some("host")
    );
}

#[test]
fn test_request_metadata_source_computed() {
    let descriptor = SelectionDescriptor::new().with_id("x").with_computed_widths(
        riaa_protocols::selection::BreakpointWidths::uniform(640),
    );
    let request = RecommendationRequest::for_descriptor(
        &descriptor,
        MeasuredWidths {
            desktop: 640,
            mobile: 640,
        },
    );
    let metadata = request.metadata.unwrap();
    assert_eq!(metadata.source.as_deref(), Some("computed"));
    assert_eq!(metadata.computed_widths.desktop, Some(640));
}

#[test]
fn test_request_serializes_camel_case() {
    let value = serde_json::to_value(sample_request()).unwrap();
    assert!(value["element"].get("tagName").is_some());
    assert!(value["metadata"].get("computedWidths").is_some());
}
