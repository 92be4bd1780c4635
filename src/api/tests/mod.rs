use super::*;
use crate::archive::tests::zip_bytes;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


const BOUNDARY: &str = "----bipExtractBoundary7MA4YWxkTrZu0gW";

/// Config whose working directories land in a throwaway root
fn test_config() -> (Arc<Config>, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.extraction.work_root = Some(root.path().to_path_buf());
    (Arc::new(config), root)
}

/// Build a multipart/form-data body with a single `file` field
fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// `Sales.xdmz` with two datasets and one valueset
fn sales_xdmz() -> Vec<u8> {
    let xml = r#"<dataModel xmlns="http://xmlns.oracle.com/oxp/xmlp">
   <dataSets>
      <dataSet name="HEADERS"><sql><![CDATA[select *
  from headers
 where 1 = 1]]></sql></dataSet>
      <dataSet name="LINES"><sql>select * from lines</sql></dataSet>
   </dataSets>
   <valueSets>
      <valueSet id="LOV_ORG"><sql>select id from orgs</sql></valueSet>
   </valueSets>
</dataModel>"#;
    zip_bytes(&[("Sales/Sales_datamodel.xdm", xml.as_bytes())])
}

#[tokio::test]
async fn test_api_server_spawns_and_shuts_down() {
    let (config, _root) = test_config();
    let mut config = (*config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(start_api_server(config, async move {
        rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (config, _root) = test_config();
    let app = create_router(config);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (config, _root) = test_config();
    let mut config = (*config).clone();
    config.api.cors_enabled = false;
    let app = create_router(Arc::new(config));

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origins() {
    let (config, _root) = test_config();
    let mut config = (*config).clone();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(Arc::new(config));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("Origin", "http://other.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (config, _root) = test_config();
    let response = create_router(config.clone())
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut disabled = (*config).clone();
    disabled.api.swagger_ui = false;
    let response = create_router(Arc::new(disabled))
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
