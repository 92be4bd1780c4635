//! System handlers: health, OpenAPI, upload form.

use axum::{Json, response::Html, response::IntoResponse};
use serde_json::json;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>BI Publisher Extractor</title>
<style>
  body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; color: #222; }
  form { border: 1px solid #ccc; padding: 1.5rem; border-radius: 6px; }
  button { margin-top: 1rem; }
  small { color: #666; }
</style>
</head>
<body>
<h1>BI Publisher Extractor</h1>
<p>Upload a <code>.xdmz</code>, <code>.xdrz</code> or <code>.xdoz</code> file to get its SQL
and report templates as a ZIP.</p>
<form action="/api/v1/extract" method="post" enctype="multipart/form-data">
  <input type="file" name="file" accept=".xdmz,.xdrz,.xdoz" required>
  <br>
  <button type="submit">Extract</button>
</form>
<p><small>API documentation: <a href="/swagger-ui">/swagger-ui</a></small></p>
</body>
</html>
"#;

/// GET / - Browser upload form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
