//! OpenAPI documentation and schema generation
//!
//! The OpenAPI document is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the bip-extract REST API
///
/// Served at:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bip-extract REST API",
        version = "0.1.0",
        description = "Extract SQL and report templates from BI Publisher archives (.xdmz, .xdrz, .xdoz)",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8501", description = "Local development server")
    ),
    paths(
        // Extraction
        crate::api::routes::extract_archive,
        crate::api::routes::inspect_archive,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::ArchiveKind,
        crate::types::QuerySource,
        crate::types::ExtractedQuery,
        crate::types::TemplateFile,
        crate::types::DatamodelSummary,
        crate::types::ExtractionSummary,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "extraction", description = "Archive upload and extraction"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
