//! # bip-extract
//!
//! Extract SQL and report templates from Oracle BI Publisher archives.
//!
//! BI Publisher exports three ZIP-based container formats:
//! - **`.xdmz`** - a data model; its `*_datamodel.xdm` holds the SQL of every dataset and
//!   list of values
//! - **`.xdoz`** - a report; carries layout templates (RTF, XSL, Excel, CSV)
//! - **`.xdrz`** - a folder export holding any number of `.xdmz` and `.xdoz` members
//!
//! This crate turns any of them into a single ZIP of plain artifacts: one `.sql` file per
//! data model and a `templates/` directory with the collected layouts. It can be used as a
//! library or run as an HTTP service (`bip-extract` binary).
//!
//! ## Quick Start
//!
//! ```no_run
//! use bip_extract::{ExtractionConfig, InputArchive, extract};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("Finance.xdrz")?;
//!     let input = InputArchive::new("Finance.xdrz", bytes)?;
//!
//!     let result = extract(&input, &ExtractionConfig::default())?;
//!     println!(
//!         "{} queries, {} templates",
//!         result.summary.query_count(),
//!         result.summary.templates.len()
//!     );
//!     std::fs::write(&result.archive.file_name, &result.archive.bytes)?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// ZIP reading
pub mod archive;
/// Configuration types
pub mod config;
/// Datamodel SQL extraction
pub mod datamodel;
/// Error types
pub mod error;
/// Output packaging
pub mod packager;
/// Format dispatch and orchestration
pub mod pipeline;
/// Report definition lookup
pub mod report;
/// Template collection
pub mod templates;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Per-request working directories
pub mod workdir;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExtractionConfig, SqlLayout};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use pipeline::{Extraction, extract, extract_file};
pub use types::{
    ArchiveKind, DatamodelSummary, ExtractedQuery, ExtractionSummary, InputArchive,
    OutputArchive, QuerySource, TemplateFile,
};

/// Run the API server until a termination signal arrives, then drain in-flight requests.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use bip_extract::{Config, serve_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     serve_with_shutdown(Arc::new(Config::default())).await?;
///     Ok(())
/// }
/// ```
pub async fn serve_with_shutdown(config: std::sync::Arc<Config>) -> Result<()> {
    api::start_api_server(config, wait_for_signal()).await
}

/// Resolves on SIGTERM or Ctrl+C, whichever comes first
///
/// If no signal can be listened for, it never resolves and the server runs until killed.
async fn wait_for_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received SIGTERM, stopping extraction service");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, stopping extraction service"),
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = terminate => {}
        _ = interrupt => {}
    }
}
