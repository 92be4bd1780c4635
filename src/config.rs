//! Configuration types for bip-extract

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};
use utoipa::ToSchema;

/// Main configuration
///
/// Every field has a default, so an empty TOML file (or no file at all) yields a
/// working service bound to `127.0.0.1:8501`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Extraction pipeline settings
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.extraction.template_extensions.is_empty() {
            return Err(Error::Config {
                message: "at least one template extension is required".to_string(),
                key: Some("template_extensions".to_string()),
            });
        }

        if let Some(ext) = self
            .extraction
            .template_extensions
            .iter()
            .find(|e| e.is_empty() || e.contains(['.', '/', '\\']))
        {
            return Err(Error::Config {
                message: format!("invalid template extension {ext:?} (use e.g. \"rtf\")"),
                key: Some("template_extensions".to_string()),
            });
        }

        if let Some(root) = &self.extraction.work_root
            && !root.is_dir()
        {
            return Err(Error::Config {
                message: format!("work root {} is not a directory", root.display()),
                key: Some("work_root".to_string()),
            });
        }

        if self.extraction.max_member_bytes == 0 {
            return Err(Error::Config {
                message: "max_member_bytes must be greater than zero".to_string(),
                key: Some("max_member_bytes".to_string()),
            });
        }

        if self.api.max_upload_bytes == 0 {
            return Err(Error::Config {
                message: "max_upload_bytes must be greater than zero".to_string(),
                key: Some("max_upload_bytes".to_string()),
            });
        }

        Ok(())
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8501)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Largest accepted upload in bytes (default: 200 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// How extracted SQL is laid out in the output archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SqlLayout {
    /// One `<model>.sql` per data model, one block per statement
    #[default]
    Combined,
    /// `<model>/<dataset>.sql` and `<model>/lv_<valueset>.sql`, one file per statement
    PerQuery,
}

/// Extraction pipeline configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractionConfig {
    /// Template extensions to collect, without dots, matched case-insensitively
    #[serde(default = "default_template_extensions")]
    pub template_extensions: Vec<String>,

    /// SQL artifact layout (default: combined)
    #[serde(default)]
    pub sql_layout: SqlLayout,

    /// Parent directory for per-request working directories (default: system temp dir)
    #[serde(default)]
    pub work_root: Option<PathBuf>,

    /// Comment line written at the top of every SQL artifact (without the `-- ` prefix)
    #[serde(default)]
    pub sql_header: Option<String>,

    /// Largest uncompressed archive member read, in bytes (default: 256 MiB)
    ///
    /// Nested archives inside an `.xdrz` count as members too.
    #[serde(default = "default_max_member_bytes")]
    pub max_member_bytes: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            template_extensions: default_template_extensions(),
            sql_layout: SqlLayout::default(),
            work_root: None,
            sql_header: None,
            max_member_bytes: default_max_member_bytes(),
        }
    }
}

impl ExtractionConfig {
    /// Whether `ext` (without dot) is on the template allow-list
    pub fn is_template_extension(&self, ext: &str) -> bool {
        self.template_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

fn default_max_member_bytes() -> u64 {
    crate::archive::DEFAULT_MAX_MEMBER_BYTES
}

fn default_template_extensions() -> Vec<String> {
    vec![
        "rtf".into(),
        "xsl".into(),
        "xlsx".into(),
        "xls".into(),
        "xlsm".into(),
        "csv".into(),
    ]
}
