// --- File: crates/clubhouse_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Base URL used when neither a config file nor the environment provides one.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mark the portal session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            secure_cookies: false,
        }
    }
}

// --- Club REST API ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Root of the club backend, e.g. `https://club.example.org/`.
    /// Loaded via CLUBHOUSE__API__BASE_URL or the legacy API_BASE_URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Unset means requests run to completion.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    /// Returns the base URL with exactly one trailing slash so relative
    /// endpoint paths join underneath it instead of replacing its last segment.
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim();
        if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

// --- Client-side storage ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// Directory holding one credentials file per portal session.
    /// When unset the credentials live in memory for the process lifetime.
    pub sessions_dir: Option<String>,
}

// --- Logging ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Directory for daily-rolling log files, in addition to stdout.
    pub directory: Option<String>,
}

// --- Payments ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaymentsConfig {
    /// Linked from every payment status report.
    pub dashboard_path: String,
    /// Where a member goes to retry after a failed payment.
    pub retry_path: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            dashboard_path: "/dashboard".to_string(),
            retry_path: "/finance".to_string(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_payments: bool,

    #[serde(default)]
    pub payments: Option<PaymentsConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_base_url_appends_single_slash() {
        let api = ApiConfig {
            base_url: "https://club.example.org/backend".to_string(),
            timeout_secs: None,
        };
        assert_eq!(api.normalized_base_url(), "https://club.example.org/backend/");

        let api = ApiConfig {
            base_url: "https://club.example.org/".to_string(),
            timeout_secs: None,
        };
        assert_eq!(api.normalized_base_url(), "https://club.example.org/");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.server.port, 8080);
        assert!(!config.use_payments);
        assert!(config.payments.is_none());
        assert!(config.storage.sessions_dir.is_none());
    }
}
