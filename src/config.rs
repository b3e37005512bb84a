//! Application configuration loaded from environment variables.

use serde::Deserialize;
use tracing::warn;
use url::Url;

/// Development fallback for the token signing secret.
///
/// Only used outside production, and loudly.
pub const DEV_JWT_SECRET: &str = "your-secret-key";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Listen port for the gateway.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment: development, staging, production.
    #[serde(default = "default_app_env")]
    pub app_env: String,

    // === Authentication ===
    /// HS256 signing secret used to verify bearer tokens.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    // === Upstream Services ===
    /// Auth service base URL (login/token issuance, no auth gate).
    #[serde(default = "default_auth_service_url")]
    pub auth_service_url: String,

    /// Task service base URL.
    #[serde(default = "default_task_service_url")]
    pub task_service_url: String,

    /// Billing service base URL.
    #[serde(default = "default_billing_service_url")]
    pub billing_service_url: String,

    // === Rate Limiting ===
    /// Fixed-window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Maximum requests per client per window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    // === Error Log ===
    /// Path to the append-only error log file.
    #[serde(default = "default_error_log_path")]
    pub error_log_path: String,

    // === Upstream HTTP Client ===
    /// Total timeout for an upstream request, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Connect timeout for upstream connections, in milliseconds.
    #[serde(default = "default_upstream_connect_timeout_ms")]
    pub upstream_connect_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    3000
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_auth_service_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_task_service_url() -> String {
    "http://localhost:4001".to_string()
}

fn default_billing_service_url() -> String {
    "http://localhost:4002".to_string()
}

fn default_rate_limit_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_error_log_path() -> String {
    "error.log".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_upstream_connect_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.jwt_secret.as_deref().map_or(true, str::is_empty) {
            return Err("JWT_SECRET is required in production".to_string());
        }

        for (name, value) in [
            ("AUTH_SERVICE_URL", &self.auth_service_url),
            ("TASK_SERVICE_URL", &self.task_service_url),
            ("BILLING_SERVICE_URL", &self.billing_service_url),
        ] {
            let url = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(format!("{} must use http or https", name));
            }
        }

        if self.rate_limit_window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW_SECS must be at least 1".to_string());
        }

        if self.rate_limit_max_requests == 0 {
            return Err("RATE_LIMIT_MAX_REQUESTS must be at least 1".to_string());
        }

        if self.upstream_timeout_ms == 0 {
            return Err("UPSTREAM_TIMEOUT_MS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Whether this process runs in production.
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// The effective signing secret.
    ///
    /// Falls back to [`DEV_JWT_SECRET`] outside production, warning loudly.
    /// `validate` has already rejected the missing-secret case in production.
    pub fn signing_secret(&self) -> String {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                warn!(
                    "JWT_SECRET is not set; using the insecure development default. \
                     Do not do this outside local development."
                );
                DEV_JWT_SECRET.to_string()
            }
        }
    }
}
