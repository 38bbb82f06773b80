//! Application configuration loaded from environment variables.
//!
//! The Expo access token is optional: without it, push requests are sent
//! unauthenticated, which Expo accepts for projects that have not enabled
//! enhanced push security.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS (admin tools)
    pub frontend_url: String,
    /// Expo push API access token (optional)
    pub expo_access_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            expo_access_token: env::var("EXPO_ACCESS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            expo_access_token: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
