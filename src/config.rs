use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the backend serving both the catalog and progress endpoints
    #[serde(default = "default_backend_base_url")]
    pub backend_base_url: String,

    /// Session cookie issued by the auth service, sent as the `Cookie` header
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// User the session belongs to (log context only, the backend resolves the user from the cookie)
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Per-request timeout for every catalog and progress call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_user_id() -> String {
    "anonymous".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builds the HTTP client shared by the catalog and progress store clients
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?;
        Ok(client)
    }
}
