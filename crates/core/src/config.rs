use serde::Deserialize;

/// Global application settings loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// PostgreSQL URL of the snapshot store populated by the pool scraper.
    pub database_url: String,

    /// Port for the API server.
    pub api_port: u16,

    /// Upper bound on store connections parked for reuse between requests.
    pub db_max_idle: usize,

    /// Seconds a single connection attempt may take before it counts as failed.
    pub db_connect_timeout_secs: u64,
}

impl Settings {
    /// Load settings from environment variables (with optional `.env` file).
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        Ok(Self {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/poolwatch".into()),
            api_port: var("API_PORT").unwrap_or_else(|| "3000".into()).parse()?,
            db_max_idle: var("DB_MAX_IDLE_CONNECTIONS")
                .unwrap_or_else(|| "10".into())
                .parse()?,
            db_connect_timeout_secs: var("DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|| "5".into())
                .parse()?,
        })
    }
}
