//! Runtime configuration from environment variables.

use std::env;

/// Object storage settings. Present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Use "auto" for Cloudflare R2
    pub region: String,
    /// Custom endpoint URL (required for R2)
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent: tables are kept in memory
    pub database_url: Option<String>,
    /// Absent: exam images are kept in memory
    pub s3: Option<S3Config>,
    pub seed_default_users: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            s3: None,
            seed_default_users: true,
        }
    }
}

impl Config {
    /// Read the configuration. Call `dotenvy::dotenv()` first to pick up a
    /// `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match non_empty("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got {p:?}"))?,
            None => defaults.port,
        };

        let s3 = match non_empty("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                region: non_empty("S3_REGION").unwrap_or_else(|| "auto".to_string()),
                endpoint: non_empty("S3_ENDPOINT"),
                access_key: non_empty("S3_ACCESS_KEY")
                    .ok_or_else(|| anyhow::anyhow!("S3_ACCESS_KEY not set"))?,
                secret_key: non_empty("S3_SECRET_KEY")
                    .ok_or_else(|| anyhow::anyhow!("S3_SECRET_KEY not set"))?,
            }),
            None => None,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            database_url: non_empty("DATABASE_URL"),
            s3,
            seed_default_users: non_empty("SEED_DEFAULT_USERS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.seed_default_users),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
