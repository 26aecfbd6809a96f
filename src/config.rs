use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    /// Origin prefixed to photo URLs, e.g. `https://venues.example.com`.
    pub server_domain: String,
    /// Request body limit for profile submissions.
    pub max_upload_bytes: usize,
    pub secure_cookies: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Venue booking back office")]
pub struct Args {
    /// Host to bind to (overrides VENUE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides VENUE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where photos are stored (overrides VENUE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides VENUE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Public origin used in photo URLs (overrides VENUE_SERVER_DOMAIN)
    #[arg(long)]
    pub server_domain: Option<String>,

    /// Maximum request body size in bytes (overrides VENUE_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Mark the session cookie `Secure` (overrides VENUE_SECURE_COOKIES)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // A missing .env is fine.
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("loading .env");
            }
        }

        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("VENUE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parsed_var("VENUE_PORT", 8080)?;
        let env_storage = env::var("VENUE_STORAGE_DIR").unwrap_or_else(|_| "./data/blobs".into());
        let env_db = env::var("VENUE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/venue.db".into());
        let env_domain =
            env::var("VENUE_SERVER_DOMAIN").unwrap_or_else(|_| "http://localhost:8080".into());
        let env_max_upload = parsed_var("VENUE_MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?;
        let env_secure = parsed_var("VENUE_SECURE_COOKIES", false)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            server_domain: args.server_domain.unwrap_or(env_domain),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            secure_cookies: args.secure_cookies || env_secure,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests(storage_dir: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            storage_dir: storage_dir.into(),
            database_url: "sqlite::memory:".into(),
            server_domain: "http://venues.test".into(),
            max_upload_bytes: 1024 * 1024,
            secure_cookies: false,
        }
    }
}
