use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Run pending migrations on startup.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_true")]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            cookie_name: default_cookie_name(),
            token_ttl_secs: default_token_ttl(),
            secure_cookie: true,
        }
    }
}

/// Where avatars live and how long existence answers are trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    #[serde(default)]
    pub store: BlobStoreKind,
    /// Directory for the `local` store.
    #[serde(default = "default_blob_dir")]
    pub dir: String,
    /// Bucket endpoint for the `http` store, e.g. `https://bucket.example.com`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Prefix of the URL reported to clients.
    #[serde(default = "default_public_base")]
    pub public_base: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Zero disables the background sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            store: BlobStoreKind::default(),
            dir: default_blob_dir(),
            endpoint: String::new(),
            bearer_token: None,
            public_base: default_public_base(),
            cache_ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlobStoreKind {
    #[default]
    Local,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_general_rps")]
    pub general_per_second: u64,
    #[serde(default = "default_general_burst")]
    pub general_burst: u64,
    #[serde(default = "default_auth_rps")]
    pub auth_per_second: u64,
    #[serde(default = "default_auth_burst")]
    pub auth_burst: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: default_general_rps(),
            general_burst: default_general_burst(),
            auth_per_second: default_auth_rps(),
            auth_burst: default_auth_burst(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool { true }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_cookie_name() -> String { "boba_jwt".into() }
fn default_token_ttl() -> u64 { 60 * 60 * 24 * 30 }
fn default_blob_dir() -> String { "data/avatars".into() }
fn default_public_base() -> String { "/api/avatars".into() }
fn default_cache_ttl() -> u64 { 300 }
fn default_sweep_interval() -> u64 { 600 }
fn default_max_upload() -> usize { 5 * 1024 * 1024 }
fn default_general_rps() -> u64 { 10 }
fn default_general_burst() -> u64 { 60 }
fn default_auth_rps() -> u64 { 1 }
fn default_auth_burst() -> u64 { 10 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), fall back to defaults when the file
    /// is absent, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|k| std::env::var(k).ok())
    }

    /// Same as [`normalize_and_validate`](Self::normalize_and_validate) with an
    /// explicit variable lookup.
    pub fn normalize_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize(&lookup)?;
        self.database.normalize_from_env(&lookup);
        self.database.validate()?;
        self.auth.normalize_from_env(&lookup);
        self.auth.validate()?;
        self.avatar.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) -> Result<()> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be a port number"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if self.url.trim().is_empty() {
            if let Some(url) = lookup("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.to_lowercase().starts_with("sqlite:")
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || self.is_sqlite()) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize_from_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(anyhow!("auth.cookie_name must not be empty"));
        }
        if self.token_ttl_secs == 0 {
            return Err(anyhow!("auth.token_ttl_secs must be > 0"));
        }
        Ok(())
    }
}

impl AvatarConfig {
    fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(anyhow!("avatar.cache_ttl_secs must be > 0"));
        }
        match self.store {
            BlobStoreKind::Local if self.dir.trim().is_empty() => {
                Err(anyhow!("avatar.dir is required for the local store"))
            }
            BlobStoreKind::Http
                if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) =>
            {
                Err(anyhow!("avatar.endpoint must start with http(s) for the http store"))
            }
            _ => Ok(()),
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.general_burst == 0 || self.auth_burst == 0 {
            return Err(anyhow!("rate_limit bursts must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn parses_full_file() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost/boba"
            max_connections = 20

            [auth]
            jwt_secret = "s3cret"

            [avatar]
            store = "http"
            endpoint = "https://bucket.example.com"
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 20);
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.avatar.store, BlobStoreKind::Http);
        assert_eq!(cfg.avatar.cache_ttl_secs, 60);
        assert_eq!(cfg.avatar.public_base, "/api/avatars");
        assert_eq!(cfg.auth.cookie_name, "boba_jwt");
    }

    #[test]
    fn env_fills_missing_secrets() {
        let mut cfg = AppConfig::default();
        cfg.normalize_with(env(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "from-env"),
            ("SERVER_PORT", "8181"),
        ]))
        .unwrap();
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert!(cfg.database.is_sqlite());
        assert_eq!(cfg.auth.jwt_secret, "from-env");
        assert_eq!(cfg.server.port, 8181);
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn rejects_missing_database_url() {
        let mut cfg = AppConfig::default();
        let err = cfg.normalize_with(env(&[("JWT_SECRET", "x")])).unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn rejects_unknown_scheme_and_bad_pool() {
        let mut db = DatabaseConfig { url: "mysql://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_err());
        db.url = "postgres://localhost/x".into();
        db.max_connections = 1;
        db.min_connections = 2;
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_zero_cache_ttl() {
        let mut cfg = AppConfig::default();
        cfg.avatar.cache_ttl_secs = 0;
        let err = cfg
            .normalize_with(env(&[("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "x")]))
            .unwrap_err();
        assert!(err.to_string().contains("cache_ttl_secs"));
    }
}
