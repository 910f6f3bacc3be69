use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub security: SecurityConfig,

    pub bootstrap: BootstrapConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 4)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/store.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 4,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for access tokens.
    pub access_secret: String,

    /// HMAC key for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,

    /// Access token lifetime in milliseconds. Refresh tokens live 25% longer.
    pub token_lifetime_ms: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-access".to_string(),
            refresh_secret: "change-me-refresh".to_string(),
            token_lifetime_ms: 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

/// Identity seeded at startup when its email is not yet registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Fallback identity for requests without a token.
    pub anonymous: SeedUser,

    pub super_admin: Option<SeedUser>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            anonymous: SeedUser {
                name: "Anonymous User".to_string(),
                email: "anonymous@gmail.com".to_string(),
                password: "simple_password".to_string(),
                number: Some("1816785381".to_string()),
            },
            super_admin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "store-api".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            bootstrap: BootstrapConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env`, the first config file found, then environment overrides.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Applies the deployment variables on top of file values.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid SERVER_PORT: {port}"))?;
        }
        if let Some(secret) = lookup("JWT_SECRET_KEY") {
            self.auth.access_secret = secret;
        }
        if let Some(secret) = lookup("JWT_REFRESH_KEY") {
            self.auth.refresh_secret = secret;
        }
        if let Some(lifetime) = lookup("REGULAR_TOKEN_LIFETIME") {
            self.auth.token_lifetime_ms = lifetime
                .parse()
                .with_context(|| format!("Invalid REGULAR_TOKEN_LIFETIME: {lifetime}"))?;
        }

        let admin = (
            lookup("SUPER_ADMIN_NAME"),
            lookup("SUPER_ADMIN_EMAIL"),
            lookup("SUPER_ADMIN_PASSWORD"),
        );
        match admin {
            (Some(name), Some(email), Some(password)) => {
                self.bootstrap.super_admin = Some(SeedUser {
                    name,
                    email,
                    password,
                    number: lookup("SUPER_ADMIN_NUMBER"),
                });
            }
            (None, None, None) => {}
            _ => anyhow::bail!(
                "SUPER_ADMIN_NAME, SUPER_ADMIN_EMAIL and SUPER_ADMIN_PASSWORD must be set together"
            ),
        }

        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("store-api").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".store-api").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.access_secret.is_empty() || self.auth.refresh_secret.is_empty() {
            anyhow::bail!("Token secrets cannot be empty");
        }

        if self.auth.access_secret == self.auth.refresh_secret {
            anyhow::bail!("Access and refresh token secrets must differ");
        }

        if self.auth.token_lifetime_ms < crate::auth::token::MIN_LIFETIME_MS {
            anyhow::bail!(
                "Token lifetime must be at least {}ms",
                crate::auth::token::MIN_LIFETIME_MS
            );
        }

        if let Some(admin) = &self.bootstrap.super_admin
            && (admin.email.is_empty() || admin.password.is_empty())
        {
            anyhow::bail!("Super admin email and password cannot be empty");
        }

        if self.bootstrap.anonymous.email.is_empty() {
            anyhow::bail!("Anonymous user email cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_lifetime_ms, 3_600_000);
        assert_eq!(config.bootstrap.anonymous.email, "anonymous@gmail.com");
        assert!(config.bootstrap.super_admin.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[auth]"));
        assert!(toml_str.contains("[bootstrap.anonymous]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            token_lifetime_ms = 5000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.token_lifetime_ms, 5000);
        assert_eq!(config.auth.access_secret, "change-me-access");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("JWT_SECRET_KEY", "a"),
                ("JWT_REFRESH_KEY", "b"),
                ("REGULAR_TOKEN_LIFETIME", "120000"),
                ("SERVER_PORT", "9000"),
                ("SUPER_ADMIN_NAME", "Root"),
                ("SUPER_ADMIN_EMAIL", "root@example.com"),
                ("SUPER_ADMIN_PASSWORD", "secret-password"),
            ]))
            .unwrap();

        assert_eq!(config.auth.access_secret, "a");
        assert_eq!(config.auth.refresh_secret, "b");
        assert_eq!(config.auth.token_lifetime_ms, 120_000);
        assert_eq!(config.server.port, 9000);

        let admin = config.bootstrap.super_admin.unwrap();
        assert_eq!(admin.email, "root@example.com");
        assert!(admin.number.is_none());
    }

    #[test]
    fn test_partial_super_admin_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup_from(&[("SUPER_ADMIN_EMAIL", "x@y.z")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = Config::default();
        config.auth.refresh_secret = config.auth.access_secret.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.token_lifetime_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.token_lifetime_ms = 500;
        assert!(config.validate().is_err());

        config.auth.token_lifetime_ms = 1_000;
        assert!(config.validate().is_ok());
    }
}
