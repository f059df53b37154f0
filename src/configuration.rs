use std::fmt;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub token: TokenSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    pub secret_key: String,
    #[serde(default = "default_max_age")]
    pub max_age_seconds: i64,
    #[serde(default = "default_salt")]
    pub salt: String,
    #[serde(default = "default_prune_interval")]
    pub prune_interval_seconds: u64,
}

impl TokenSettings {
    pub fn new(secret_key: impl Into<String>, max_age_seconds: i64) -> Self {
        Self {
            secret_key: secret_key.into(),
            max_age_seconds,
            salt: default_salt(),
            prune_interval_seconds: default_prune_interval(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("token.secret_key".to_string()));
        }
        if self.max_age_seconds <= 0 {
            return Err(ConfigError::InvalidValue(format!(
                "token.max_age_seconds must be positive, got {}",
                self.max_age_seconds
            )));
        }
        if self.prune_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "token.prune_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret_key", &"[redacted]")
            .field("max_age_seconds", &self.max_age_seconds)
            .field("salt", &self.salt)
            .field("prune_interval_seconds", &self.prune_interval_seconds)
            .finish()
    }
}

/// Auth cookie attributes
#[derive(serde::Deserialize, Clone, Debug)]
pub struct CookieSettings {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub secure: bool,
    #[serde(default = "default_true")]
    pub http_only: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            secure: true,
            http_only: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_age() -> i64 {
    3600
}

fn default_salt() -> String {
    "auth_salt".to_string()
}

fn default_prune_interval() -> u64 {
    60
}

fn default_cookie_name() -> String {
    "auth_cookie".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

/// Load settings from `configuration.{yaml,toml,json}` (optional) and
/// `APP__SECTION__KEY` environment variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_settings_defaults() {
        let settings = TokenSettings::new("k1", 3600);
        assert_eq!(settings.salt, "auth_salt");
        assert_eq!(settings.prune_interval_seconds, 60);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let settings = TokenSettings::new("", 3600);
        assert!(matches!(settings.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_non_positive_max_age_rejected() {
        assert!(TokenSettings::new("k1", 0).validate().is_err());
        assert!(TokenSettings::new("k1", -5).validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = TokenSettings::new("super-secret-value", 60);
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn test_cookie_settings_default() {
        let cookie = CookieSettings::default();
        assert_eq!(cookie.name, "auth_cookie");
        assert_eq!(cookie.path, "/");
        assert!(cookie.http_only);
    }

    #[test]
    fn test_connection_string() {
        let db = DatabaseSettings {
            username: "app".to_string(),
            password: "pw".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "auth".to_string(),
        };
        assert_eq!(db.connection_string(), "postgres://app:pw@localhost:5432/auth");
    }
}
