//! Configuration objects handed to the core at construction time.
//!
//! The crate never loads or parses configuration itself; callers build these
//! from whatever source they use (environment, files, a secrets manager) and
//! pass them in.

use secrecy::SecretString;
use std::time::Duration;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings for the auth façade: token signing secret and session lifetime.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    signing_secret: SecretString,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(signing_secret: SecretString) -> Self {
        Self {
            signing_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn signing_secret(&self) -> &SecretString {
        &self.signing_secret
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

/// Connection parameters and pool sizing for the relational store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    host: String,
    port: u16,
    database: String,
    username: String,
    password: SecretString,
    max_connections: u32,
    idle_timeout: Duration,
    connect_timeout: Duration,
}

impl StoreConfig {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: "vigil".to_string(),
            username: "vigil".to_string(),
            password: SecretString::from(String::new()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = password;
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    #[must_use]
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, StoreConfig};
    use secrecy::{ExposeSecret, SecretString};
    use std::time::Duration;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));
        assert_eq!(config.signing_secret().expose_secret(), "secret");
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );

        let config = config.with_session_ttl_seconds(3600);
        assert_eq!(config.session_ttl_seconds(), 3600);
    }

    #[test]
    fn store_config_defaults_and_overrides() {
        let config = StoreConfig::new("db.internal");
        assert_eq!(config.host(), "db.internal");
        assert_eq!(config.port(), super::DEFAULT_PORT);
        assert_eq!(config.database(), "vigil");
        assert_eq!(config.max_connections(), super::DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.idle_timeout(), super::DEFAULT_IDLE_TIMEOUT);
        assert_eq!(config.connect_timeout(), super::DEFAULT_CONNECT_TIMEOUT);

        let config = config
            .with_port(6432)
            .with_database("vigil_test")
            .with_username("app")
            .with_password(SecretString::from("hunter2".to_string()))
            .with_max_connections(5)
            .with_idle_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(10));

        assert_eq!(config.port(), 6432);
        assert_eq!(config.database(), "vigil_test");
        assert_eq!(config.username(), "app");
        assert_eq!(config.password().expose_secret(), "hunter2");
        assert_eq!(config.max_connections(), 5);
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn secrets_do_not_leak_in_debug_output() {
        let config = StoreConfig::new("db.internal")
            .with_password(SecretString::from("hunter2".to_string()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
