use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::broker::ssoready::DEFAULT_BASE_URL;

/// Environment variable naming a directory with an overriding Settings.toml
pub const SECRETS_DIR_ENV: &str = "SAMLGATE_SECRETS_DIR";

/// Fatal configuration problems, reported at startup
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: basic_toml::Error,
    },

    #[error("failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("broker API key is missing; set {env} or broker.api_key")]
    MissingApiKey { env: String },

    #[error("invalid broker base URL {url:?}: {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    #[error("organization.strategy = \"fixed\" requires organization.fixed_external_id")]
    MissingFixedOrganization,

    #[error("invalid session configuration: {0}")]
    Session(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SamlgateSettings {
    pub application: ApplicationSettings,
    pub broker: BrokerSettings,
    pub organization: OrganizationSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub base_url: String,
    /// Direct value (overridden by `api_key_env` when that variable is set)
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStrategy {
    /// Organization is the domain of the submitted email address
    #[default]
    EmailDomain,
    /// Every login goes to `fixed_external_id`
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrganizationSettings {
    pub strategy: OrganizationStrategy,
    pub fixed_external_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Identity stored in cleartext; demo only
    #[default]
    Plaintext,
    /// Identity and expiry signed with HMAC-SHA256
    Signed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub mode: SessionMode,
    /// Signing secret for signed mode. Generated at startup if empty.
    pub session_secret: String,
    /// Lifetime of signed sessions
    pub session_duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "SSOREADY_API_KEY".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: SessionMode::Plaintext,
            session_secret: String::new(), // Will be generated if empty
            session_duration_hours: 24,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            // The demo is served over plain http on localhost
            secure: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Filter directive handed to `env_logger`, e.g. `info` or `samlgate=debug`
    #[must_use]
    pub fn filter(&self) -> &str {
        match self.level.trim() {
            "" => "info",
            level => level,
        }
    }
}

impl SamlgateSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails (for example, a logger is already installed)
    /// - A settings file cannot be read or parsed
    /// - The resulting configuration is invalid (see [`Self::validate`])
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file(Path::new(".env"));

        // Load base settings from TOML or defaults
        let (mut settings, sources) = Self::load_base_settings()?;

        // The log level may come from the files just read
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::initialize_logger(&settings.logging)?;
        for source in &sources {
            log::info!("✓ Loaded settings from {source}");
        }

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        settings.validate()?;
        Ok(settings)
    }

    /// Initialize `env_logger` with the configured filter
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    fn initialize_logger(logging: &LoggingSettings) -> Result<(), SettingsError> {
        env_logger::Builder::new()
            .parse_filters(logging.filter())
            .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SAMLGATE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<(Self, Vec<String>), SettingsError> {
        let mut settings = Self::default();
        // Logging is not up yet, so report the files once it is
        let mut sources = Vec::new();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            sources.push(default_config_path.display().to_string());
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                sources.push(secrets_path.display().to_string());
            } else {
                eprintln!(
                    "ℹ {SECRETS_DIR_ENV} set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok((settings, sources))
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_broker_env_overrides(&mut settings.broker);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    /// Apply environment overrides for broker settings
    pub fn apply_broker_env_overrides(broker_settings: &mut BrokerSettings) {
        if let Ok(base_url) = std::env::var("BROKER_BASE_URL") {
            broker_settings.base_url = base_url;
        }
        if let Ok(api_key) = std::env::var(&broker_settings.api_key_env) {
            if !api_key.is_empty() {
                broker_settings.api_key = Some(api_key);
            }
        }
        Self::apply_numeric_env_override(
            "BROKER_TIMEOUT_SECONDS",
            &mut broker_settings.timeout_seconds,
        );
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(mode) = std::env::var("SESSION_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "plaintext" => session_settings.mode = SessionMode::Plaintext,
                "signed" => session_settings.mode = SessionMode::Signed,
                other => log::warn!("Ignoring unknown SESSION_MODE {other:?}"),
            }
        }
        Self::apply_numeric_env_override(
            "SESSION_DURATION_HOURS",
            &mut session_settings.session_duration_hours,
        );

        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if !secret.is_empty() {
                session_settings.session_secret = secret;
            }
        }

        // Generate random session secret if signing is on and none was configured
        if session_settings.mode == SessionMode::Signed && session_settings.session_secret.is_empty()
        {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Generate a cryptographically secure random session secret (256 bits)
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        log::warn!("⚠️  Using auto-generated session secret");
        log::warn!("🔒 For production use, set the SESSION_SECRET environment variable");
        log::warn!("   or configure session.session_secret in Settings.toml");
        log::warn!("💡 Sessions will not survive a restart unless the secret is configured");
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from a .env file, ignoring a missing file
    ///
    /// Variables already set in the process environment win.
    fn load_env_file(path: &Path) {
        if let Err(e) = dotenvy::from_path(path) {
            if !e.not_found() {
                eprintln!("⚠️  Ignoring unreadable {}: {e}", path.display());
            }
        }
    }

    /// Check everything the server needs before it starts taking requests
    ///
    /// # Errors
    ///
    /// Returns an error if the broker API key is missing, the broker base URL
    /// is not an absolute http(s) URL, a fixed organization is not configured
    /// for the fixed strategy, or signed sessions have no secret
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.broker_api_key().is_none() {
            return Err(SettingsError::MissingApiKey {
                env: self.broker.api_key_env.clone(),
            });
        }

        match url::Url::parse(&self.broker.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(SettingsError::InvalidBrokerUrl {
                    url: self.broker.base_url.clone(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                })
            }
            Err(e) => {
                return Err(SettingsError::InvalidBrokerUrl {
                    url: self.broker.base_url.clone(),
                    reason: e.to_string(),
                })
            }
        }

        if self.organization.strategy == OrganizationStrategy::Fixed
            && self
                .organization
                .fixed_external_id
                .as_deref()
                .is_none_or(|id| id.trim().is_empty())
        {
            return Err(SettingsError::MissingFixedOrganization);
        }

        if self.session.mode == SessionMode::Signed {
            if self.session.session_secret.is_empty() {
                return Err(SettingsError::Session(
                    "signed sessions need a session secret".into(),
                ));
            }
            if self.session.session_duration_hours == 0 {
                return Err(SettingsError::Session(
                    "session_duration_hours must be at least 1".into(),
                ));
            }
        }

        Ok(())
    }

    /// Broker API key, if configured and non-empty
    #[must_use]
    pub fn broker_api_key(&self) -> Option<&str> {
        self.broker
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "SESSION_SECRET",
            "SESSION_MODE",
            "SESSION_DURATION_HOURS",
            "BROKER_BASE_URL",
            "BROKER_TIMEOUT_SECONDS",
            "SSOREADY_API_KEY",
            "CUSTOM_BROKER_KEY",
            "RUST_LOG",
            "SAMLGATE_DOTENV_QUOTED",
            "SAMLGATE_DOTENV_EXPORTED",
            SECRETS_DIR_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    fn valid_settings() -> SamlgateSettings {
        let mut settings = SamlgateSettings::default();
        settings.broker.api_key = Some("ssoready_sk_test".to_string());
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = SamlgateSettings::default();
        assert_eq!(settings.get_bind_address(), "localhost:8080");
        assert_eq!(settings.broker.base_url, "https://api.ssoready.com");
        assert_eq!(settings.broker.api_key_env, "SSOREADY_API_KEY");
        assert_eq!(settings.broker.timeout_seconds, 10);
        assert_eq!(settings.organization.strategy, OrganizationStrategy::EmailDomain);
        assert_eq!(settings.session.mode, SessionMode::Plaintext);
        assert!(!settings.cookies.secure);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let settings = SamlgateSettings::default();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MissingApiKey { .. })
        ));

        let mut blank = SamlgateSettings::default();
        blank.broker.api_key = Some("   ".to_string());
        assert!(blank.validate().is_err());

        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_invalid_broker_url_is_fatal() {
        let mut settings = valid_settings();
        settings.broker.base_url = "ftp://broker.example".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidBrokerUrl { .. })
        ));

        settings.broker.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_fixed_strategy_needs_organization() {
        let mut settings = valid_settings();
        settings.organization.strategy = OrganizationStrategy::Fixed;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MissingFixedOrganization)
        ));

        settings.organization.fixed_external_id = Some("acme".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_api_key_env_override() {
        clean_env_vars();

        let mut broker = BrokerSettings {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        std::env::set_var("SSOREADY_API_KEY", "from-env");
        SamlgateSettings::apply_broker_env_overrides(&mut broker);
        assert_eq!(broker.api_key.as_deref(), Some("from-env"));

        // Custom variable name
        let mut broker = BrokerSettings {
            api_key_env: "CUSTOM_BROKER_KEY".to_string(),
            ..Default::default()
        };
        std::env::set_var("CUSTOM_BROKER_KEY", "custom");
        SamlgateSettings::apply_broker_env_overrides(&mut broker);
        assert_eq!(broker.api_key.as_deref(), Some("custom"));

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_broker_env_overrides() {
        clean_env_vars();

        let mut broker = BrokerSettings::default();
        std::env::set_var("BROKER_BASE_URL", "http://127.0.0.1:9000");
        std::env::set_var("BROKER_TIMEOUT_SECONDS", "3");
        SamlgateSettings::apply_broker_env_overrides(&mut broker);

        assert_eq!(broker.base_url, "http://127.0.0.1:9000");
        assert_eq!(broker.timeout_seconds, 3);
        assert_eq!(broker.api_key, None);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_signed_mode_generates_secret() {
        clean_env_vars();

        let mut session = SessionSettings {
            mode: SessionMode::Signed,
            ..Default::default()
        };
        SamlgateSettings::apply_session_env_overrides(&mut session);
        assert!(session.session_secret.len() > 40); // Base64 encoded 32 bytes should be ~44 chars

        let mut other = SessionSettings {
            mode: SessionMode::Signed,
            ..Default::default()
        };
        SamlgateSettings::apply_session_env_overrides(&mut other);
        assert_ne!(session.session_secret, other.session_secret);

        // Plaintext mode needs no secret
        let mut plaintext = SessionSettings::default();
        SamlgateSettings::apply_session_env_overrides(&mut plaintext);
        assert!(plaintext.session_secret.is_empty());

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_env_overrides() {
        clean_env_vars();

        let mut session = SessionSettings::default();
        std::env::set_var("SESSION_MODE", "Signed");
        std::env::set_var("SESSION_SECRET", "env-secret");
        std::env::set_var("SESSION_DURATION_HOURS", "48");
        SamlgateSettings::apply_session_env_overrides(&mut session);

        assert_eq!(session.mode, SessionMode::Signed);
        assert_eq!(session.session_secret, "env-secret");
        assert_eq!(session.session_duration_hours, 48);

        clean_env_vars();
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[application]
port = 9090

[broker]
api_key = "ssoready_sk_file"

[organization]
strategy = "fixed"
fixed_external_id = "acme"

[session]
mode = "signed"
session_secret = "file-secret"
"#
        )
        .unwrap();

        let settings = SamlgateSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.application.port, 9090);
        assert_eq!(settings.application.host, "localhost");
        assert_eq!(settings.broker_api_key(), Some("ssoready_sk_file"));
        assert_eq!(settings.broker.base_url, "https://api.ssoready.com");
        assert_eq!(settings.organization.strategy, OrganizationStrategy::Fixed);
        assert_eq!(settings.session.mode, SessionMode::Signed);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_file_errors() {
        let missing = SamlgateSettings::from_file(Path::new("/nonexistent/Settings.toml"));
        assert!(matches!(missing, Err(SettingsError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nmode = \"sometimes\"").unwrap();
        assert!(matches!(
            SamlgateSettings::from_file(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_load_env_file() {
        clean_env_vars();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "# comment\n\nSSOREADY_API_KEY=ssoready_sk_dotenv\n\
             SAMLGATE_DOTENV_QUOTED=\"two words # not a comment\"\n\
             export SAMLGATE_DOTENV_EXPORTED='exported'"
        )
        .unwrap();
        SamlgateSettings::load_env_file(file.path());
        assert_eq!(
            std::env::var("SSOREADY_API_KEY").as_deref(),
            Ok("ssoready_sk_dotenv")
        );
        assert_eq!(
            std::env::var("SAMLGATE_DOTENV_QUOTED").as_deref(),
            Ok("two words # not a comment")
        );
        assert_eq!(
            std::env::var("SAMLGATE_DOTENV_EXPORTED").as_deref(),
            Ok("exported")
        );

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_file_does_not_override_process_env() {
        clean_env_vars();

        std::env::set_var("SSOREADY_API_KEY", "from-process");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SSOREADY_API_KEY=from-dotenv").unwrap();
        SamlgateSettings::load_env_file(file.path());
        assert_eq!(
            std::env::var("SSOREADY_API_KEY").as_deref(),
            Ok("from-process")
        );

        // A missing file is not an error
        SamlgateSettings::load_env_file(Path::new("/nonexistent/.env"));

        clean_env_vars();
    }

    #[test]
    fn test_signed_sessions_need_positive_duration() {
        let mut settings = valid_settings();
        settings.session.mode = SessionMode::Signed;
        settings.session.session_secret = "secret".to_string();
        settings.session.session_duration_hours = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::Session(_))));

        settings.session.session_duration_hours = 1;
        assert!(settings.validate().is_ok());

        // Plaintext sessions have no expiry to get wrong
        settings.session.mode = SessionMode::Plaintext;
        settings.session.session_duration_hours = 0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_logging_filter() {
        let mut logging = LoggingSettings::default();
        assert_eq!(logging.filter(), "info");

        logging.level = " samlgate=debug,actix_web=warn ".to_string();
        assert_eq!(logging.filter(), "samlgate=debug,actix_web=warn");

        logging.level = "   ".to_string();
        assert_eq!(logging.filter(), "info");
    }

    #[test]
    #[serial]
    fn test_logging_level_from_file_and_env() {
        clean_env_vars();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();
        let mut settings = SamlgateSettings::from_file(file.path()).unwrap();
        SamlgateSettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.logging.filter(), "debug");

        std::env::set_var("RUST_LOG", "warn");
        SamlgateSettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.logging.filter(), "warn");

        clean_env_vars();
    }
}
