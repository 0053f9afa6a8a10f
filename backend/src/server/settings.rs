//! Runtime settings loaded via OrthoConfig.
//!
//! Each concern has its own struct and environment prefix so operators can
//! read the deployment surface at a glance:
//!
//! ```text
//! PUNCHCARD_SERVER_*     bind address, session cookie and key
//! PUNCHCARD_DATABASE_*   PostgreSQL connection
//! PUNCHCARD_SHOPIFY_*    commerce API credentials
//! PUNCHCARD_EMAIL_*      SES sender identity
//! PUNCHCARD_WEBHOOK_*    shared secret for engagement webhooks
//! PUNCHCARD_BOOTSTRAP_*  first manager account
//! ```

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_SESSION_TTL_HOURS: i64 = 8;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-01";
const DEFAULT_SHOPIFY_PAGE_SIZE: usize = 250;
const DEFAULT_SHOPIFY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BUSINESS_NAME: &str = "Our Business";
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_NAME: &str = "Admin";

/// Raised when settings cannot be loaded or fail validation.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load {section} settings: {message}")]
    Load {
        section: &'static str,
        message: String,
    },
    #[error("invalid value for {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("missing required setting {name}")]
    Missing { name: &'static str },
}

/// Settings only come from the environment and configuration files, never
/// from command-line flags, so each struct parses the program name alone.
fn program_name() -> [OsString; 1] {
    [std::env::args_os()
        .next()
        .unwrap_or_else(|| OsString::from("punchcard"))]
}

macro_rules! load_section {
    ($ty:ty, $section:literal) => {
        <$ty>::load_from_iter(program_name()).map_err(|err| SettingsError::Load {
            section: $section,
            message: err.to_string(),
        })
    };
}

/// HTTP listener and session cookie settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_SERVER")]
pub struct ServerSettings {
    pub bind_addr: Option<String>,
    /// File holding at least 64 bytes of key material for cookie signing.
    pub session_key_file: Option<PathBuf>,
    /// Allow a generated key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    pub session_ttl_hours: Option<i64>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "PUNCHCARD_SERVER_BIND_ADDR",
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.session_ttl_hours
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_DATABASE")]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

impl DatabaseSettings {
    pub fn url(&self) -> Result<&str, SettingsError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::Missing {
                name: "PUNCHCARD_DATABASE_URL",
            })
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }
}

/// Shopify Admin API credentials.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_SHOPIFY")]
pub struct ShopifySettings {
    pub store_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: Option<String>,
    pub page_size: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Store address and token, present only when both are configured.
pub struct ShopifyCredentials {
    pub store_url: String,
    pub access_token: Zeroizing<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned)
}

impl ShopifySettings {
    pub fn credentials(&self) -> Option<ShopifyCredentials> {
        let store_url = non_blank(self.store_url.as_ref())?;
        let access_token = non_blank(self.access_token.as_ref())?;
        Some(ShopifyCredentials {
            store_url,
            access_token: Zeroizing::new(access_token),
        })
    }

    pub fn api_version(&self) -> String {
        non_blank(self.api_version.as_ref()).unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.to_owned())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_SHOPIFY_PAGE_SIZE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_SHOPIFY_TIMEOUT_SECS))
    }
}

/// SES sender identity and the signature used in thank-you emails.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_EMAIL")]
pub struct EmailSettings {
    pub from_address: Option<String>,
    /// Overrides the AWS region resolved from the default provider chain.
    pub region: Option<String>,
    pub business_name: Option<String>,
    /// Upper bound on one SES send, covering connect and response.
    pub timeout_secs: Option<u64>,
}

impl EmailSettings {
    pub fn from_address(&self) -> Option<String> {
        non_blank(self.from_address.as_ref())
    }

    pub fn region(&self) -> Option<String> {
        non_blank(self.region.as_ref())
    }

    pub fn business_name(&self) -> String {
        non_blank(self.business_name.as_ref()).unwrap_or_else(|| DEFAULT_BUSINESS_NAME.to_owned())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_EMAIL_TIMEOUT_SECS),
        )
    }
}

/// Shared secret expected on engagement webhooks.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_WEBHOOK")]
pub struct WebhookSettings {
    pub secret: Option<String>,
}

impl WebhookSettings {
    pub fn secret(&self) -> Option<Zeroizing<String>> {
        non_blank(self.secret.as_ref()).map(Zeroizing::new)
    }
}

/// Manager account created when the staff table is empty.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PUNCHCARD_BOOTSTRAP")]
pub struct BootstrapSettings {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
}

impl BootstrapSettings {
    pub fn admin_email(&self) -> String {
        non_blank(self.admin_email.as_ref()).unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_owned())
    }

    pub fn admin_password(&self) -> Zeroizing<String> {
        Zeroizing::new(
            self.admin_password
                .clone()
                .filter(|password| !password.is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_owned()),
        )
    }

    pub fn admin_name(&self) -> String {
        non_blank(self.admin_name.as_ref()).unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_owned())
    }
}

/// Every settings section, loaded together at startup.
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub shopify: ShopifySettings,
    pub email: EmailSettings,
    pub webhook: WebhookSettings,
    pub bootstrap: BootstrapSettings,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        Ok(Self {
            server: load_section!(ServerSettings, "server")?,
            database: load_section!(DatabaseSettings, "database")?,
            shopify: load_section!(ShopifySettings, "shopify")?,
            email: load_section!(EmailSettings, "email")?,
            webhook: load_section!(WebhookSettings, "webhook")?,
            bootstrap: load_section!(BootstrapSettings, "bootstrap")?,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for environment-driven settings.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 15] = [
        "PUNCHCARD_SERVER_BIND_ADDR",
        "PUNCHCARD_SERVER_SESSION_KEY_FILE",
        "PUNCHCARD_SERVER_SESSION_ALLOW_EPHEMERAL",
        "PUNCHCARD_SERVER_COOKIE_SECURE",
        "PUNCHCARD_SERVER_SESSION_TTL_HOURS",
        "PUNCHCARD_DATABASE_URL",
        "PUNCHCARD_SHOPIFY_STORE_URL",
        "PUNCHCARD_SHOPIFY_ACCESS_TOKEN",
        "PUNCHCARD_SHOPIFY_PAGE_SIZE",
        "PUNCHCARD_EMAIL_FROM_ADDRESS",
        "PUNCHCARD_EMAIL_BUSINESS_NAME",
        "PUNCHCARD_EMAIL_TIMEOUT_SECS",
        "PUNCHCARD_WEBHOOK_SECRET",
        "PUNCHCARD_BOOTSTRAP_ADMIN_EMAIL",
        "PUNCHCARD_BOOTSTRAP_ADMIN_PASSWORD",
    ];

    fn cleared_except(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_environment_is_empty() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = Settings::load().expect("settings should load");
        assert_eq!(
            settings.server.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert!(settings.server.cookie_secure);
        assert!(!settings.server.session_allow_ephemeral);
        assert_eq!(settings.server.session_ttl_hours(), 8);
        assert!(matches!(
            settings.database.url(),
            Err(SettingsError::Missing { .. })
        ));
        assert!(settings.shopify.credentials().is_none());
        assert_eq!(settings.shopify.page_size(), 250);
        assert_eq!(settings.shopify.api_version(), "2024-01");
        assert!(settings.email.from_address().is_none());
        assert_eq!(settings.email.business_name(), "Our Business");
        assert_eq!(settings.email.timeout(), Duration::from_secs(10));
        assert!(settings.webhook.secret().is_none());
        assert_eq!(settings.bootstrap.admin_email(), "admin@example.com");
        assert_eq!(settings.bootstrap.admin_password().as_str(), "admin123");
        assert_eq!(settings.bootstrap.admin_name(), "Admin");
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("PUNCHCARD_SERVER_BIND_ADDR", "127.0.0.1:9000"),
            ("PUNCHCARD_SERVER_COOKIE_SECURE", "false"),
            ("PUNCHCARD_DATABASE_URL", "postgres://cafe@db/punchcard"),
            ("PUNCHCARD_SHOPIFY_STORE_URL", "corner-cafe.myshopify.com"),
            ("PUNCHCARD_SHOPIFY_ACCESS_TOKEN", "shpat_abc"),
            ("PUNCHCARD_SHOPIFY_PAGE_SIZE", "50"),
            ("PUNCHCARD_EMAIL_FROM_ADDRESS", "hello@cafe.test"),
            ("PUNCHCARD_EMAIL_BUSINESS_NAME", "Corner Cafe"),
            ("PUNCHCARD_EMAIL_TIMEOUT_SECS", "3"),
            ("PUNCHCARD_WEBHOOK_SECRET", "s3cret"),
        ]));

        let settings = Settings::load().expect("settings should load");
        assert_eq!(
            settings.server.bind_addr().expect("address"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("literal")
        );
        assert!(!settings.server.cookie_secure);
        assert_eq!(
            settings.database.url().expect("url"),
            "postgres://cafe@db/punchcard"
        );
        let credentials = settings.shopify.credentials().expect("configured");
        assert_eq!(credentials.store_url, "corner-cafe.myshopify.com");
        assert_eq!(credentials.access_token.as_str(), "shpat_abc");
        assert_eq!(settings.shopify.page_size(), 50);
        assert_eq!(settings.email.from_address().as_deref(), Some("hello@cafe.test"));
        assert_eq!(settings.email.business_name(), "Corner Cafe");
        assert_eq!(settings.email.timeout(), Duration::from_secs(3));
        assert_eq!(
            settings.webhook.secret().map(|secret| secret.as_str().to_owned()),
            Some("s3cret".to_owned())
        );
    }

    #[rstest]
    fn shopify_needs_both_store_and_token() {
        let _guard = lock_env(cleared_except(&[(
            "PUNCHCARD_SHOPIFY_STORE_URL",
            "corner-cafe.myshopify.com",
        )]));

        let settings = Settings::load().expect("settings should load");
        assert!(settings.shopify.credentials().is_none());
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let _guard = lock_env(cleared_except(&[("PUNCHCARD_SERVER_BIND_ADDR", "not-an-addr")]));

        let settings = Settings::load().expect("settings should load");
        assert!(matches!(
            settings.server.bind_addr(),
            Err(SettingsError::Invalid { name: "PUNCHCARD_SERVER_BIND_ADDR", .. })
        ));
    }
}
