use rules::locale::{DEFAULT_LOCALE, DEFAULT_LOCALES, collation_key};
use rules::{BulkListBuilder, Locales, UrlExpander};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Auth token cannot be empty")]
    EmptyAuthToken,

    #[error("Locale list cannot be empty")]
    NoLocales,

    #[error("Empty locale tag")]
    EmptyLocale,

    #[error("Duplicate locale tag: {0}")]
    DuplicateLocale(String),

    #[error("Default destination domain must be an http(s) URL: {0}")]
    InvalidDestDomain(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// Sheet sync service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the API endpoints
    #[serde(default)]
    pub listener: Listener,
    /// Listener for health and readiness probes
    #[serde(default = "Listener::admin")]
    pub admin_listener: Listener,
    /// Bearer token every request except `GET /` must present
    pub auth_token: String,
    pub redirects: RedirectsConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub rules_list: RulesListConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.auth_token.trim().is_empty() {
            return Err(ValidationError::EmptyAuthToken);
        }

        self.redirects.validate()?;

        if self.spreadsheet.id.is_empty() {
            return Err(ValidationError::MissingSetting("spreadsheet.id"));
        }
        if self.rules_list.account_id.is_empty() {
            return Err(ValidationError::MissingSetting("rules_list.account_id"));
        }
        if self.rules_list.list_id.is_empty() {
            return Err(ValidationError::MissingSetting("rules_list.list_id"));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }

    fn admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// How spreadsheet paths become published URLs
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RedirectsConfig {
    /// Prepended to every path that does not carry its own scheme
    pub default_dest_domain: Url,
    /// Locale that is served without a path prefix
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Locales a localized redirect fans out to, in publish order
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

impl RedirectsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.default_dest_domain.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidDestDomain(
                self.default_dest_domain.to_string(),
            ));
        }

        if self.locales.is_empty() {
            return Err(ValidationError::NoLocales);
        }

        let mut seen = HashSet::new();
        for locale in &self.locales {
            if locale.trim().is_empty() {
                return Err(ValidationError::EmptyLocale);
            }
            if !seen.insert(collation_key(locale)) {
                return Err(ValidationError::DuplicateLocale(locale.clone()));
            }
        }

        Ok(())
    }

    pub fn bulk_list_builder(&self) -> BulkListBuilder {
        let locales = Locales::new(self.locales.clone(), self.default_locale.clone());
        BulkListBuilder::new(UrlExpander::new(self.default_dest_domain.as_str(), locales))
    }
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_locales() -> Vec<String> {
    DEFAULT_LOCALES.iter().map(|l| l.to_string()).collect()
}

/// Google Sheets values API access
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpreadsheetConfig {
    #[serde(default = "default_sheets_endpoint")]
    pub endpoint: Url,
    /// Spreadsheet document id
    pub id: String,
    pub api_key: String,
    /// A1 range holding the header row and the redirects
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_sheets_endpoint() -> Url {
    Url::parse("https://sheets.googleapis.com/v4/spreadsheets").expect("static URL is valid")
}

fn default_range() -> String {
    "Redirects!A:F".to_string()
}

/// Cloudflare Rules Lists API access
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RulesListConfig {
    #[serde(default = "default_rules_endpoint")]
    pub endpoint: Url,
    /// Account tag owning the list
    pub account_id: String,
    pub list_id: String,
    pub api_token: String,
}

fn default_rules_endpoint() -> Url {
    Url::parse("https://api.cloudflare.com/client/v4").expect("static URL is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
auth_token: zot
redirects:
    default_dest_domain: "https://any.org"
spreadsheet:
    id: keymaster
    api_key: gozarian
rules_list:
    account_id: keymaster
    list_id: gozar
    api_token: gatekeeper
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.admin_listener.port, 3001);
        assert_eq!(config.redirects.default_locale, "en-US");
        assert_eq!(config.redirects.locales.len(), 22);
        assert_eq!(config.spreadsheet.range, "Redirects!A:F");
        assert_eq!(
            config.spreadsheet.endpoint.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets"
        );
        assert_eq!(
            config.rules_list.endpoint.as_str(),
            "https://api.cloudflare.com/client/v4"
        );
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "0.0.0.0"
    port: 8081
auth_token: zot
redirects:
    default_dest_domain: "https://www.example.com/"
    default_locale: en-gb
    locales: [en-gb, fr-fr]
spreadsheet:
    endpoint: "https://example.org"
    id: keymaster
    api_key: gozarian
    range: "Sheet1!A:F"
rules_list:
    endpoint: "https://example.org"
    account_id: keymaster
    list_id: gozar
    api_token: gatekeeper
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.redirects.locales, vec!["en-gb", "fr-fr"]);

        let builder = config.redirects.bulk_list_builder();
        assert_eq!(builder.expander().default_domain(), "https://www.example.com");
        assert_eq!(builder.expander().locales().prefixed().count(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let base: Config = serde_yaml::from_str(MINIMAL).unwrap();

        let mut config = base.clone();
        config.listener.port = 0;
        assert_eq!(config.validate().unwrap_err(), ValidationError::InvalidPort);

        let mut config = base.clone();
        config.auth_token = "  ".into();
        assert_eq!(config.validate().unwrap_err(), ValidationError::EmptyAuthToken);

        let mut config = base.clone();
        config.redirects.locales = vec![];
        assert_eq!(config.validate().unwrap_err(), ValidationError::NoLocales);

        let mut config = base.clone();
        config.redirects.locales = vec!["en-gb".into(), "".into()];
        assert_eq!(config.validate().unwrap_err(), ValidationError::EmptyLocale);

        let mut config = base.clone();
        config.redirects.locales = vec!["en-gb".into(), "EN-GB".into()];
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateLocale(_)
        ));

        let mut config = base.clone();
        config.redirects.locales = vec!["fr-fr".into(), "fŕ-fr".into()];
        assert_eq!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateLocale("fŕ-fr".into())
        );

        let mut config = base.clone();
        config.redirects.default_dest_domain = Url::parse("ftp://files.example.com").unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidDestDomain(_)
        ));

        let mut config = base;
        config.rules_list.list_id = String::new();
        assert_eq!(
            config.validate().unwrap_err(),
            ValidationError::MissingSetting("rules_list.list_id")
        );
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(
            serde_yaml::from_str::<RedirectsConfig>(r#"default_dest_domain: "not a url""#).is_err()
        );

        // Invalid port type
        assert!(serde_yaml::from_str::<Listener>(r#"{host: "0.0.0.0", port: "http"}"#).is_err());

        // Missing required field
        assert!(
            serde_yaml::from_str::<RulesListConfig>(r#"{account_id: a, list_id: b}"#).is_err()
        );
    }
}
