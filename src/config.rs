use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SiftError};

/// Environment variable consulted for the service token when the config
/// file does not carry one.
pub const TOKEN_ENV_VAR: &str = "MBOX_SIFT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Record-store the exclusion lists are fetched from. When absent the
    /// run proceeds unfiltered (offline mode).
    pub exclusion_service: Option<ExclusionServiceConfig>,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionServiceConfig {
    /// Base URL of the record-store query API.
    pub endpoint: String,
    /// Realm hostname header required by the record-store.
    pub realm_hostname: Option<String>,
    pub user_agent: Option<String>,
    /// Authorization token; `MBOX_SIFT_TOKEN` takes precedence when set.
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// What to do when the fetch fails: abort the run, or proceed with an
    /// empty exclusion set and a warning.
    #[serde(default)]
    pub on_fetch_error: FetchErrorPolicy,
    pub lists: ExclusionLists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    #[default]
    Abort,
    Proceed,
}

/// One record-store query per configured list; unconfigured lists are
/// simply not fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionLists {
    pub addresses: Option<ListQuery>,
    pub domains: Option<ListQuery>,
    pub keywords: Option<ListQuery>,
}

/// Table and column identifiers within the record-store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    pub table: String,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Drop the Subject column when false.
    #[serde(default = "default_true")]
    pub include_subject: bool,
    /// When set, keep only records whose parsed date falls in this year.
    pub year: Option<i32>,
    /// Sort surviving records chronologically before writing.
    #[serde(default = "default_true")]
    pub sort_by_date: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_subject: true,
            year: None,
            sort_by_date: true,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclusion_service: Some(ExclusionServiceConfig {
                endpoint: "https://records.example.com/v1".to_string(),
                realm_hostname: Some("example.quickbase.com".to_string()),
                user_agent: Some(format!("mbox-sift/{}", env!("CARGO_PKG_VERSION"))),
                token: None,
                timeout_seconds: default_timeout_seconds(),
                on_fetch_error: FetchErrorPolicy::Abort,
                lists: ExclusionLists {
                    addresses: Some(ListQuery {
                        table: "addresses-table-id".to_string(),
                        column: 6,
                    }),
                    domains: Some(ListQuery {
                        table: "domains-table-id".to_string(),
                        column: 6,
                    }),
                    keywords: None,
                },
            }),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| SiftError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| SiftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(service) = &self.exclusion_service {
            Url::parse(&service.endpoint).map_err(|e| {
                SiftError::Config(format!("invalid endpoint '{}': {e}", service.endpoint))
            })?;
        }
        Ok(())
    }
}

impl ExclusionServiceConfig {
    /// Token with environment override applied.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR).ok().or_else(|| self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reloaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(reloaded.validate().is_ok());
        assert_eq!(
            reloaded.exclusion_service.unwrap().on_fetch_error,
            FetchErrorPolicy::Abort
        );
    }

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = "exclusion_service:\n\
                    \x20 endpoint: https://api.example.com/v1\n\
                    \x20 lists:\n\
                    \x20   addresses: { table: abc, column: 6 }\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let service = config.exclusion_service.as_ref().unwrap();

        assert_eq!(service.timeout_seconds, 10);
        assert_eq!(service.on_fetch_error, FetchErrorPolicy::Abort);
        assert!(service.lists.domains.is_none());
        assert!(config.export.include_subject);
        assert!(config.export.sort_by_date);
        assert!(config.export.year.is_none());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let yaml = "exclusion_service:\n\
                    \x20 endpoint: 'not a url'\n\
                    \x20 lists: {}\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_proceed_policy_parses() {
        let yaml = "exclusion_service:\n\
                    \x20 endpoint: https://api.example.com/v1\n\
                    \x20 on_fetch_error: proceed\n\
                    \x20 lists: {}\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.exclusion_service.unwrap().on_fetch_error,
            FetchErrorPolicy::Proceed
        );
    }
}
