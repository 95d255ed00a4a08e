use std::time::Duration;

use crate::imds::DEFAULT_METADATA_ENDPOINT;

pub const DEFAULT_ROLE: &str = "adf-config";
pub const DEFAULT_TABLE: &str = "adf-config";

const METADATA_ENDPOINT_ENV: &str = "ADF_CONFIG_METADATA_ENDPOINT";
const ROLE_ENV: &str = "ADF_CONFIG_ROLE";
const TABLE_ENV: &str = "ADF_CONFIG_TABLE";
const DYNAMODB_ENDPOINT_ENV: &str = "ADF_CONFIG_DYNAMODB_ENDPOINT";
const HTTP_TIMEOUT_ENV: &str = "ADF_CONFIG_HTTP_TIMEOUT_MS";

/// Where to look for credentials and config entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    metadata_endpoint: String,
    role: String,
    table: String,
    dynamodb_endpoint: Option<String>,
    http_timeout: Option<Duration>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            role: DEFAULT_ROLE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            dynamodb_endpoint: None,
            http_timeout: None,
        }
    }

    /// Load settings from environment variables, falling back to defaults.
    ///
    /// * `ADF_CONFIG_METADATA_ENDPOINT` overrides the metadata service address.
    /// * `ADF_CONFIG_ROLE` names the instance role whose credentials are used.
    /// * `ADF_CONFIG_TABLE` names the table to scan.
    /// * `ADF_CONFIG_DYNAMODB_ENDPOINT` replaces the regional store endpoint.
    /// * `ADF_CONFIG_HTTP_TIMEOUT_MS` bounds each request; unset means no timeout.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut settings = Settings::new();

        if let Some(endpoint) = value(METADATA_ENDPOINT_ENV) {
            settings.metadata_endpoint = endpoint;
        }
        if let Some(role) = value(ROLE_ENV) {
            settings.role = role;
        }
        if let Some(table) = value(TABLE_ENV) {
            settings.table = table;
        }
        settings.dynamodb_endpoint = value(DYNAMODB_ENDPOINT_ENV);
        settings.http_timeout = value(HTTP_TIMEOUT_ENV)
            .and_then(|ms| ms.trim().parse::<u64>().ok())
            .map(Duration::from_millis);

        settings
    }

    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint = endpoint.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_dynamodb_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.dynamodb_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn metadata_endpoint(&self) -> &str {
        &self.metadata_endpoint
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn dynamodb_endpoint(&self) -> Option<&str> {
        self.dynamodb_endpoint.as_deref()
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_instance_metadata() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.metadata_endpoint(), "http://169.254.169.254");
        assert_eq!(settings.role(), "adf-config");
        assert_eq!(settings.table(), "adf-config");
        assert!(settings.dynamodb_endpoint().is_none());
        assert!(settings.http_timeout().is_none());
    }

    #[test]
    fn environment_overrides_apply() {
        let settings = Settings::from_lookup(lookup(&[
            (METADATA_ENDPOINT_ENV, "http://127.0.0.1:9000"),
            (ROLE_ENV, "reader"),
            (TABLE_ENV, "app-settings"),
            (DYNAMODB_ENDPOINT_ENV, "http://localhost:8000/"),
            (HTTP_TIMEOUT_ENV, "1500"),
        ]));
        assert_eq!(settings.metadata_endpoint(), "http://127.0.0.1:9000");
        assert_eq!(settings.role(), "reader");
        assert_eq!(settings.table(), "app-settings");
        assert_eq!(settings.dynamodb_endpoint(), Some("http://localhost:8000/"));
        assert_eq!(settings.http_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn builder_setters_override_defaults() {
        let settings = Settings::new()
            .with_metadata_endpoint("http://127.0.0.1:9000")
            .with_role("reader")
            .with_table("app-settings")
            .with_dynamodb_endpoint("http://localhost:8000/")
            .with_http_timeout(Duration::from_secs(2));
        assert_eq!(settings.role(), "reader");
        assert_eq!(settings.http_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(
            settings,
            Settings::from_lookup(lookup(&[
                (METADATA_ENDPOINT_ENV, "http://127.0.0.1:9000"),
                (ROLE_ENV, "reader"),
                (TABLE_ENV, "app-settings"),
                (DYNAMODB_ENDPOINT_ENV, "http://localhost:8000/"),
                (HTTP_TIMEOUT_ENV, "2000"),
            ]))
        );
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let settings = Settings::from_lookup(lookup(&[
            (ROLE_ENV, "  "),
            (DYNAMODB_ENDPOINT_ENV, ""),
            (HTTP_TIMEOUT_ENV, "soon"),
        ]));
        assert_eq!(settings, Settings::default());
    }
}
