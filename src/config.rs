use serde::{Deserialize, Serialize};

/// A single rewrite rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Regular expression matched against the whole body.
    pub regex: String,
    /// Replacement template, `$1` and `${name}` refer to capture groups.
    #[serde(default)]
    pub replacement: String,
}

impl FilterConfig {
    /// Creates a rule from a pattern and a replacement template.
    pub fn new(regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            replacement: replacement.into(),
        }
    }
}

/// Middleware configuration.
///
/// Filters run in the order they are listed, each one receiving the output of
/// the previous. `Last-Modified` is removed from rewritten responses unless
/// `last_modified` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Ordered rewrite rules.
    pub filters: Vec<FilterConfig>,
    /// Keep the `Last-Modified` header of the downstream response.
    pub last_modified: bool,
}

impl Config {
    /// Creates an empty configuration with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    ///
    /// ```
    /// use http_body_rewrite::Config;
    ///
    /// let config = Config::from_json(
    ///     r#"{"filters": [{"regex": "foo", "replacement": "bar"}], "lastModified": true}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.filters.len(), 1);
    /// assert!(config.last_modified);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Appends a rewrite rule.
    pub fn filter(mut self, regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.filters.push(FilterConfig::new(regex, replacement));
        self
    }

    /// Sets whether `Last-Modified` is kept on rewritten responses.
    pub fn last_modified(mut self, retain: bool) -> Self {
        self.last_modified = retain;
        self
    }
}
