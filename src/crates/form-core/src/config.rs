//! Runtime configuration for schemas and reducers
//!
//! ```yaml
//! schema_version: "2.1.0"
//! programmatic: true
//! ids:
//!   length: 8
//!   prefix: "f_"
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::error::{FormError, Result};
use crate::id::DEFAULT_ID_LENGTH;
use serde::{Deserialize, Serialize};

/// Configuration applied through `FormSchema::with_config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Overrides the schema version stamped on fresh descriptors
    pub schema_version: Option<String>,
    /// Field id generation
    pub ids: IdConfig,
    /// Build the registry for programmatic (builder) use
    pub programmatic: bool,
}

/// Field id generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// Random token length
    pub length: usize,
    /// Prefix prepended to every id
    pub prefix: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_ID_LENGTH,
            prefix: String::new(),
        }
    }
}

impl FormConfig {
    /// Parse YAML configuration text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Parse JSON configuration text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| FormError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormConfig::default();
        assert_eq!(config.ids.length, 6);
        assert_eq!(config.ids.prefix, "");
        assert!(!config.programmatic);
        assert!(config.schema_version.is_none());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = FormConfig::from_yaml_str(
            r#"
programmatic: true
ids:
  prefix: "f_"
"#,
        )
        .unwrap();

        assert!(config.programmatic);
        assert_eq!(config.ids.prefix, "f_");
        assert_eq!(config.ids.length, 6);
    }

    #[test]
    fn test_from_json() {
        let config = FormConfig::from_json_str(r#"{"schema_version": "9.9.9"}"#).unwrap();
        assert_eq!(config.schema_version.as_deref(), Some("9.9.9"));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = FormConfig::from_yaml_str("ids: [1, 2").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }
}
