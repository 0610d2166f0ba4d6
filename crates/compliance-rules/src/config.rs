//! Process-wide compliance configuration.
//!
//! Loaded once at start-up and passed by reference to the rules that need it.
//!
//! ```yaml
//! required_tags:
//!   - key: Environment
//!     allowed_values: [Production, Development, Staging]
//!   - key: Owner
//! alerts:
//!   topic_arn: arn:aws:sns:us-east-1:123456789012:tag-compliance-alerts
//! ```

use crate::error::{ComplianceError, Result};
use crate::schema::RequiredTagSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            ConfigFormat::Json
        } else {
            ConfigFormat::Yaml
        }
    }
}

fn default_subject_prefix() -> String {
    "Tag Compliance Alert".to_string()
}

/// Where alerts for resources needing attention are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Notification topic for alerts. Alerts are still built without one.
    #[serde(default)]
    pub topic_arn: Option<String>,

    /// Alert subject; the resource type is appended.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            topic_arn: None,
            subject_prefix: default_subject_prefix(),
        }
    }
}

/// Complete configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Mandatory tags.
    #[serde(default = "RequiredTagSchema::standard")]
    pub required_tags: RequiredTagSchema,

    /// Alert delivery settings.
    #[serde(default)]
    pub alerts: AlertSettings,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            required_tags: RequiredTagSchema::standard(),
            alerts: AlertSettings::default(),
        }
    }
}

impl ComplianceConfig {
    /// Parses configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ComplianceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ComplianceConfig = serde_json::from_str(json)
            .map_err(|e| ComplianceError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration, auto-detecting the format.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_with_format(content, ConfigFormat::detect(content))
    }

    /// Parses configuration with the specified format.
    pub fn parse_with_format(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Yaml => Self::from_yaml(content),
            ConfigFormat::Json => Self::from_json(content),
        }
    }

    /// Reads configuration from a file.
    ///
    /// The format follows the file extension, falling back to content
    /// detection.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let format = ConfigFormat::from_extension(path)
            .unwrap_or_else(|| ConfigFormat::detect(&content));
        Self::parse_with_format(&content, format)
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ComplianceError::SerializationError(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.required_tags.validate()?;

        if let Some(topic) = &self.alerts.topic_arn {
            if !topic.starts_with("arn:") {
                return Err(ComplianceError::invalid_field(
                    "alerts.topic_arn",
                    format!("'{}' is not an ARN", topic),
                ));
            }
        }

        Ok(())
    }
}
