//! Required-tag schema definition.

use crate::error::{ComplianceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One mandatory tag key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredTag {
    /// The tag key that must be present.
    pub key: String,

    /// Acceptable values. `None` accepts any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl RequiredTag {
    /// A required tag that accepts any value.
    pub fn any(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            allowed_values: None,
        }
    }

    /// A required tag restricted to the given values.
    pub fn one_of<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            allowed_values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Returns true if `value` is acceptable for this tag.
    ///
    /// An empty allow-list places no restriction.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.allowed_values {
            Some(allowed) if !allowed.is_empty() => allowed.iter().any(|v| v == value),
            _ => true,
        }
    }
}

/// Ordered set of mandatory tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredTagSchema {
    tags: Vec<RequiredTag>,
}

impl RequiredTagSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment, Project, Owner and CostCenter, with Environment limited
    /// to Production, Development or Staging.
    pub fn standard() -> Self {
        Self::new()
            .with_tag(RequiredTag::one_of(
                "Environment",
                ["Production", "Development", "Staging"],
            ))
            .with_tag(RequiredTag::any("Project"))
            .with_tag(RequiredTag::any("Owner"))
            .with_tag(RequiredTag::any("CostCenter"))
    }

    /// Adds a required tag.
    pub fn with_tag(mut self, tag: RequiredTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Required tags in schema order.
    pub fn tags(&self) -> &[RequiredTag] {
        &self.tags
    }

    /// Looks up the requirement for a key.
    pub fn get(&self, key: &str) -> Option<&RequiredTag> {
        self.tags.iter().find(|tag| tag.key == key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Parses a schema from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let schema: RequiredTagSchema = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parses a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: RequiredTagSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Validates the schema.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for tag in &self.tags {
            if tag.key.trim().is_empty() {
                return Err(ComplianceError::ValidationError(
                    "Required tag key must not be empty".to_string(),
                ));
            }

            if !seen.insert(tag.key.as_str()) {
                return Err(ComplianceError::ValidationError(format!(
                    "Required tag '{}' is listed more than once",
                    tag.key
                )));
            }

            if matches!(&tag.allowed_values, Some(values) if values.is_empty()) {
                return Err(ComplianceError::ValidationError(format!(
                    "Allowed values for tag '{}' must not be empty; omit the list to accept any value",
                    tag.key
                )));
            }
        }

        Ok(())
    }
}
