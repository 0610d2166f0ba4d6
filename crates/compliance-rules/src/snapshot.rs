//! Point-in-time resource snapshots.

use crate::error::{ComplianceError, Result};
use crate::types::{ResourceType, Tags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable view of one resource at the time it was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// The provider resource type.
    pub resource_type: ResourceType,

    /// The provider resource identifier.
    pub resource_id: String,

    /// When the provider captured this configuration.
    pub captured_at: DateTime<Utc>,

    /// Provider-specific configuration payload.
    #[serde(default)]
    pub configuration: serde_json::Value,

    /// Tags attached to the resource.
    #[serde(default)]
    pub tags: Tags,
}

impl ResourceSnapshot {
    /// Creates a snapshot with an empty configuration and no tags.
    pub fn new(
        resource_type: impl Into<ResourceType>,
        resource_id: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            captured_at,
            configuration: serde_json::Value::Object(serde_json::Map::new()),
            tags: Tags::new(),
        }
    }

    /// Sets the configuration payload.
    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.configuration = configuration;
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Replaces all tags.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Returns true if the snapshot describes a resource of the given type.
    pub fn is_type(&self, resource_type: &ResourceType) -> bool {
        &self.resource_type == resource_type
    }

    /// Validates that identifying fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.resource_type.as_str().is_empty() {
            return Err(ComplianceError::MissingField("resourceType".to_string()));
        }
        if self.resource_id.is_empty() {
            return Err(ComplianceError::MissingField("resourceId".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_snapshot() -> ResourceSnapshot {
        ResourceSnapshot::new(
            "AWS::EC2::Instance",
            "i-0abc123",
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
        .with_configuration(json!({"BlockDeviceMappings": []}))
        .with_tag("Environment", "Production")
    }

    #[test]
    fn test_builder() {
        let snapshot = create_test_snapshot();

        assert!(snapshot.is_type(&ResourceType::Ec2Instance));
        assert_eq!(snapshot.tags.get("Environment").map(String::as_str), Some("Production"));
    }

    #[test]
    fn test_validate() {
        let snapshot = create_test_snapshot();
        assert!(snapshot.validate().is_ok());

        let mut anonymous = create_test_snapshot();
        anonymous.resource_id.clear();
        assert!(matches!(
            anonymous.validate(),
            Err(ComplianceError::MissingField(field)) if field == "resourceId"
        ));
    }

    #[test]
    fn test_serde_defaults() {
        let snapshot: ResourceSnapshot = serde_json::from_value(json!({
            "resource_type": "AWS::S3::Bucket",
            "resource_id": "logs",
            "captured_at": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(snapshot.resource_type, ResourceType::S3Bucket);
        assert!(snapshot.tags.is_empty());
        assert!(snapshot.configuration.is_null());
    }
}
