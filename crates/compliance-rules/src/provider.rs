//! Tag lookup seam.

use crate::error::{ComplianceError, Result};
use crate::types::Tags;
use std::collections::HashMap;
use std::fmt::Debug;

/// Supplies the tags of a resource identified by its ARN.
///
/// Implementations wrap the provider's tagging API. `Ok(None)` means the
/// provider returned no tag mapping for the resource.
pub trait TagSource: Send + Sync + Debug {
    fn lookup_tags(&self, resource_arn: &str) -> Result<Option<Tags>>;
}

/// In-memory tag source with canned answers per ARN.
#[derive(Debug, Clone, Default)]
pub struct StaticTagSource {
    tags: HashMap<String, Tags>,
    failures: HashMap<String, String>,
}

impl StaticTagSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the tags of a resource.
    pub fn with_resource(mut self, resource_arn: impl Into<String>, tags: Tags) -> Self {
        self.tags.insert(resource_arn.into(), tags);
        self
    }

    /// Makes lookups for a resource fail with the given message.
    pub fn with_failure(
        mut self,
        resource_arn: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.insert(resource_arn.into(), message.into());
        self
    }
}

impl TagSource for StaticTagSource {
    fn lookup_tags(&self, resource_arn: &str) -> Result<Option<Tags>> {
        if let Some(message) = self.failures.get(resource_arn) {
            return Err(ComplianceError::lookup(resource_arn, message.clone()));
        }
        Ok(self.tags.get(resource_arn).cloned())
    }
}
