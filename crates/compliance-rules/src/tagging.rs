//! Required-tag policy rule.

use crate::outcome::{ComplianceOutcome, InvalidTag, TagViolations};
use crate::provider::TagSource;
use crate::schema::RequiredTagSchema;
use crate::types::Tags;
use tracing::{debug, warn};

/// Evaluates a resource's tags against the required-tag schema.
pub fn evaluate_tags(tags: &Tags, schema: &RequiredTagSchema) -> ComplianceOutcome {
    if tags.is_empty() {
        return ComplianceOutcome::non_compliant("No tags found on resource");
    }

    let mut violations = TagViolations::default();

    for required in schema.tags() {
        match tags.get(&required.key) {
            None => violations.missing_tags.push(required.key.clone()),
            Some(value) if !required.accepts(value) => {
                violations.invalid_tags.push(InvalidTag {
                    key: required.key.clone(),
                    value: value.clone(),
                    allowed_values: required.allowed_values.clone().unwrap_or_default(),
                });
            }
            Some(value) => {
                // Empty values are accepted when no allow-list is defined.
                if value.is_empty() {
                    debug!(key = %required.key, "accepting empty value for required tag");
                }
            }
        }
    }

    if violations.is_empty() {
        ComplianceOutcome::compliant("All required tags are present and valid")
    } else {
        ComplianceOutcome::tag_violations(violations)
    }
}

/// Looks up a resource's tags and evaluates them.
///
/// Lookup failures become an evaluation error; a resource the provider has no
/// tag mapping for is treated as untagged.
pub fn evaluate_resource_tags(
    source: &dyn TagSource,
    resource_arn: &str,
    schema: &RequiredTagSchema,
) -> ComplianceOutcome {
    match source.lookup_tags(resource_arn) {
        Ok(Some(tags)) => evaluate_tags(&tags, schema),
        Ok(None) => evaluate_tags(&Tags::new(), schema),
        Err(err) => {
            warn!(resource_arn, error = %err, "Error checking tags");
            ComplianceOutcome::evaluation_error(format!("Error checking tags: {}", err))
        }
    }
}
