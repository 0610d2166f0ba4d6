//! Provider event parsing.
//!
//! Everything that arrives from the provider is checked here, so the rules
//! only ever see a well-formed `ResourceSnapshot`.

use crate::error::{ComplianceError, Result};
use crate::snapshot::ResourceSnapshot;
use crate::types::Tags;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// A decoded config-rule invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRuleEvent {
    /// The configuration item, as a snapshot.
    pub snapshot: ResourceSnapshot,

    /// Token the provider expects back with the evaluations.
    pub result_token: String,

    /// Rule parameters; empty when none were supplied.
    pub rule_parameters: Map<String, Value>,
}

/// Decodes a config-rule invocation event.
///
/// `invokingEvent` and `ruleParameters` may be JSON-encoded strings, as the
/// provider sends them, or inline objects.
pub fn parse_config_rule_event(json: &str) -> Result<ConfigRuleEvent> {
    let event: Value = serde_json::from_str(json)?;

    let invoking = event
        .get("invokingEvent")
        .ok_or_else(|| ComplianceError::MissingField("invokingEvent".to_string()))?;
    let invoking = decode_embedded("invokingEvent", invoking)?;

    let item = invoking.get("configurationItem").ok_or_else(|| {
        ComplianceError::MissingField("invokingEvent.configurationItem".to_string())
    })?;
    let snapshot = parse_configuration_item(item)?;

    let rule_parameters = match event.get("ruleParameters") {
        None | Some(Value::Null) => Map::new(),
        Some(raw) => match decode_embedded("ruleParameters", raw)? {
            Value::Object(parameters) => parameters,
            _ => {
                return Err(ComplianceError::invalid_field(
                    "ruleParameters",
                    "expected an object",
                ))
            }
        },
    };

    let result_token = required_str(&event, "resultToken", "resultToken")?.to_string();

    Ok(ConfigRuleEvent {
        snapshot,
        result_token,
        rule_parameters,
    })
}

/// Builds a snapshot from a provider configuration item.
pub fn parse_configuration_item(item: &Value) -> Result<ResourceSnapshot> {
    if !item.is_object() {
        return Err(ComplianceError::StructuralError(
            "configuration item must be an object".to_string(),
        ));
    }

    let resource_type = required_str(item, "resourceType", "configurationItem.resourceType")?;
    let resource_id = required_str(item, "resourceId", "configurationItem.resourceId")?;
    let captured_at = parse_timestamp(
        "configurationItem.configurationItemCaptureTime",
        required_str(
            item,
            "configurationItemCaptureTime",
            "configurationItem.configurationItemCaptureTime",
        )?,
    )?;

    let tags = match item.get("tags") {
        None | Some(Value::Null) => Tags::new(),
        Some(raw) => parse_tags(raw)?,
    };

    let snapshot = ResourceSnapshot::new(resource_type, resource_id, captured_at)
        .with_configuration(item.get("configuration").cloned().unwrap_or(Value::Null))
        .with_tags(tags);
    snapshot.validate()?;

    Ok(snapshot)
}

/// Reads tags given either as a key/value object or as a list of
/// `{"Key": .., "Value": ..}` pairs.
pub fn parse_tags(raw: &Value) -> Result<Tags> {
    match raw {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(value) => Ok((key.clone(), value.clone())),
                other => Err(ComplianceError::invalid_field(
                    format!("tags.{}", key),
                    format!("expected a string, found {}", other),
                )),
            })
            .collect(),
        Value::Array(_) => tags_from_pairs(raw),
        other => Err(ComplianceError::invalid_field(
            "tags",
            format!("expected an object or a list, found {}", other),
        )),
    }
}

#[derive(Deserialize)]
struct TagPair {
    #[serde(rename = "Key", alias = "key")]
    key: String,
    #[serde(rename = "Value", alias = "value", default)]
    value: String,
}

/// Converts a `[{"Key": .., "Value": ..}]` list into tags. Later pairs win on
/// duplicate keys.
pub fn tags_from_pairs(raw: &Value) -> Result<Tags> {
    let pairs: Vec<TagPair> = serde_json::from_value(raw.clone())
        .map_err(|e| ComplianceError::invalid_field("tags", e.to_string()))?;
    Ok(pairs.into_iter().map(|pair| (pair.key, pair.value)).collect())
}

/// A parsed Amazon Resource Name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceArn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl ResourceArn {
    /// Parses `arn:partition:service:region:account:resource`.
    pub fn parse(arn: &str) -> Result<Self> {
        let parts: Vec<&str> = arn.trim().splitn(6, ':').collect();

        match parts.as_slice() {
            ["arn", partition, service, region, account_id, resource]
                if !partition.is_empty() && !service.is_empty() && !resource.is_empty() =>
            {
                Ok(Self {
                    partition: partition.to_string(),
                    service: service.to_string(),
                    region: region.to_string(),
                    account_id: account_id.to_string(),
                    resource: resource.to_string(),
                })
            }
            _ => Err(ComplianceError::invalid_field(
                "resource_arn",
                format!("'{}' is not a valid ARN", arn),
            )),
        }
    }
}

impl fmt::Display for ResourceArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Extracts the resource ARNs from a tag-enforcement notification event.
pub fn parse_tag_enforcement_event(json: &str) -> Result<Vec<ResourceArn>> {
    let event: Value = serde_json::from_str(json)?;

    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| ComplianceError::MissingField("Records".to_string()))?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let message = record
                .get("Sns")
                .and_then(|sns| sns.get("Message"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ComplianceError::MissingField(format!("Records[{}].Sns.Message", index))
                })?;
            ResourceArn::parse(message)
        })
        .collect()
}

fn decode_embedded(field: &str, raw: &Value) -> Result<Value> {
    match raw {
        Value::String(encoded) => serde_json::from_str(encoded)
            .map_err(|e| ComplianceError::invalid_field(field, e.to_string())),
        other => Ok(other.clone()),
    }
}

fn required_str<'a>(value: &'a Value, key: &str, field: &str) -> Result<&'a str> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(ComplianceError::MissingField(field.to_string()))
        }
        Some(other) => Err(ComplianceError::invalid_field(
            field,
            format!("expected a string, found {}", other),
        )),
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ComplianceError::invalid_field(field, e.to_string()))
}
