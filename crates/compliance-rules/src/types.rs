//! Core types for the compliance rules.

use crate::error::{ComplianceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tag key to tag value mapping of one resource.
///
/// Ordered so that anything derived from it serializes identically on every
/// run.
pub type Tags = BTreeMap<String, String>;

/// Type of a cloud resource, as named by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Ec2Instance,
    Ec2Volume,
    S3Bucket,
    RdsDbInstance,
    LambdaFunction,
    /// Any type without a dedicated variant.
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Ec2Instance => "AWS::EC2::Instance",
            ResourceType::Ec2Volume => "AWS::EC2::Volume",
            ResourceType::S3Bucket => "AWS::S3::Bucket",
            ResourceType::RdsDbInstance => "AWS::RDS::DBInstance",
            ResourceType::LambdaFunction => "AWS::Lambda::Function",
            ResourceType::Other(name) => name,
        }
    }
}

impl From<String> for ResourceType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "AWS::EC2::Instance" => ResourceType::Ec2Instance,
            "AWS::EC2::Volume" => ResourceType::Ec2Volume,
            "AWS::S3::Bucket" => ResourceType::S3Bucket,
            "AWS::RDS::DBInstance" => ResourceType::RdsDbInstance,
            "AWS::Lambda::Function" => ResourceType::LambdaFunction,
            _ => ResourceType::Other(name),
        }
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        ResourceType::from(name.to_string())
    }
}

impl From<ResourceType> for String {
    fn from(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ResourceType::from(s))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes a field that is present in the payload, keeping an explicit
/// `null` apart from an absent key. Pair with `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// EBS settings attached to a block device mapping.
///
/// `encrypted` is `None` when the key is absent and `Some(None)` when it is
/// present as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbsBlockDevice {
    #[serde(
        rename = "Encrypted",
        alias = "encrypted",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub encrypted: Option<Option<bool>>,

    #[serde(rename = "VolumeId", alias = "volumeId", default)]
    pub volume_id: Option<String>,
}

/// One block device attached to a compute instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    #[serde(rename = "DeviceName", alias = "deviceName", default)]
    pub device_name: Option<String>,

    /// `Some(None)` when the mapping carries `"Ebs": null`.
    #[serde(
        rename = "Ebs",
        alias = "ebs",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub ebs: Option<Option<EbsBlockDevice>>,
}

impl BlockDeviceMapping {
    /// Creates a mapping with an EBS volume whose encryption flag is known.
    pub fn ebs(device_name: impl Into<String>, encrypted: bool) -> Self {
        Self {
            device_name: Some(device_name.into()),
            ebs: Some(Some(EbsBlockDevice {
                encrypted: Some(Some(encrypted)),
                volume_id: None,
            })),
        }
    }

    /// The encryption flag, if the mapping carries one.
    ///
    /// A `null` flag counts as present and unencrypted. A `null` EBS block
    /// has nothing to look the flag up in and is a structural error.
    pub fn encrypted(&self) -> Result<Option<bool>> {
        match &self.ebs {
            None => Ok(None),
            Some(None) => Err(ComplianceError::StructuralError(format!(
                "block device mapping {} has a null Ebs block",
                self.device_name.as_deref().unwrap_or("<unnamed>")
            ))),
            Some(Some(ebs)) => Ok(ebs.encrypted.map(|flag| flag.unwrap_or(false))),
        }
    }
}

/// Compute instance configuration with its block device mappings kept raw.
///
/// Mappings are decoded one at a time by `mapping`, so a malformed entry only
/// matters once a scan reaches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfiguration {
    #[serde(
        rename = "BlockDeviceMappings",
        alias = "blockDeviceMappings",
        default
    )]
    pub block_device_mappings: Vec<serde_json::Value>,
}

impl InstanceConfiguration {
    /// Decodes the instance configuration from a provider payload.
    ///
    /// The payload may be the configuration object itself or a JSON-encoded
    /// string of it. A `BlockDeviceMappings` value that is not a list is an
    /// error; the entries themselves are not inspected here.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        if let serde_json::Value::String(encoded) = value {
            let decoded: serde_json::Value = serde_json::from_str(encoded)
                .map_err(|e| ComplianceError::StructuralError(e.to_string()))?;
            return Self::from_value(&decoded);
        }

        serde_json::from_value(value.clone())
            .map_err(|e| ComplianceError::StructuralError(e.to_string()))
    }

    /// Decodes the mapping at `index`.
    pub fn mapping(&self, index: usize) -> Option<Result<BlockDeviceMapping>> {
        self.block_device_mappings.get(index).map(|raw| {
            serde_json::from_value(raw.clone()).map_err(|e| {
                ComplianceError::StructuralError(format!("BlockDeviceMappings[{}]: {}", index, e))
            })
        })
    }

    /// Decodes the mappings in order.
    pub fn mappings(&self) -> impl Iterator<Item = Result<BlockDeviceMapping>> + '_ {
        (0..self.block_device_mappings.len()).filter_map(move |index| self.mapping(index))
    }
}
