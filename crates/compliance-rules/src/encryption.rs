//! Encryption-at-rest rule for compute instances.

use crate::error::Result;
use crate::outcome::ComplianceOutcome;
use crate::snapshot::ResourceSnapshot;
use crate::types::{InstanceConfiguration, ResourceType};
use tracing::{debug, warn};

/// Evaluates block-storage encryption of a compute instance.
///
/// The first block device mapping that carries both an EBS block and an
/// encryption flag decides the outcome; later mappings are not decoded.
/// A `null` flag decides as unencrypted. An instance with no such mapping is
/// non-compliant.
pub fn evaluate_encryption(snapshot: &ResourceSnapshot) -> ComplianceOutcome {
    if !snapshot.is_type(&ResourceType::Ec2Instance) {
        return ComplianceOutcome::not_applicable(format!(
            "The rule does not apply to resources of type {}",
            snapshot.resource_type
        ));
    }

    match first_encryption_flag(snapshot) {
        Ok(Some((device, true))) => {
            debug!(resource_id = %snapshot.resource_id, device = ?device, "encrypted");
            ComplianceOutcome::compliant("EC2 instance has encryption enabled")
        }
        Ok(Some((device, false))) => {
            debug!(resource_id = %snapshot.resource_id, device = ?device, "unencrypted");
            ComplianceOutcome::non_compliant("EC2 instance does not have encryption enabled")
        }
        Ok(None) => ComplianceOutcome::non_compliant(
            "EC2 instance does not have EBS volumes with encryption configuration",
        ),
        Err(err) => {
            warn!(
                resource_id = %snapshot.resource_id,
                error = %err,
                "Error evaluating compliance"
            );
            ComplianceOutcome::evaluation_error(format!("Error evaluating compliance: {}", err))
        }
    }
}

/// Device name and flag of the first mapping that carries a flag.
fn first_encryption_flag(snapshot: &ResourceSnapshot) -> Result<Option<(Option<String>, bool)>> {
    let configuration = InstanceConfiguration::from_value(&snapshot.configuration)?;

    for mapping in configuration.mappings() {
        let mapping = mapping?;
        if let Some(encrypted) = mapping.encrypted()? {
            return Ok(Some((mapping.device_name, encrypted)));
        }
    }

    Ok(None)
}
