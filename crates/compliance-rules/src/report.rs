//! Evaluation records, alerts and the reporting seam.

use crate::config::AlertSettings;
use crate::error::{ComplianceError, Result};
use crate::hash;
use crate::outcome::{ComplianceOutcome, ComplianceType, TagViolations};
use crate::types::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// One rule's verdict on one resource, as handed to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Name of the rule that produced the outcome.
    pub rule_name: String,

    pub resource_type: ResourceType,

    pub resource_id: String,

    /// Capture time of the evaluated snapshot.
    pub ordering_timestamp: DateTime<Utc>,

    pub outcome: ComplianceOutcome,

    /// Time taken to evaluate (in microseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time_us: Option<u64>,
}

impl EvaluationRecord {
    /// Sets the evaluation time.
    pub fn with_evaluation_time(mut self, time_us: u64) -> Self {
        self.evaluation_time_us = Some(time_us);
        self
    }

    pub fn compliance_type(&self) -> ComplianceType {
        self.outcome.compliance_type()
    }

    /// Stable identifier of this verdict.
    ///
    /// Timing is excluded, so evaluating the same snapshot twice yields the
    /// same fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_string(&(
            &self.rule_name,
            &self.resource_type,
            &self.resource_id,
            &self.ordering_timestamp,
            &self.outcome,
        ))?;
        Ok(hash::fingerprint(&canonical))
    }
}

/// Body of an alert message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDetails {
    pub annotation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<TagViolations>,
}

/// Notification for a resource that needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub timestamp: DateTime<Utc>,
    pub resource_id: String,
    pub resource_type: String,
    pub compliance_status: ComplianceType,
    pub details: AlertDetails,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
}

impl ComplianceAlert {
    /// Builds an alert for an outcome on the given resource.
    pub fn new(
        resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        outcome: &ComplianceOutcome,
        settings: &AlertSettings,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let resource_type = resource_type.into();
        Self {
            timestamp,
            resource_id: resource_id.into(),
            subject: format!("{} - {}", settings.subject_prefix, resource_type),
            resource_type,
            compliance_status: outcome.compliance_type(),
            details: AlertDetails {
                annotation: outcome.annotation().to_string(),
                violations: outcome.violations().cloned(),
            },
            topic_arn: settings.topic_arn.clone(),
        }
    }

    /// Builds an alert from an evaluation record.
    pub fn from_record(
        record: &EvaluationRecord,
        settings: &AlertSettings,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            record.resource_id.clone(),
            record.resource_type.as_str(),
            &record.outcome,
            settings,
            timestamp,
        )
    }

    /// Serializes the alert as a message body.
    pub fn to_message(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receives evaluation results and alerts.
pub trait Reporter: Send + Sync + Debug {
    /// Persists evaluation records.
    fn put_evaluations(&self, records: &[EvaluationRecord]) -> Result<()>;

    /// Publishes an alert.
    fn send_alert(&self, alert: &ComplianceAlert) -> Result<()>;
}

/// Reporter that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<EvaluationRecord>>,
    alerts: Mutex<Vec<ComplianceAlert>>,
    reject_alerts: bool,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter whose alert channel always fails.
    pub fn rejecting_alerts() -> Self {
        Self {
            reject_alerts: true,
            ..Self::default()
        }
    }

    /// Records received so far, including those stored before a panic
    /// poisoned the buffer.
    pub fn records(&self) -> Vec<EvaluationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Alerts received so far.
    pub fn alerts(&self) -> Vec<ComplianceAlert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for MemoryReporter {
    fn put_evaluations(&self, records: &[EvaluationRecord]) -> Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| ComplianceError::Reporting("record buffer poisoned".to_string()))?;
        stored.extend_from_slice(records);
        Ok(())
    }

    fn send_alert(&self, alert: &ComplianceAlert) -> Result<()> {
        if self.reject_alerts {
            return Err(ComplianceError::Reporting(format!(
                "alert channel unavailable for {}",
                alert.resource_id
            )));
        }
        let mut stored = self
            .alerts
            .lock()
            .map_err(|_| ComplianceError::Reporting("alert buffer poisoned".to_string()))?;
        stored.push(alert.clone());
        Ok(())
    }
}

/// Emits an audit event for an evaluation record.
pub fn emit_evaluation(record: &EvaluationRecord) {
    tracing::info!(
        target: "compliance_rules::audit",
        event_type = "compliance_evaluation",
        rule = %record.rule_name,
        resource_type = %record.resource_type,
        resource_id = %record.resource_id,
        compliance_type = %record.compliance_type(),
        annotation = %record.outcome.annotation(),
        ordering_timestamp = %record.ordering_timestamp.to_rfc3339(),
        evaluation_time_us = ?record.evaluation_time_us,
        "Compliance evaluation recorded"
    );
}

/// Emits an audit event for a published alert.
pub fn emit_alert(alert: &ComplianceAlert) {
    tracing::info!(
        target: "compliance_rules::audit",
        event_type = "compliance_alert",
        resource_type = %alert.resource_type,
        resource_id = %alert.resource_id,
        compliance_status = %alert.compliance_status,
        topic_arn = ?alert.topic_arn,
        "Compliance alert sent"
    );
}
