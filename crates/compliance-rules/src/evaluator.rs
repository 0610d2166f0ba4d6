//! Rule registry and evaluation driver.

use crate::config::{AlertSettings, ComplianceConfig};
use crate::encryption::evaluate_encryption;
use crate::error::Result;
use crate::outcome::ComplianceOutcome;
use crate::parser::ResourceArn;
use crate::provider::TagSource;
use crate::report::{emit_alert, emit_evaluation, ComplianceAlert, EvaluationRecord, Reporter};
use crate::schema::RequiredTagSchema;
use crate::snapshot::ResourceSnapshot;
use crate::tagging::{evaluate_resource_tags, evaluate_tags};
use chrono::Utc;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A fixed compliance predicate over a resource snapshot.
pub trait ComplianceRule: Send + Sync + Debug {
    /// Name the rule is registered under.
    fn name(&self) -> &str;

    /// Classifies the snapshot. Never fails; failures become
    /// `EVALUATION_ERROR` outcomes.
    fn evaluate(&self, snapshot: &ResourceSnapshot) -> ComplianceOutcome;
}

/// Encryption-at-rest rule for compute instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptionRule;

impl EncryptionRule {
    pub const NAME: &'static str = "ec2-encryption-rule";
}

impl ComplianceRule for EncryptionRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, snapshot: &ResourceSnapshot) -> ComplianceOutcome {
        evaluate_encryption(snapshot)
    }
}

/// Required-tag rule over the snapshot's tags.
#[derive(Debug, Clone)]
pub struct TagPolicyRule {
    schema: RequiredTagSchema,
}

impl TagPolicyRule {
    pub const NAME: &'static str = "required-tags";

    pub fn new(schema: RequiredTagSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RequiredTagSchema {
        &self.schema
    }
}

impl ComplianceRule for TagPolicyRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, snapshot: &ResourceSnapshot) -> ComplianceOutcome {
        evaluate_tags(&snapshot.tags, &self.schema)
    }
}

/// Runs a set of rules against snapshots.
#[derive(Debug, Default)]
pub struct ComplianceEvaluator {
    rules: Vec<Box<dyn ComplianceRule>>,
    alerts: AlertSettings,
}

impl ComplianceEvaluator {
    /// Creates an evaluator with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator with the encryption and tag rules.
    pub fn from_config(config: &ComplianceConfig) -> Self {
        Self::new()
            .with_rule(EncryptionRule)
            .with_rule(TagPolicyRule::new(config.required_tags.clone()))
            .with_alert_settings(config.alerts.clone())
    }

    /// Adds a rule to the evaluator.
    pub fn add_rule(&mut self, rule: impl ComplianceRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Adds a rule and returns self for chaining.
    pub fn with_rule(mut self, rule: impl ComplianceRule + 'static) -> Self {
        self.add_rule(rule);
        self
    }

    /// Sets how alerts are addressed.
    pub fn with_alert_settings(mut self, alerts: AlertSettings) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluates every rule, in registration order, against the snapshot.
    pub fn evaluate(&self, snapshot: &ResourceSnapshot) -> Vec<EvaluationRecord> {
        self.rules
            .iter()
            .map(|rule| {
                let start = Instant::now();
                let outcome = rule.evaluate(snapshot);

                debug!(
                    rule = rule.name(),
                    resource_id = %snapshot.resource_id,
                    compliance_type = %outcome.compliance_type(),
                    "rule evaluated"
                );

                EvaluationRecord {
                    rule_name: rule.name().to_string(),
                    resource_type: snapshot.resource_type.clone(),
                    resource_id: snapshot.resource_id.clone(),
                    ordering_timestamp: snapshot.captured_at,
                    outcome,
                    evaluation_time_us: None,
                }
                .with_evaluation_time(elapsed_micros(start.elapsed()))
            })
            .collect()
    }

    /// Evaluates the snapshot, records every result and alerts on those that
    /// need attention.
    ///
    /// A failure to record is returned; a failure to alert is only logged.
    pub fn evaluate_and_report(
        &self,
        snapshot: &ResourceSnapshot,
        reporter: &dyn Reporter,
    ) -> Result<Vec<EvaluationRecord>> {
        let records = self.evaluate(snapshot);

        reporter.put_evaluations(&records)?;
        records.iter().for_each(emit_evaluation);

        for record in records.iter().filter(|r| r.outcome.requires_attention()) {
            let alert = ComplianceAlert::from_record(record, &self.alerts, Utc::now());
            send_alert(reporter, &alert);
        }

        Ok(records)
    }
}

/// Checks tags of resources known only by ARN and alerts on failures.
#[derive(Debug)]
pub struct TagEnforcer<S: TagSource> {
    source: S,
    schema: RequiredTagSchema,
    alerts: AlertSettings,
}

impl<S: TagSource> TagEnforcer<S> {
    pub fn new(source: S, config: &ComplianceConfig) -> Self {
        Self {
            source,
            schema: config.required_tags.clone(),
            alerts: config.alerts.clone(),
        }
    }

    /// Evaluates each resource and sends an alert for every one that needs
    /// attention. Returns the outcomes in input order.
    pub fn enforce(
        &self,
        resources: &[ResourceArn],
        reporter: &dyn Reporter,
    ) -> Vec<(ResourceArn, ComplianceOutcome)> {
        resources
            .iter()
            .map(|arn| {
                let outcome = evaluate_resource_tags(&self.source, &arn.to_string(), &self.schema);

                if outcome.requires_attention() {
                    let alert = ComplianceAlert::new(
                        arn.to_string(),
                        arn.service.clone(),
                        &outcome,
                        &self.alerts,
                        Utc::now(),
                    );
                    send_alert(reporter, &alert);
                }

                (arn.clone(), outcome)
            })
            .collect()
    }
}

fn send_alert(reporter: &dyn Reporter, alert: &ComplianceAlert) {
    match reporter.send_alert(alert) {
        Ok(()) => emit_alert(alert),
        Err(err) => warn!(
            resource_id = %alert.resource_id,
            error = %err,
            "Error sending alert"
        ),
    }
}

/// Elapsed time in microseconds, saturating at `u64::MAX`.
fn elapsed_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ComplianceType;
    use crate::provider::StaticTagSource;
    use crate::report::MemoryReporter;
    use crate::types::Tags;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_snapshot(encrypted: bool) -> ResourceSnapshot {
        ResourceSnapshot::new(
            "AWS::EC2::Instance",
            "i-0abc123",
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
        .with_configuration(json!({
            "BlockDeviceMappings": [{"DeviceName": "/dev/xvda", "Ebs": {"Encrypted": encrypted}}]
        }))
        .with_tag("Environment", "Production")
        .with_tag("Project", "billing")
        .with_tag("Owner", "ops")
        .with_tag("CostCenter", "cc-42")
    }

    #[test]
    fn test_elapsed_micros_saturates() {
        assert_eq!(elapsed_micros(Duration::from_micros(1_500)), 1_500);
        assert_eq!(elapsed_micros(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_from_config() {
        let evaluator = ComplianceEvaluator::from_config(&ComplianceConfig::default());
        assert_eq!(evaluator.rule_count(), 2);

        let records = evaluator.evaluate(&create_test_snapshot(true));
        let names: Vec<&str> = records.iter().map(|r| r.rule_name.as_str()).collect();
        assert_eq!(names, [EncryptionRule::NAME, TagPolicyRule::NAME]);
        assert!(records.iter().all(|r| r.outcome.is_compliant()));
        assert!(records.iter().all(|r| r.evaluation_time_us.is_some()));
    }

    #[test]
    fn test_empty_evaluator() {
        let evaluator = ComplianceEvaluator::new();
        assert!(evaluator.evaluate(&create_test_snapshot(true)).is_empty());
    }

    #[test]
    fn test_records_carry_snapshot_identity() {
        let evaluator = ComplianceEvaluator::new().with_rule(EncryptionRule);
        let snapshot = create_test_snapshot(false);

        let record = &evaluator.evaluate(&snapshot)[0];
        assert_eq!(record.resource_id, snapshot.resource_id);
        assert_eq!(record.ordering_timestamp, snapshot.captured_at);
        assert_eq!(record.compliance_type(), ComplianceType::NonCompliant);
    }

    #[test]
    fn test_evaluate_and_report_alerts_on_failures() {
        let evaluator = ComplianceEvaluator::from_config(&ComplianceConfig::default());
        let reporter = MemoryReporter::new();

        let records = evaluator
            .evaluate_and_report(&create_test_snapshot(false), &reporter)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(reporter.records().len(), 2);

        let alerts = reporter.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].compliance_status, ComplianceType::NonCompliant);
        assert_eq!(alerts[0].resource_type, "AWS::EC2::Instance");
    }

    #[test]
    fn test_alert_failure_is_swallowed() {
        let evaluator = ComplianceEvaluator::from_config(&ComplianceConfig::default());
        let reporter = MemoryReporter::rejecting_alerts();

        let records = evaluator
            .evaluate_and_report(&create_test_snapshot(false), &reporter)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(reporter.records().len(), 2);
        assert!(reporter.alerts().is_empty());
    }

    #[test]
    fn test_tag_enforcer() {
        let good = ResourceArn::parse("arn:aws:ec2:us-east-1:123456789012:instance/i-1").unwrap();
        let bare = ResourceArn::parse("arn:aws:s3:::logs").unwrap();
        let broken = ResourceArn::parse("arn:aws:rds:us-east-1:123456789012:db:main").unwrap();

        let tags: Tags = [
            ("Environment", "Staging"),
            ("Project", "billing"),
            ("Owner", "ops"),
            ("CostCenter", "cc-42"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let source = StaticTagSource::new()
            .with_resource(good.to_string(), tags)
            .with_failure(broken.to_string(), "ThrottlingException");
        let enforcer = TagEnforcer::new(source, &ComplianceConfig::default());
        let reporter = MemoryReporter::new();

        let results = enforcer.enforce(&[good, bare, broken], &reporter);
        let types: Vec<ComplianceType> = results.iter().map(|(_, o)| o.compliance_type()).collect();
        assert_eq!(
            types,
            [
                ComplianceType::Compliant,
                ComplianceType::NonCompliant,
                ComplianceType::EvaluationError
            ]
        );

        let alerts = reporter.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].subject, "Tag Compliance Alert - s3");
        assert_eq!(alerts[1].resource_type, "rds");
        assert!(reporter.records().is_empty());
    }
}
