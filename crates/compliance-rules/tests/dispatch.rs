use compliance_rules::evaluator::TagEnforcer;
use compliance_rules::parser::{parse_config_rule_event, parse_tag_enforcement_event};
use compliance_rules::provider::StaticTagSource;
use compliance_rules::report::MemoryReporter;
use compliance_rules::types::Tags;
use compliance_rules::{ComplianceConfig, ComplianceEvaluator, ComplianceType, EncryptionRule};
use serde_json::json;

const CONFIG: &str = r#"
required_tags:
  - key: Environment
    allowed_values: [Production, Development, Staging]
  - key: Owner
alerts:
  topic_arn: arn:aws:sns:us-east-1:123456789012:tag-compliance-alerts
  subject_prefix: Compliance Alert
"#;

fn config_rule_event(resource_type: &str, configuration: serde_json::Value) -> String {
    let invoking = json!({
        "configurationItem": {
            "resourceType": resource_type,
            "resourceId": "i-0abc123",
            "configurationItemCaptureTime": "2024-03-01T12:00:00.000Z",
            "configuration": configuration.to_string(),
            "tags": {"Environment": "QA", "Owner": "ops"}
        },
        "messageType": "ConfigurationItemChangeNotification"
    });

    json!({
        "invokingEvent": invoking.to_string(),
        "ruleParameters": "{}",
        "resultToken": "token-123"
    })
    .to_string()
}

#[test]
fn config_rule_event_is_evaluated_and_reported() {
    let config = ComplianceConfig::parse(CONFIG).unwrap();
    let evaluator = ComplianceEvaluator::from_config(&config);
    let reporter = MemoryReporter::new();

    let event = parse_config_rule_event(&config_rule_event(
        "AWS::EC2::Instance",
        json!({"BlockDeviceMappings": [{"DeviceName": "/dev/xvda", "Ebs": {"Encrypted": true}}]}),
    ))
    .unwrap();

    let records = evaluator
        .evaluate_and_report(&event.snapshot, &reporter)
        .unwrap();

    let types: Vec<ComplianceType> = records.iter().map(|r| r.compliance_type()).collect();
    assert_eq!(types, [ComplianceType::Compliant, ComplianceType::NonCompliant]);

    let alerts = reporter.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "Compliance Alert - AWS::EC2::Instance");
    assert_eq!(
        alerts[0].topic_arn.as_deref(),
        Some("arn:aws:sns:us-east-1:123456789012:tag-compliance-alerts")
    );
    let violations = alerts[0].details.violations.as_ref().unwrap();
    assert_eq!(violations.invalid_tags[0].value, "QA");
}

#[test]
fn malformed_configuration_becomes_evaluation_error() {
    let evaluator = ComplianceEvaluator::new().with_rule(EncryptionRule);
    let reporter = MemoryReporter::new();

    let event = parse_config_rule_event(&config_rule_event(
        "AWS::EC2::Instance",
        json!({"BlockDeviceMappings": 42}),
    ))
    .unwrap();

    let records = evaluator
        .evaluate_and_report(&event.snapshot, &reporter)
        .unwrap();
    assert_eq!(records[0].compliance_type(), ComplianceType::EvaluationError);
    assert_eq!(
        reporter.alerts()[0].compliance_status,
        ComplianceType::EvaluationError
    );
}

#[test]
fn other_resource_types_are_not_applicable() {
    let evaluator = ComplianceEvaluator::new().with_rule(EncryptionRule);
    let reporter = MemoryReporter::new();

    let event = parse_config_rule_event(&config_rule_event(
        "AWS::S3::Bucket",
        json!({"BucketName": "logs"}),
    ))
    .unwrap();

    let records = evaluator
        .evaluate_and_report(&event.snapshot, &reporter)
        .unwrap();
    assert_eq!(records[0].compliance_type(), ComplianceType::NotApplicable);
    assert!(reporter.alerts().is_empty());
    assert_eq!(reporter.records().len(), 1);
}

#[test]
fn repeated_evaluation_has_same_fingerprint() {
    let evaluator = ComplianceEvaluator::from_config(&ComplianceConfig::default());
    let event = parse_config_rule_event(&config_rule_event(
        "AWS::EC2::Instance",
        json!({"BlockDeviceMappings": []}),
    ))
    .unwrap();

    let first = evaluator.evaluate(&event.snapshot);
    let second = evaluator.evaluate(&event.snapshot);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}

#[test]
fn tag_enforcement_event_flow() {
    let config = ComplianceConfig::parse(CONFIG).unwrap();
    let event = json!({
        "Records": [
            {"Sns": {"Message": "arn:aws:ec2:us-east-1:123456789012:instance/i-1"}},
            {"Sns": {"Message": "arn:aws:ec2:us-east-1:123456789012:instance/i-2"}}
        ]
    });
    let arns = parse_tag_enforcement_event(&event.to_string()).unwrap();

    let mut tagged = Tags::new();
    tagged.insert("Environment".to_string(), "Production".to_string());
    tagged.insert("Owner".to_string(), "ops".to_string());
    let source = StaticTagSource::new().with_resource(arns[0].to_string(), tagged);

    let reporter = MemoryReporter::new();
    let results = TagEnforcer::new(source, &config).enforce(&arns, &reporter);

    assert!(results[0].1.is_compliant());
    assert_eq!(results[1].1.annotation(), "No tags found on resource");

    let alerts = reporter.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].resource_id, arns[1].to_string());
    assert_eq!(alerts[0].resource_type, "ec2");
}
