//! Compliance outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification tag of an outcome, as reported to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceType {
    NotApplicable,
    Compliant,
    NonCompliant,
    EvaluationError,
}

impl ComplianceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceType::NotApplicable => "NOT_APPLICABLE",
            ComplianceType::Compliant => "COMPLIANT",
            ComplianceType::NonCompliant => "NON_COMPLIANT",
            ComplianceType::EvaluationError => "EVALUATION_ERROR",
        }
    }
}

impl fmt::Display for ComplianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required tag whose value is outside its allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidTag {
    pub key: String,
    pub value: String,
    pub allowed_values: Vec<String>,
}

impl fmt::Display for InvalidTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (allowed values: {})",
            self.key,
            self.value,
            self.allowed_values.join(", ")
        )
    }
}

/// Structured detail of a failed tag evaluation.
///
/// Both lists follow the order of the required-tag schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagViolations {
    pub missing_tags: Vec<String>,
    pub invalid_tags: Vec<InvalidTag>,
}

impl TagViolations {
    pub fn is_empty(&self) -> bool {
        self.missing_tags.is_empty() && self.invalid_tags.is_empty()
    }
}

impl fmt::Display for TagViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_tags.is_empty() {
            parts.push(format!("Missing required tags: {}", self.missing_tags.join(", ")));
        }
        if !self.invalid_tags.is_empty() {
            let invalid: Vec<String> = self.invalid_tags.iter().map(ToString::to_string).collect();
            parts.push(format!("Invalid tag values: {}", invalid.join("; ")));
        }
        f.write_str(&parts.join(". "))
    }
}

/// The result of evaluating one resource against one rule.
///
/// Only `NonCompliant` can carry tag detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "compliance_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceOutcome {
    NotApplicable {
        annotation: String,
    },
    Compliant {
        annotation: String,
    },
    NonCompliant {
        annotation: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        violations: Option<TagViolations>,
    },
    EvaluationError {
        reason: String,
    },
}

impl ComplianceOutcome {
    /// Creates a not-applicable outcome.
    pub fn not_applicable(annotation: impl Into<String>) -> Self {
        ComplianceOutcome::NotApplicable {
            annotation: annotation.into(),
        }
    }

    /// Creates a compliant outcome.
    pub fn compliant(annotation: impl Into<String>) -> Self {
        ComplianceOutcome::Compliant {
            annotation: annotation.into(),
        }
    }

    /// Creates a non-compliant outcome without tag detail.
    pub fn non_compliant(annotation: impl Into<String>) -> Self {
        ComplianceOutcome::NonCompliant {
            annotation: annotation.into(),
            violations: None,
        }
    }

    /// Creates a non-compliant outcome from tag violations.
    pub fn tag_violations(violations: TagViolations) -> Self {
        ComplianceOutcome::NonCompliant {
            annotation: violations.to_string(),
            violations: Some(violations),
        }
    }

    /// Creates an evaluation error outcome.
    pub fn evaluation_error(reason: impl Into<String>) -> Self {
        ComplianceOutcome::EvaluationError {
            reason: reason.into(),
        }
    }

    /// The classification tag of this outcome.
    pub fn compliance_type(&self) -> ComplianceType {
        match self {
            ComplianceOutcome::NotApplicable { .. } => ComplianceType::NotApplicable,
            ComplianceOutcome::Compliant { .. } => ComplianceType::Compliant,
            ComplianceOutcome::NonCompliant { .. } => ComplianceType::NonCompliant,
            ComplianceOutcome::EvaluationError { .. } => ComplianceType::EvaluationError,
        }
    }

    /// Human-readable justification.
    pub fn annotation(&self) -> &str {
        match self {
            ComplianceOutcome::NotApplicable { annotation }
            | ComplianceOutcome::Compliant { annotation }
            | ComplianceOutcome::NonCompliant { annotation, .. } => annotation,
            ComplianceOutcome::EvaluationError { reason } => reason,
        }
    }

    /// Tag detail, present only on non-compliant tag evaluations.
    pub fn violations(&self) -> Option<&TagViolations> {
        match self {
            ComplianceOutcome::NonCompliant { violations, .. } => violations.as_ref(),
            _ => None,
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceOutcome::Compliant { .. })
    }

    pub fn is_non_compliant(&self) -> bool {
        matches!(self, ComplianceOutcome::NonCompliant { .. })
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, ComplianceOutcome::NotApplicable { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ComplianceOutcome::EvaluationError { .. })
    }

    /// Returns true if downstream alerting should be notified.
    pub fn requires_attention(&self) -> bool {
        self.is_non_compliant() || self.is_error()
    }
}
