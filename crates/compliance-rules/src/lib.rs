//! Compliance Rules
//!
//! Deterministic evaluation of cloud resources against fixed compliance
//! rules: encryption-at-rest of compute instance block storage, and mandatory
//! resource tags.
//!
//! Each rule is a pure function of a resource snapshot (and, for tags, a
//! required-tag schema) that always yields exactly one `ComplianceOutcome`.
//! Parsing of provider events, tag lookups and result delivery live at the
//! edges, behind the `parser`, `provider` and `report` modules.
//!
//! ```rust
//! use compliance_rules::prelude::*;
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let snapshot = ResourceSnapshot::new("AWS::EC2::Instance", "i-0abc123", Utc::now())
//!     .with_configuration(json!({
//!         "BlockDeviceMappings": [{"DeviceName": "/dev/xvda", "Ebs": {"Encrypted": true}}]
//!     }))
//!     .with_tag("Environment", "QA");
//!
//! assert!(evaluate_encryption(&snapshot).is_compliant());
//!
//! let outcome = evaluate_tags(&snapshot.tags, &RequiredTagSchema::standard());
//! assert!(outcome.is_non_compliant());
//! ```

pub mod config;
pub mod encryption;
pub mod error;
pub mod evaluator;
pub mod hash;
pub mod outcome;
pub mod parser;
pub mod provider;
pub mod report;
pub mod schema;
pub mod snapshot;
pub mod tagging;
pub mod types;

pub use config::ComplianceConfig;
pub use encryption::evaluate_encryption;
pub use error::{ComplianceError, Result};
pub use evaluator::{ComplianceEvaluator, ComplianceRule, EncryptionRule, TagPolicyRule};
pub use outcome::{ComplianceOutcome, ComplianceType};
pub use schema::RequiredTagSchema;
pub use snapshot::ResourceSnapshot;
pub use tagging::evaluate_tags;

/// Version of the compliance rules.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::config::{AlertSettings, ComplianceConfig};
    pub use crate::encryption::evaluate_encryption;
    pub use crate::error::{ComplianceError, Result};
    pub use crate::evaluator::{
        ComplianceEvaluator, ComplianceRule, EncryptionRule, TagEnforcer, TagPolicyRule,
    };
    pub use crate::outcome::{ComplianceOutcome, ComplianceType, InvalidTag, TagViolations};
    pub use crate::provider::{StaticTagSource, TagSource};
    pub use crate::report::{ComplianceAlert, EvaluationRecord, MemoryReporter, Reporter};
    pub use crate::schema::{RequiredTag, RequiredTagSchema};
    pub use crate::snapshot::ResourceSnapshot;
    pub use crate::tagging::{evaluate_resource_tags, evaluate_tags};
    pub use crate::types::*;
}
