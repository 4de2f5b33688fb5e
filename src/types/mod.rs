//! Type definitions for the heart risk server

pub mod assessment;
pub mod patient;

pub use assessment::{ResultType, RiskAssessment};
pub use patient::{FeatureRecord, FieldValue};
