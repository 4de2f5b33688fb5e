//! Risk assessment returned to the result page

use crate::types::patient::{FeatureRecord, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Palette cycled over the input fields on the result page
pub const INPUT_PALETTE: [&str; 10] = [
    "#FFB6C1", "#FFA07A", "#FFD700", "#90EE90", "#87CEFA", "#BA55D3", "#FFE4B5", "#98FB98",
    "#AFEEEE", "#F08080",
];

pub const HIGH_RISK_MESSAGE: &str = "High risk of Heart Disease - consult a doctor.";
pub const LOW_RISK_MESSAGE: &str = "Low risk of Heart Disease.";

/// Display category of a result message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Success,
    Danger,
    Info,
    Warning,
}

/// Text and background color of a message box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorPair {
    pub text: &'static str,
    pub bg: &'static str,
}

impl ResultType {
    /// Category for a classifier label: 1 is danger, anything else success
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            ResultType::Danger
        } else {
            ResultType::Success
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::Success => "success",
            ResultType::Danger => "danger",
            ResultType::Info => "info",
            ResultType::Warning => "warning",
        }
    }

    pub fn colors(self) -> ColorPair {
        match self {
            ResultType::Success => ColorPair {
                text: "#155724",
                bg: "#d4edda",
            },
            ResultType::Danger => ColorPair {
                text: "#721c24",
                bg: "#f8d7da",
            },
            ResultType::Info => ColorPair {
                text: "#0c5460",
                bg: "#d1ecf1",
            },
            ResultType::Warning => ColorPair {
                text: "#856404",
                bg: "#fff3cd",
            },
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ResultType::Danger => HIGH_RISK_MESSAGE,
            _ => LOW_RISK_MESSAGE,
        }
    }
}

/// A submitted field with its display color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredInput {
    pub name: &'static str,
    pub value: FieldValue,
    pub color: &'static str,
}

/// Assign palette colors to the record's fields, wrapping after ten
pub fn color_inputs(record: &FeatureRecord) -> Vec<ColoredInput> {
    record
        .entries()
        .into_iter()
        .zip(INPUT_PALETTE.iter().cycle())
        .map(|((name, value), &color)| ColoredInput {
            name,
            value,
            color,
        })
        .collect()
}

/// Outcome of one prediction request
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Unique request identifier
    pub request_id: String,
    /// Raw classifier label
    pub label: i64,
    /// Display category
    pub result_type: ResultType,
    /// Human-readable message
    pub message: &'static str,
    /// Message box colors
    pub colors: ColorPair,
    /// Submitted fields with display colors
    pub inputs: Vec<ColoredInput>,
    /// Time the assessment was produced
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(label: i64, record: &FeatureRecord) -> Self {
        let result_type = ResultType::from_label(label);

        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            label,
            result_type,
            message: result_type.message(),
            colors: result_type.colors(),
            inputs: color_inputs(record),
            assessed_at: Utc::now(),
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.result_type == ResultType::Danger
    }
}
