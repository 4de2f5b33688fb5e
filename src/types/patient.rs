//! Clinical measurements submitted through the prediction form

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Form value after type conversion.
///
/// Integers and floats are kept apart so the result page shows
/// `40` for an age and `120.0` for a blood pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::Int(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole numbers
            FieldValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// One patient's thirteen clinical attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Age in years
    pub age: i64,
    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,
    /// Serum cholesterol (mg/dl)
    pub chol: f64,
    /// Fasting blood sugar > 120 mg/dl (1 = true)
    pub fbs: i64,
    /// Maximum heart rate achieved
    pub thalach: f64,
    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,
    /// Chest pain type
    pub cp: i64,
    /// 0 = male, 1 = female
    pub sex: i64,
    /// Resting electrocardiographic result
    pub restecg: i64,
    /// Exercise induced angina (1 = yes)
    pub exang: i64,
    /// Slope of the peak exercise ST segment
    pub slope: i64,
    /// Number of major vessels colored by fluoroscopy
    pub ca: i64,
    /// Thalassemia category
    pub thal: i64,
}

impl FeatureRecord {
    /// Field names in form iteration order
    pub const FIELD_NAMES: [&'static str; 13] = [
        "age", "trestbps", "chol", "fbs", "thalach", "oldpeak", "cp", "sex", "restecg", "exang",
        "slope", "ca", "thal",
    ];

    /// Build a record from submitted form fields.
    ///
    /// Absent fields take their default. A present field that does not
    /// convert (including an empty string) is an error.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            age: int_field(form, "age", defaults.age)?,
            trestbps: float_field(form, "trestbps", defaults.trestbps)?,
            chol: float_field(form, "chol", defaults.chol)?,
            fbs: int_field(form, "fbs", defaults.fbs)?,
            thalach: float_field(form, "thalach", defaults.thalach)?,
            oldpeak: float_field(form, "oldpeak", defaults.oldpeak)?,
            cp: int_field(form, "cp", defaults.cp)?,
            sex: sex_field(form),
            restecg: int_field(form, "restecg", defaults.restecg)?,
            exang: int_field(form, "exang", defaults.exang)?,
            slope: int_field(form, "slope", defaults.slope)?,
            ca: int_field(form, "ca", defaults.ca)?,
            thal: int_field(form, "thal", defaults.thal)?,
        })
    }

    /// `(name, value)` pairs in form iteration order
    pub fn entries(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("age", FieldValue::Int(self.age)),
            ("trestbps", FieldValue::Float(self.trestbps)),
            ("chol", FieldValue::Float(self.chol)),
            ("fbs", FieldValue::Int(self.fbs)),
            ("thalach", FieldValue::Float(self.thalach)),
            ("oldpeak", FieldValue::Float(self.oldpeak)),
            ("cp", FieldValue::Int(self.cp)),
            ("sex", FieldValue::Int(self.sex)),
            ("restecg", FieldValue::Int(self.restecg)),
            ("exang", FieldValue::Int(self.exang)),
            ("slope", FieldValue::Int(self.slope)),
            ("ca", FieldValue::Int(self.ca)),
            ("thal", FieldValue::Int(self.thal)),
        ]
    }

    /// Look up a single attribute by column name
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.entries()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self {
            age: 40,
            trestbps: 120.0,
            chol: 200.0,
            fbs: 0,
            thalach: 150.0,
            oldpeak: 1.0,
            cp: 0,
            sex: 0,
            restecg: 0,
            exang: 0,
            slope: 0,
            ca: 0,
            thal: 0,
        }
    }
}

fn int_field(form: &HashMap<String, String>, name: &str, default: i64) -> Result<i64> {
    match form.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("invalid integer for field '{}': {:?}", name, raw)),
    }
}

fn float_field(form: &HashMap<String, String>, name: &str, default: f64) -> Result<f64> {
    match form.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid number for field '{}': {:?}", name, raw)),
    }
}

fn sex_field(form: &HashMap<String, String>) -> i64 {
    match form.get("sex").map(String::as_str).unwrap_or("M") {
        "M" => 0,
        _ => 1,
    }
}
