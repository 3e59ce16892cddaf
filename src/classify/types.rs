use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::error::{ClassifyError, Result};

/// Label the service uses for a drowsy subject.
pub const DROWSY_LABEL: &str = "Drowsy";

/// Predicted label, open-ended so new service labels pass through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PredictedClass {
    Drowsy,
    Other(String),
}

impl PredictedClass {
    pub fn from_label(label: &str) -> Self {
        if label == DROWSY_LABEL {
            Self::Drowsy
        } else {
            Self::Other(label.to_string())
        }
    }

    pub fn is_drowsy(&self) -> bool {
        matches!(self, Self::Drowsy)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Drowsy => DROWSY_LABEL,
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for PredictedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated classifier verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub predicted_class: PredictedClass,
    /// Always finite and within `[0.0, 1.0]`.
    pub confidence: f64,
    /// Decision threshold the service applied, when it reports one.
    pub threshold_used: Option<f64>,
}

impl ClassificationResult {
    /// Validate and build a result.
    pub fn new(label: &str, confidence: f64) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(ClassifyError::Malformed("empty predicted_class".to_string()));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassifyError::Malformed(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            predicted_class: PredictedClass::from_label(label),
            confidence,
            threshold_used: None,
        })
    }

    /// Confidence as a percentage with one decimal place, e.g. `87.3%`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

/// JSON body returned by the prediction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_class: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,
}

impl PredictionResponse {
    /// Parse a raw response body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ClassifyError::Malformed(e.to_string()))
    }
}

impl TryFrom<PredictionResponse> for ClassificationResult {
    type Error = ClassifyError;

    fn try_from(response: PredictionResponse) -> Result<Self> {
        let mut result = Self::new(&response.predicted_class, response.confidence)?;
        result.threshold_used = response.threshold_used;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drowsy_label_maps_to_drowsy() {
        assert!(PredictedClass::from_label("Drowsy").is_drowsy());
    }

    #[test]
    fn other_labels_are_preserved() {
        let class = PredictedClass::from_label("Non-Drowsy");
        assert!(!class.is_drowsy());
        assert_eq!(class.as_str(), "Non-Drowsy");
        assert_eq!(PredictedClass::from_label("Yawning").to_string(), "Yawning");
    }

    #[test]
    fn label_match_is_case_sensitive() {
        assert!(!PredictedClass::from_label("drowsy").is_drowsy());
    }

    #[test]
    fn confidence_percent_has_one_decimal() {
        let drowsy = ClassificationResult::new("Drowsy", 0.873).unwrap();
        assert_eq!(drowsy.confidence_percent(), "87.3%");
        let alert = ClassificationResult::new("Alert", 0.95).unwrap();
        assert_eq!(alert.confidence_percent(), "95.0%");
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(ClassificationResult::new("Alert", 0.0).is_ok());
        assert!(ClassificationResult::new("Alert", 1.0).is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_malformed() {
        for bad in [-0.01, 1.5, f64::NAN, f64::INFINITY] {
            let err = ClassificationResult::new("Alert", bad).unwrap_err();
            assert!(err.is_malformed(), "{bad} should be rejected");
        }
    }

    #[test]
    fn empty_label_is_malformed() {
        assert!(ClassificationResult::new("  ", 0.5).unwrap_err().is_malformed());
    }

    #[test]
    fn parse_accepts_service_body() {
        let body = br#"{
            "predicted_class": "Drowsy",
            "confidence": 0.97,
            "threshold_used": 0.9,
            "class_names": ["Non-Drowsy", "Drowsy"],
            "preprocessing": "Normalized to [0,1], resized to 224x224"
        }"#;
        let result = ClassificationResult::try_from(PredictionResponse::parse(body).unwrap()).unwrap();
        assert!(result.predicted_class.is_drowsy());
        assert_eq!(result.confidence, 0.97);
        assert_eq!(result.threshold_used, Some(0.9));
    }

    #[test]
    fn parse_rejects_missing_confidence() {
        let err = PredictionResponse::parse(br#"{"predicted_class": "Drowsy"}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn parse_rejects_string_confidence() {
        let body = br#"{"predicted_class": "Drowsy", "confidence": "high"}"#;
        assert!(PredictionResponse::parse(body).unwrap_err().is_malformed());
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(PredictionResponse::parse(b"<html>oops</html>").unwrap_err().is_malformed());
    }
}
