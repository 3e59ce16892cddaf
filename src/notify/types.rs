use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::classify::types::ClassificationResult;

/// Display time for a drowsiness alert.
pub const DROWSY_DURATION: Duration = Duration::from_millis(5000);

/// Display time for a non-drowsy verdict.
pub const ALERT_DURATION: Duration = Duration::from_millis(3000);

/// Display time when no explicit duration is given.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// Operator-facing text for any pipeline failure.
pub const PROCESSING_FAILED_MESSAGE: &str = "Error processing image";

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient message for the operator. Not retained once rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            severity,
            message: message.into(),
            duration,
        }
    }

    /// Notification for a successful classification.
    ///
    /// `Drowsy` raises an error-level alert; every other label, including
    /// ones this client does not know about, is reported as alert.
    pub fn for_result(result: &ClassificationResult) -> Self {
        let confidence = result.confidence_percent();
        if result.predicted_class.is_drowsy() {
            Self::new(
                Severity::Error,
                format!("Drowsy detected! (Confidence: {confidence})"),
                DROWSY_DURATION,
            )
        } else {
            Self::new(
                Severity::Success,
                format!("Alert (Confidence: {confidence})"),
                ALERT_DURATION,
            )
        }
    }

    /// Generic notification for a failed cycle, whatever the cause.
    pub fn processing_failed() -> Self {
        Self::new(Severity::Error, PROCESSING_FAILED_MESSAGE, DEFAULT_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drowsy_result_is_error_with_percentage() {
        let result = ClassificationResult::new("Drowsy", 0.873).unwrap();
        let n = Notification::for_result(&result);
        assert_eq!(n.severity, Severity::Error);
        assert!(n.message.contains("87.3%"), "{}", n.message);
        assert_eq!(n.duration, Duration::from_millis(5000));
    }

    #[test]
    fn alert_result_is_success_with_percentage() {
        let result = ClassificationResult::new("Alert", 0.95).unwrap();
        let n = Notification::for_result(&result);
        assert_eq!(n.severity, Severity::Success);
        assert!(n.message.contains("95.0%"), "{}", n.message);
        assert_eq!(n.duration, Duration::from_millis(3000));
    }

    #[test]
    fn unknown_label_is_treated_as_alert() {
        let result = ClassificationResult::new("Yawning", 0.4).unwrap();
        let n = Notification::for_result(&result);
        assert_eq!(n.severity, Severity::Success);
        assert_eq!(n.message, "Alert (Confidence: 40.0%)");
    }

    #[test]
    fn processing_failed_is_generic_error() {
        let n = Notification::processing_failed();
        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.message, "Error processing image");
        assert_eq!(n.duration, DEFAULT_DURATION);
    }

    #[test]
    fn notification_serialises_to_json() {
        let n = Notification::new(Severity::Info, "ready", Duration::from_millis(1500));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["severity"], "info");
        assert_eq!(json["message"], "ready");
        assert_eq!(json["durationMs"], 1500);
    }
}
