use serde::Serialize;
use std::time::Duration;

/// Why a cycle ended without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Capture,
    Request,
    Malformed,
}

/// In-memory counters for pipeline cycles since startup.
#[derive(Debug, Default)]
pub struct CycleStats {
    drowsy: u64,
    alert: u64,
    capture_failures: u64,
    request_failures: u64,
    malformed_responses: u64,
    ignored_triggers: u64,
    last_latency: Option<Duration>,
    total_latency: Duration,
    timed_requests: u64,
}

/// Snapshot of cycle stats for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSnapshot {
    pub cycles: u64,
    pub drowsy: u64,
    pub alert: u64,
    pub failures: u64,
    pub capture_failures: u64,
    pub request_failures: u64,
    pub malformed_responses: u64,
    pub ignored_triggers: u64,
    pub last_latency_ms: Option<f64>,
    pub avg_latency_ms: Option<f64>,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed classification and how long the request took.
    pub fn record_result(&mut self, drowsy: bool, latency: Duration) {
        if drowsy {
            self.drowsy += 1;
        } else {
            self.alert += 1;
        }
        self.record_latency(latency);
    }

    /// Record a failed cycle. Request latency is tracked only for failures
    /// that reached the service.
    pub fn record_failure(&mut self, kind: FailureKind, latency: Option<Duration>) {
        match kind {
            FailureKind::Capture => self.capture_failures += 1,
            FailureKind::Request => self.request_failures += 1,
            FailureKind::Malformed => self.malformed_responses += 1,
        }
        if let Some(latency) = latency {
            self.record_latency(latency);
        }
    }

    /// Record a trigger rejected because a cycle was already running.
    pub fn record_ignored(&mut self) {
        self.ignored_triggers += 1;
    }

    fn record_latency(&mut self, latency: Duration) {
        self.last_latency = Some(latency);
        self.total_latency += latency;
        self.timed_requests += 1;
    }

    pub fn failures(&self) -> u64 {
        self.capture_failures + self.request_failures + self.malformed_responses
    }

    pub fn cycles(&self) -> u64 {
        self.drowsy + self.alert + self.failures()
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        let avg_latency_ms = (self.timed_requests > 0)
            .then(|| as_millis_f64(self.total_latency) / self.timed_requests as f64);
        CycleSnapshot {
            cycles: self.cycles(),
            drowsy: self.drowsy,
            alert: self.alert,
            failures: self.failures(),
            capture_failures: self.capture_failures,
            request_failures: self.request_failures,
            malformed_responses: self.malformed_responses,
            ignored_triggers: self.ignored_triggers,
            last_latency_ms: self.last_latency.map(as_millis_f64),
            avg_latency_ms,
        }
    }
}

fn as_millis_f64(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}
