use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use super::error::{ClassifyError, Result};
use super::types::{ClassificationResult, PredictionResponse};
use super::Classifier;
use crate::preview::encode::BinaryPayload;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Tunables for [`ClassificationClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Whole-request timeout. `None` leaves the network stack default.
    pub timeout: Option<Duration>,
    /// Decision threshold forwarded to the service as a query parameter.
    pub threshold: Option<f64>,
}

/// Endpoints must be absolute `http`/`https` URLs with a host.
pub fn check_endpoint(endpoint: &Url) -> std::result::Result<(), String> {
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(format!("scheme '{}' is not http or https", endpoint.scheme()));
    }
    if endpoint.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

/// Thresholds are probabilities in `(0, 1]`.
pub fn check_threshold(threshold: f64) -> std::result::Result<(), String> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(format!("threshold {threshold} is outside (0, 1]"))
    }
}

/// HTTP client for the prediction endpoint.
///
/// Each call is a single attempt: no retries, no caching.
pub struct ClassificationClient {
    client: Client,
    endpoint: Url,
    threshold: Option<f64>,
}

impl ClassificationClient {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: Url, options: ClientOptions) -> Result<Self> {
        check_endpoint(&endpoint).map_err(ClassifyError::InvalidRequest)?;
        if let Some(threshold) = options.threshold {
            check_threshold(threshold).map_err(ClassifyError::InvalidRequest)?;
        }

        let mut builder =
            Client::builder().user_agent(concat!("drowsy-watch/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        info!(
            "classification client configured: endpoint={}, timeout={:?}, threshold={:?}",
            endpoint, options.timeout, options.threshold
        );

        Ok(Self {
            client,
            endpoint,
            threshold: options.threshold,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the multipart body: a single `file` part.
    fn form(payload: BinaryPayload) -> Result<Form> {
        let part = Part::bytes(payload.bytes)
            .file_name(payload.filename)
            .mime_str(payload.mime)?;
        Ok(Form::new().part(FILE_FIELD, part))
    }
}

#[async_trait]
impl Classifier for ClassificationClient {
    async fn classify(&self, payload: BinaryPayload) -> Result<ClassificationResult> {
        let size = payload.len();
        let form = Self::form(payload)?;

        let mut request = self.client.post(self.endpoint.clone()).multipart(form);
        if let Some(threshold) = self.threshold {
            request = request.query(&[("threshold", threshold)]);
        }

        debug!("POST {} ({size} bytes)", self.endpoint);
        let start = Instant::now();
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(
            "prediction response {status} in {}ms ({} bytes)",
            start.elapsed().as_millis(),
            body.len()
        );

        let parsed = PredictionResponse::parse(&body)?;
        if !parsed.class_names.is_empty() {
            debug!("service classes: {}", parsed.class_names.join(", "));
        }
        ClassificationResult::try_from(parsed)
    }
}
