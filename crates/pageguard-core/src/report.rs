//! Report Sink: ships a metrics snapshot to an observability destination.
//!
//! Development pretty-prints under the context label; production posts
//! JSON to the analytics endpoint, fire-and-forget. Delivery errors are
//! always swallowed (debug log only) -- callers never see them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::ReportError;
use crate::host::PageInfo;
use crate::vitals::{Rating, VitalsSnapshot};

/// Wire format for the analytics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub metrics: VitalsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub user_agent: String,
}

/// HTTP delivery to the analytics endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: Url,
}

impl HttpSink {
    /// Resolve `endpoint` against the page URL's origin when relative.
    pub fn new(endpoint: &str, page_url: &str) -> Result<Self, ReportError> {
        let endpoint = match Url::parse(endpoint) {
            Ok(absolute) => absolute,
            Err(_) => Url::parse(page_url)?.join(endpoint)?,
        };
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub async fn deliver(&self, payload: &ReportPayload) -> Result<(), ReportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;
        // Response body is ignored by contract; only the status matters,
        // and even that only reaches a debug log.
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ReportError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}

/// Where reports go.
#[derive(Debug, Clone)]
pub enum ReportSink {
    /// Structured pretty log, for development.
    Console,
    /// Fire-and-forget JSON POST, for production.
    Http(HttpSink),
    /// In-memory buffer, for diagnostics and tests.
    Capture(Arc<Mutex<Vec<ReportPayload>>>),
}

/// Owns the sink and the page context; builds and dispatches payloads.
/// Never returns an error to callers.
pub struct Reporter {
    sink: ReportSink,
    page: PageInfo,
}

impl Reporter {
    pub fn new(sink: ReportSink, page: PageInfo) -> Self {
        Self { sink, page }
    }

    /// Ship `metrics` tagged with `context`. HTTP delivery runs on the
    /// runtime in the background; without a runtime the report is dropped
    /// with a debug log.
    pub fn report(&self, metrics: VitalsSnapshot, context: Option<String>) {
        let payload = ReportPayload {
            rating: Some(metrics.overall_rating()),
            metrics,
            context,
            timestamp: Utc::now(),
            url: self.page.url.clone(),
            user_agent: self.page.user_agent.clone(),
        };
        match &self.sink {
            ReportSink::Console => log_payload(&payload),
            ReportSink::Capture(buffer) => {
                buffer.lock().expect("capture buffer poisoned").push(payload);
            }
            ReportSink::Http(http) => {
                let http = http.clone();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            if let Err(e) = http.deliver(&payload).await {
                                debug!(error = %e, "analytics report dropped");
                            }
                        });
                    }
                    Err(_) => debug!("no async runtime; analytics report dropped"),
                }
            }
        }
    }
}

fn log_payload(payload: &ReportPayload) {
    let metrics = serde_json::to_string_pretty(&payload.metrics)
        .unwrap_or_else(|_| "<unserializable>".to_string());
    info!(
        context = payload.context.as_deref().unwrap_or("-"),
        rating = ?payload.rating,
        %metrics,
        "performance report"
    );
}
