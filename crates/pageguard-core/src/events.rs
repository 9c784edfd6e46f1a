//! Loader and interceptor events.
//!
//! Every asset state change produces an [`Event`] on the service's channel.
//! The service consumes them to feed chunk timings into the vitals
//! snapshot; embedders may subscribe for diagnostics. Events are never
//! control flow -- a dropped receiver is silently ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::loader::AssetKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A resource tag was handed to the host for attachment.
    AssetAttached {
        url: String,
        kind: AssetKind,
        at: DateTime<Utc>,
    },
    /// A load attempt succeeded; the record is terminally `Loaded`.
    AssetLoaded {
        url: String,
        kind: AssetKind,
        /// Failures observed before the successful attempt.
        attempt_count: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// A failure was recorded and a retry is waiting out its backoff.
    AssetRetryScheduled {
        url: String,
        kind: AssetKind,
        attempt: u32,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    /// Retries exhausted; the record is terminally `Failed`.
    AssetFailed {
        url: String,
        kind: AssetKind,
        attempt_count: u32,
        at: DateTime<Utc>,
    },
    /// The critical-asset fallback notice was handed to the host.
    FallbackShown {
        url: String,
        at: DateTime<Utc>,
    },
    /// The interceptor asked the host for a full page reload.
    PageReloadRequested {
        /// 1-based reload attempt within this session.
        attempt: u32,
        /// Module path extracted from the rejection stack, when found.
        module: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::AssetAttached { at, .. }
            | Event::AssetLoaded { at, .. }
            | Event::AssetRetryScheduled { at, .. }
            | Event::AssetFailed { at, .. }
            | Event::FallbackShown { at, .. }
            | Event::PageReloadRequested { at, .. } => *at,
        }
    }
}
