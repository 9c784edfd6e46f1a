//! Asset loading engine.
//!
//! Loads a single external resource reliably: one attempt with a bounded
//! wait, then linear-backoff retries up to the configured failure cap, then
//! a terminal `Failed` state and -- for critical assets -- the user-visible
//! fallback notice. Per-URL sequences are strictly sequential; distinct
//! URLs interleave freely on the runtime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::events::Event;
use crate::host::{AttachOutcome, PageHost};

use super::fallback::FallbackNotice;
use super::record::{AssetKind, AssetRecord};

/// Diagnostic counts over the record map, for `getStats`-style display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    pub loaded: usize,
    pub failed: usize,
    pub failed_assets: Vec<String>,
}

/// Linear backoff: the retry that follows failure `k` waits `k * base`.
pub(crate) fn backoff_delay(base_ms: u64, failures: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(failures as u64))
}

enum FailureDecision {
    Retry(u32),
    Exhausted(u32),
}

/// The loader core. Cheap to clone; all clones share one record map.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    config: LoaderConfig,
    host: Arc<dyn PageHost>,
    records: Mutex<HashMap<String, AssetRecord>>,
    events: UnboundedSender<Event>,
}

impl Loader {
    pub fn new(
        config: LoaderConfig,
        host: Arc<dyn PageHost>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                config,
                host,
                records: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Load `url`, driving the record to a terminal state: retries on
    /// failure, fallback on exhaustion. Never returns an error; failures
    /// are contained here and visible via [`Loader::stats`].
    pub async fn load(&self, url: &str, kind: AssetKind) {
        let started = Instant::now();
        match self.load_asset(url, kind).await {
            Ok(()) => self.settle_loaded(url, kind, started.elapsed()),
            Err(e) => {
                warn!(url, error = %e, "asset load attempt failed");
                self.handle_load_error(url, kind).await;
            }
        }
    }

    /// One attempt: hand the tag to the host and wait up to the configured
    /// timeout for its load/error signal. Does not touch the record map.
    pub async fn load_asset(&self, url: &str, kind: AssetKind) -> Result<(), LoaderError> {
        let rx = self.inner.host.attach(url, kind);
        self.emit(Event::AssetAttached {
            url: url.to_string(),
            kind,
            at: Utc::now(),
        });

        let wait = Duration::from_millis(self.inner.config.load_timeout_ms);
        match timeout(wait, rx).await {
            Err(_) => Err(LoaderError::Timeout {
                url: url.to_string(),
                timeout_ms: self.inner.config.load_timeout_ms,
            }),
            // The host dropped its end without signalling; treat like a
            // reported load failure.
            Ok(Err(_)) => Err(LoaderError::Load {
                url: url.to_string(),
                reason: "load signal dropped".to_string(),
            }),
            Ok(Ok(AttachOutcome::Loaded)) => Ok(()),
            Ok(Ok(AttachOutcome::Error(reason))) => Err(LoaderError::Load {
                url: url.to_string(),
                reason,
            }),
        }
    }

    /// Record a failure for `url` and drive it to a terminal state:
    /// while failures stay below the cap, wait out the linear backoff and
    /// re-attempt; at the cap, mark `Failed` and run the fallback path for
    /// critical assets. Entry point for both the internal retry path and
    /// the global failure interceptor.
    pub async fn handle_load_error(&self, url: &str, kind: AssetKind) {
        loop {
            let decision = {
                let mut records = self.inner.records.lock().expect("record map poisoned");
                let record = records
                    .entry(url.to_string())
                    .or_insert_with(|| AssetRecord::new(url, kind));
                if record.is_terminal() {
                    // Exhaustion is terminal per URL for the page session.
                    return;
                }
                let failures = record.record_failure(self.inner.config.max_retries);
                if failures >= self.inner.config.max_retries {
                    record.mark_failed();
                    FailureDecision::Exhausted(failures)
                } else {
                    FailureDecision::Retry(failures)
                }
            };

            match decision {
                FailureDecision::Exhausted(failures) => {
                    warn!(url, failures, "asset load retries exhausted");
                    self.emit(Event::AssetFailed {
                        url: url.to_string(),
                        kind,
                        attempt_count: failures,
                        at: Utc::now(),
                    });
                    if self.inner.config.is_critical(url) {
                        self.show_fallback(url);
                    }
                    return;
                }
                FailureDecision::Retry(failures) => {
                    let delay = backoff_delay(self.inner.config.retry_delay_ms, failures);
                    self.emit(Event::AssetRetryScheduled {
                        url: url.to_string(),
                        kind,
                        attempt: failures,
                        delay_ms: delay.as_millis() as u64,
                        at: Utc::now(),
                    });
                    tokio::time::sleep(delay).await;

                    let started = Instant::now();
                    match self.load_asset(url, kind).await {
                        Ok(()) => {
                            self.settle_loaded(url, kind, started.elapsed());
                            return;
                        }
                        Err(e) => {
                            debug!(url, attempt = failures, error = %e, "retry failed");
                        }
                    }
                }
            }
        }
    }

    /// Issue preload hints for known-critical assets. Best effort only:
    /// refusals are logged, never retried, never surfaced.
    pub fn preload_critical_assets(&self, assets: &[(&str, AssetKind)]) {
        for &(url, kind) in assets {
            {
                let mut records = self.inner.records.lock().expect("record map poisoned");
                records
                    .entry(url.to_string())
                    .or_insert_with(|| AssetRecord::new(url, kind));
            }
            if let Err(reason) = self.inner.host.preload_hint(url, kind) {
                warn!(url, reason, "preload hint refused");
            }
        }
    }

    /// Snapshot of the current record for `url`, if tracked.
    pub fn record(&self, url: &str) -> Option<AssetRecord> {
        self.inner
            .records
            .lock()
            .expect("record map poisoned")
            .get(url)
            .cloned()
    }

    /// Diagnostic counts: loaded, failed, and which URLs failed.
    pub fn stats(&self) -> LoaderStats {
        let records = self.inner.records.lock().expect("record map poisoned");
        let loaded = records
            .values()
            .filter(|r| r.state == super::record::AssetState::Loaded)
            .count();
        let mut failed_assets: Vec<String> = records
            .values()
            .filter(|r| r.state == super::record::AssetState::Failed)
            .map(|r| r.url.clone())
            .collect();
        failed_assets.sort();
        LoaderStats {
            loaded,
            failed: failed_assets.len(),
            failed_assets,
        }
    }

    fn settle_loaded(&self, url: &str, kind: AssetKind, duration: Duration) {
        let attempt_count = {
            let mut records = self.inner.records.lock().expect("record map poisoned");
            let record = records
                .entry(url.to_string())
                .or_insert_with(|| AssetRecord::new(url, kind));
            if record.is_terminal() {
                return;
            }
            record.mark_loaded();
            record.attempt_count
        };
        self.emit(Event::AssetLoaded {
            url: url.to_string(),
            kind,
            attempt_count,
            duration_ms: duration.as_millis() as u64,
            at: Utc::now(),
        });
    }

    fn show_fallback(&self, url: &str) {
        let notice = FallbackNotice::for_asset(url);
        self.inner.host.show_fallback(&notice);
        self.emit(Event::FallbackShown {
            url: url.to_string(),
            at: Utc::now(),
        });
    }

    fn emit(&self, event: Event) {
        // Receiver may be gone; events are diagnostics, not control flow.
        let _ = self.inner.events.send(event);
    }
}
