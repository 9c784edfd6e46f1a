//! Metrics collector: passive observation of platform performance signals.
//!
//! The collector maintains the single mutable [`VitalsSnapshot`] for the
//! session. The shell registers one platform observer per family and feeds
//! entries through [`VitalsCollector::ingest`]; registration failures are
//! logged and skipped, never fatal. All mutation is serialized by the
//! snapshot lock, held only for non-await sections.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::time::Instant;
use tracing::warn;

use crate::error::ObserverError;
use crate::host::PageInfo;
use crate::report::Reporter;

use super::device::DeviceClass;
use super::snapshot::VitalsSnapshot;

/// The observer families the collector subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverFamily {
    Paint,
    LargestContentfulPaint,
    FirstInput,
    LayoutShift,
    Navigation,
}

impl ObserverFamily {
    pub const ALL: [ObserverFamily; 5] = [
        ObserverFamily::Paint,
        ObserverFamily::LargestContentfulPaint,
        ObserverFamily::FirstInput,
        ObserverFamily::LayoutShift,
        ObserverFamily::Navigation,
    ];
}

impl fmt::Display for ObserverFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObserverFamily::Paint => "paint",
            ObserverFamily::LargestContentfulPaint => "largest-contentful-paint",
            ObserverFamily::FirstInput => "first-input",
            ObserverFamily::LayoutShift => "layout-shift",
            ObserverFamily::Navigation => "navigation",
        };
        f.write_str(name)
    }
}

/// One performance entry as dispatched by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PerfEntry {
    /// Paint timing; only `first-contentful-paint` updates the snapshot.
    Paint { name: String, start_ms: f64 },
    LargestContentfulPaint { start_ms: f64 },
    FirstInput { delay_ms: f64 },
    LayoutShift { value: f64, had_recent_input: bool },
    Navigation { ttfb_ms: f64 },
}

/// Observer registration seam the shell implements. The host keeps the
/// collector clone and calls [`VitalsCollector::ingest`] from each
/// platform dispatch.
pub trait ObserverHost {
    fn register(
        &self,
        family: ObserverFamily,
        sink: VitalsCollector,
    ) -> Result<(), ObserverError>;
}

/// Metrics collector. Cheap to clone; all clones share the session
/// snapshot.
#[derive(Clone)]
pub struct VitalsCollector {
    inner: Arc<CollectorInner>,
}

struct CollectorInner {
    snapshot: Mutex<VitalsSnapshot>,
    reporter: Option<Arc<Reporter>>,
}

impl VitalsCollector {
    /// Build the collector; device and network classes are computed once,
    /// here. Pass a reporter to have finished route-change spans reported.
    pub fn new(page: &PageInfo, reporter: Option<Arc<Reporter>>) -> Self {
        let device = DeviceClass::classify(&page.user_agent, page.screen_width);
        Self {
            inner: Arc::new(CollectorInner {
                snapshot: Mutex::new(VitalsSnapshot::new(device, page.connection.clone())),
                reporter,
            }),
        }
    }

    /// Register one observer per family. An unsupported family is logged
    /// as a warning and its metric stays absent for the session.
    pub fn install(&self, host: &dyn ObserverHost) {
        for family in ObserverFamily::ALL {
            if let Err(e) = host.register(family, self.clone()) {
                warn!(family = %family, error = %e, "performance observer unavailable");
            }
        }
    }

    /// Fold one platform entry into the snapshot. Layout shifts
    /// accumulate (skipping input-driven ones); every other family
    /// overwrites with the latest value.
    pub fn ingest(&self, entry: PerfEntry) {
        let mut snapshot = self.lock();
        match entry {
            PerfEntry::Paint { name, start_ms } => {
                if name == "first-contentful-paint" {
                    snapshot.fcp_ms = Some(start_ms);
                } else {
                    return;
                }
            }
            PerfEntry::LargestContentfulPaint { start_ms } => {
                snapshot.lcp_ms = Some(start_ms);
            }
            PerfEntry::FirstInput { delay_ms } => {
                snapshot.fid_ms = Some(delay_ms);
            }
            PerfEntry::LayoutShift {
                value,
                had_recent_input,
            } => {
                if had_recent_input {
                    return;
                }
                snapshot.cls += value;
            }
            PerfEntry::Navigation { ttfb_ms } => {
                snapshot.ttfb_ms = Some(ttfb_ms);
            }
        }
        snapshot.captured_at = Utc::now();
    }

    /// Record a chunk load duration learned from a loader success event.
    pub fn record_chunk(&self, name: &str, duration_ms: f64) {
        let mut snapshot = self.lock();
        snapshot.chunk_load_times.insert(name.to_string(), duration_ms);
        snapshot.captured_at = Utc::now();
    }

    /// Shallow copy of the current snapshot; no recomputation, idempotent.
    pub fn snapshot(&self) -> VitalsSnapshot {
        self.lock().clone()
    }

    /// Start timing a route change. Finishing the returned timer writes
    /// the duration and triggers a report with context
    /// `"Route change to {label}"`.
    pub fn measure_route_change(&self, label: &str) -> SpanTimer {
        SpanTimer {
            collector: self.clone(),
            kind: SpanKind::RouteChange,
            label: label.to_string(),
            start: Instant::now(),
        }
    }

    /// Start timing a component render. Finishing writes the duration;
    /// no report is triggered.
    pub fn measure_component_render(&self, label: &str) -> SpanTimer {
        SpanTimer {
            collector: self.clone(),
            kind: SpanKind::ComponentRender,
            label: label.to_string(),
            start: Instant::now(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VitalsSnapshot> {
        self.inner.snapshot.lock().expect("snapshot poisoned")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    RouteChange,
    ComponentRender,
}

/// Completion handle for a custom timing window. Captures elapsed
/// wall-clock time between creation and [`SpanTimer::finish`].
pub struct SpanTimer {
    collector: VitalsCollector,
    kind: SpanKind,
    label: String,
    start: Instant,
}

impl SpanTimer {
    /// Write the elapsed duration into the snapshot and return it in ms.
    pub fn finish(self) -> f64 {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        {
            let mut snapshot = self.collector.lock();
            match self.kind {
                SpanKind::RouteChange => snapshot.route_change_ms = Some(elapsed_ms),
                SpanKind::ComponentRender => snapshot.render_ms = Some(elapsed_ms),
            }
            snapshot.captured_at = Utc::now();
        }
        if self.kind == SpanKind::RouteChange {
            if let Some(reporter) = &self.collector.inner.reporter {
                reporter.report(
                    self.collector.snapshot(),
                    Some(format!("Route change to {}", self.label)),
                );
            }
        }
        elapsed_ms
    }
}
