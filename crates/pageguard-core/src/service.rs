//! The PageGuard service object.
//!
//! Explicitly constructed and dependency-injected: the embedding shell
//! builds one `PageGuard` per page, hands it the host traits, and calls
//! `dispose` on teardown. No module-level singletons; the session-scoped
//! reload counter is an injected store, not an ambient read.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::config::{Environment, GuardConfig};
use crate::events::Event;
use crate::host::{PageHost, SessionStore};
use crate::interceptor::Interceptor;
use crate::loader::{AssetKind, Loader, LoaderStats};
use crate::report::{HttpSink, ReportSink, Reporter};
use crate::vitals::{ObserverHost, SpanTimer, VitalsCollector, VitalsSnapshot};

/// Bundles the loader, interceptor, collector and reporter behind one
/// explicitly constructed value. Requires a running tokio runtime (the
/// event pump and periodic report run as background tasks).
pub struct PageGuard {
    loader: Loader,
    interceptor: Interceptor,
    vitals: VitalsCollector,
    reporter: Arc<Reporter>,
    event_tap: Arc<Mutex<Option<UnboundedSender<Event>>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PageGuard {
    /// Build with the sink the configured environment implies: console in
    /// development, the analytics endpoint in production.
    pub fn new(
        config: GuardConfig,
        host: Arc<dyn PageHost>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let sink = match config.report.environment {
            Environment::Development => ReportSink::Console,
            Environment::Production => {
                match HttpSink::new(&config.report.endpoint, &host.page().url) {
                    Ok(http) => ReportSink::Http(http),
                    Err(e) => {
                        // Reports must never fail the page; degrade to console.
                        warn!(error = %e, "analytics endpoint unusable, logging instead");
                        ReportSink::Console
                    }
                }
            }
        };
        Self::with_sink(config, host, store, sink)
    }

    /// Build with an explicit report sink.
    pub fn with_sink(
        config: GuardConfig,
        host: Arc<dyn PageHost>,
        store: Arc<dyn SessionStore>,
        sink: ReportSink,
    ) -> Self {
        let page = host.page();
        let reporter = Arc::new(Reporter::new(sink, page.clone()));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let loader = Loader::new(config.loader, host.clone(), events_tx.clone());
        let interceptor = Interceptor::new(loader.clone(), host, store, events_tx);
        let vitals = VitalsCollector::new(&page, Some(reporter.clone()));

        let event_tap: Arc<Mutex<Option<UnboundedSender<Event>>>> =
            Arc::new(Mutex::new(None));
        let mut tasks = vec![Self::spawn_event_pump(
            events_rx,
            vitals.clone(),
            event_tap.clone(),
        )];
        if config.report.report_interval_secs > 0 {
            tasks.push(Self::spawn_periodic_report(
                Duration::from_secs(config.report.report_interval_secs),
                vitals.clone(),
                reporter.clone(),
            ));
        }

        Self {
            loader,
            interceptor,
            vitals,
            reporter,
            event_tap,
            tasks: Mutex::new(tasks),
        }
    }

    /// Issue preload hints for the known-critical asset list. Best effort;
    /// never fails.
    pub fn preload_critical_assets(&self, assets: &[(&str, AssetKind)]) {
        self.loader.preload_critical_assets(assets);
    }

    /// Shallow copy of the current metrics snapshot.
    pub fn metrics(&self) -> VitalsSnapshot {
        self.vitals.snapshot()
    }

    /// Ship the current snapshot, tagged with `context`.
    pub fn report_metrics(&self, context: Option<&str>) {
        self.reporter
            .report(self.vitals.snapshot(), context.map(str::to_string));
    }

    pub fn measure_route_change(&self, label: &str) -> SpanTimer {
        self.vitals.measure_route_change(label)
    }

    pub fn measure_component_render(&self, label: &str) -> SpanTimer {
        self.vitals.measure_component_render(label)
    }

    /// Loader diagnostics: loaded/failed counts and the failed URLs.
    pub fn stats(&self) -> LoaderStats {
        self.loader.stats()
    }

    /// Register the platform performance observers on the collector.
    pub fn install_observers(&self, host: &dyn ObserverHost) {
        self.vitals.install(host);
    }

    /// Subscribe to the loader/interceptor event stream. Diagnostics only;
    /// a later call replaces the previous subscriber.
    pub fn subscribe(&self) -> UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.event_tap.lock().expect("event tap poisoned") = Some(tx);
        rx
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn vitals(&self) -> &VitalsCollector {
        &self.vitals
    }

    /// Tear down the background tasks. Idempotent.
    pub fn dispose(&self) {
        for task in self.tasks.lock().expect("task list poisoned").drain(..) {
            task.abort();
        }
    }

    fn spawn_event_pump(
        mut events: UnboundedReceiver<Event>,
        vitals: VitalsCollector,
        tap: Arc<Mutex<Option<UnboundedSender<Event>>>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Event::AssetLoaded {
                    ref url,
                    duration_ms,
                    ..
                } = event
                {
                    vitals.record_chunk(chunk_name(url), duration_ms as f64);
                }
                if let Some(tap) = tap.lock().expect("event tap poisoned").as_ref() {
                    let _ = tap.send(event);
                }
            }
        })
    }

    fn spawn_periodic_report(
        period: Duration,
        vitals: VitalsCollector,
        reporter: Arc<Reporter>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                sleep(period).await;
                reporter.report(vitals.snapshot(), Some("periodic".to_string()));
            }
        })
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Chunk name for the timing map: last path segment, query and fragment
/// stripped.
fn chunk_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_name_is_last_segment_without_query() {
        assert_eq!(chunk_name("/assets/app-1a2b.js?v=3"), "app-1a2b.js");
        assert_eq!(chunk_name("https://cdn.example.com/x/vendor.js#frag"), "vendor.js");
        assert_eq!(chunk_name("style.css"), "style.css");
    }
}
