//! End-to-end wiring through the PageGuard service object.

mod support;

use std::sync::{Arc, Mutex};

use tokio::time::Duration;

use pageguard_core::{
    AssetKind, Event, GuardConfig, MemorySessionStore, PageGuard, PerfEntry, ReportSink,
    VitalsCollector,
};
use support::{FakeHost, FakeObserverHost};

fn guard_with_capture(
    host: Arc<FakeHost>,
    config: GuardConfig,
) -> (PageGuard, Arc<Mutex<Vec<pageguard_core::ReportPayload>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let guard = PageGuard::with_sink(
        config,
        host,
        Arc::new(MemorySessionStore::new()),
        ReportSink::Capture(buffer.clone()),
    );
    (guard, buffer)
}

#[tokio::test(start_paused = true)]
async fn successful_loads_feed_chunk_timings() {
    let host = Arc::new(FakeHost::new());
    host.script("/assets/app-1a2b.js?v=7", vec![FakeHost::loaded()]);
    let (guard, _) = guard_with_capture(host, GuardConfig::default());

    guard
        .loader()
        .load("/assets/app-1a2b.js?v=7", AssetKind::Script)
        .await;
    // Let the event pump drain.
    tokio::time::sleep(Duration::from_millis(1)).await;

    let metrics = guard.metrics();
    assert!(metrics.chunk_load_times.contains_key("app-1a2b.js"));
    guard.dispose();
}

#[tokio::test(start_paused = true)]
async fn periodic_reports_fire_until_disposed() {
    let host = Arc::new(FakeHost::new());
    let config = GuardConfig::default(); // 30s interval
    let (guard, buffer) = guard_with_capture(host, config);

    tokio::time::sleep(Duration::from_secs(95)).await;
    let delivered = buffer.lock().unwrap().len();
    assert_eq!(delivered, 3);
    assert!(buffer
        .lock()
        .unwrap()
        .iter()
        .all(|p| p.context.as_deref() == Some("periodic")));

    guard.dispose();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(buffer.lock().unwrap().len(), delivered);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_disables_periodic_reporting() {
    let host = Arc::new(FakeHost::new());
    let mut config = GuardConfig::default();
    config.report.report_interval_secs = 0;
    let (guard, buffer) = guard_with_capture(host, config);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(buffer.lock().unwrap().is_empty());
    guard.dispose();
}

#[tokio::test(start_paused = true)]
async fn report_metrics_tags_with_the_given_context() {
    let host = Arc::new(FakeHost::new());
    let mut config = GuardConfig::default();
    config.report.report_interval_secs = 0;
    let (guard, buffer) = guard_with_capture(host, config);

    guard.report_metrics(Some("page-hidden"));

    let captured = buffer.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].context.as_deref(), Some("page-hidden"));
    assert_eq!(captured[0].url, "https://example.com/");
    assert_eq!(captured[0].user_agent, "TestAgent/1.0");
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_loader_events() {
    let host = Arc::new(FakeHost::new());
    host.script("/assets/app.js", vec![FakeHost::loaded()]);
    let (guard, _) = guard_with_capture(host, GuardConfig::default());

    let mut events = guard.subscribe();
    guard.loader().load("/assets/app.js", AssetKind::Script).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let first = events.try_recv().unwrap();
    assert!(matches!(first, Event::AssetAttached { .. }));
    let second = events.try_recv().unwrap();
    assert!(matches!(second, Event::AssetLoaded { attempt_count: 0, .. }));
    guard.dispose();
}

#[tokio::test(start_paused = true)]
async fn observer_registration_tolerates_unsupported_families() {
    let host = Arc::new(FakeHost::new());
    let (guard, _) = guard_with_capture(host, GuardConfig::default());

    let observers = FakeObserverHost {
        unsupported: vec![pageguard_core::ObserverFamily::LayoutShift],
        ..FakeObserverHost::default()
    };
    guard.install_observers(&observers);

    let registered = observers.registered.lock().unwrap();
    assert_eq!(registered.len(), 4);
    assert!(registered
        .iter()
        .all(|(f, _)| *f != pageguard_core::ObserverFamily::LayoutShift));

    // Registered families still flow into the snapshot.
    let (_, sink): &(pageguard_core::ObserverFamily, VitalsCollector) = &registered[0];
    sink.ingest(PerfEntry::Navigation { ttfb_ms: 180.0 });
    assert_eq!(guard.metrics().ttfb_ms, Some(180.0));
    guard.dispose();
}

#[tokio::test(start_paused = true)]
async fn device_class_comes_from_the_page_info() {
    let mut host = FakeHost::new();
    host.page.user_agent =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148".to_string();
    host.page.screen_width = 390;
    let (guard, _) = guard_with_capture(Arc::new(host), GuardConfig::default());

    let metrics = guard.metrics();
    assert_eq!(metrics.device, pageguard_core::DeviceClass::Mobile);
    assert_eq!(metrics.network, "4g");
    guard.dispose();
}
