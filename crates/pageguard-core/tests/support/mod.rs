//! Shared fixtures: a scripted page host and observer host.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use pageguard_core::{
    AssetKind, AttachOutcome, FallbackNotice, ObserverError, ObserverFamily, ObserverHost,
    PageHost, PageInfo, VitalsCollector,
};

/// What the fake host should do with one attach call.
pub enum Scripted {
    /// Resolve immediately with this outcome.
    Outcome(AttachOutcome),
    /// Never resolve; the loader's attempt timeout has to fire.
    Hang,
}

/// A page host scripted per URL with a queue of attach behaviors.
/// Unscripted URLs load immediately.
#[derive(Default)]
pub struct FakeHost {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    // Keeps hung senders alive so the receiver times out instead of erroring.
    hung: Mutex<Vec<oneshot::Sender<AttachOutcome>>>,
    pub attach_log: Mutex<Vec<(String, AssetKind)>>,
    pub preload_log: Mutex<Vec<String>>,
    pub fallbacks: Mutex<Vec<FallbackNotice>>,
    pub reloads: AtomicU32,
    pub refuse_preloads: bool,
    pub page: PageInfo,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            page: PageInfo {
                url: "https://example.com/".to_string(),
                user_agent: "TestAgent/1.0".to_string(),
                screen_width: 1440,
                connection: "4g".to_string(),
            },
            ..Default::default()
        }
    }

    /// Queue attach behaviors for `url`, consumed in order.
    pub fn script(&self, url: &str, behaviors: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(behaviors);
    }

    pub fn error(reason: &str) -> Scripted {
        Scripted::Outcome(AttachOutcome::Error(reason.to_string()))
    }

    pub fn loaded() -> Scripted {
        Scripted::Outcome(AttachOutcome::Loaded)
    }

    pub fn attach_count(&self, url: &str) -> usize {
        self.attach_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl PageHost for FakeHost {
    fn attach(&self, url: &str, kind: AssetKind) -> oneshot::Receiver<AttachOutcome> {
        self.attach_log.lock().unwrap().push((url.to_string(), kind));
        let (tx, rx) = oneshot::channel();
        let behavior = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Scripted::Outcome(AttachOutcome::Loaded));
        match behavior {
            Scripted::Outcome(outcome) => {
                let _ = tx.send(outcome);
            }
            Scripted::Hang => {
                self.hung.lock().unwrap().push(tx);
            }
        }
        rx
    }

    fn preload_hint(&self, url: &str, _kind: AssetKind) -> Result<(), String> {
        self.preload_log.lock().unwrap().push(url.to_string());
        if self.refuse_preloads {
            Err("preload refused".to_string())
        } else {
            Ok(())
        }
    }

    fn show_fallback(&self, notice: &FallbackNotice) {
        self.fallbacks.lock().unwrap().push(notice.clone());
    }

    fn reload_page(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn page(&self) -> PageInfo {
        self.page.clone()
    }
}

/// An observer host that records registrations and exposes the collector
/// clones so tests can dispatch entries like the platform would.
#[derive(Default)]
pub struct FakeObserverHost {
    pub unsupported: Vec<ObserverFamily>,
    pub registered: Mutex<Vec<(ObserverFamily, VitalsCollector)>>,
}

impl ObserverHost for FakeObserverHost {
    fn register(
        &self,
        family: ObserverFamily,
        sink: VitalsCollector,
    ) -> Result<(), ObserverError> {
        if self.unsupported.contains(&family) {
            return Err(ObserverError::Unsupported(family));
        }
        self.registered.lock().unwrap().push((family, sink));
        Ok(())
    }
}
