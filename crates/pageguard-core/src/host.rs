//! Traits the embedding page implements.
//!
//! The engine never touches the platform directly: attaching tags, preload
//! hints, the fallback panel, page reloads and session storage all go
//! through these seams. A wasm shell implements them over the DOM; tests
//! implement them with fakes.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::loader::{AssetKind, FallbackNotice};

/// Outcome of one attachment, delivered by the host when it observes the
/// element's load or error signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    Loaded,
    Error(String),
}

/// Static facts about the page, read once at service construction.
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    /// Full page URL, also the base for resolving a relative endpoint.
    pub url: String,
    pub user_agent: String,
    pub screen_width: u32,
    /// Platform connection hint (e.g. "4g", "slow-2g"); free text.
    pub connection: String,
}

/// What the loader and interceptor need from the embedding page.
pub trait PageHost: Send + Sync {
    /// Attach the resource to the document. The returned receiver resolves
    /// with the element's load/error outcome; a dropped sender counts as a
    /// load error. Each receiver is single-use, so a signal arriving after
    /// the loader gave up on the attempt is ignored implicitly.
    fn attach(&self, url: &str, kind: AssetKind) -> oneshot::Receiver<AttachOutcome>;

    /// Issue a non-blocking preload hint. Best effort; the loader logs a
    /// refusal and moves on.
    fn preload_hint(&self, url: &str, kind: AssetKind) -> Result<(), String>;

    /// Display the critical-asset fallback notice.
    fn show_fallback(&self, notice: &FallbackNotice);

    /// Reload the whole page. Last-resort recovery for module-load
    /// rejections; call sites cap the frequency.
    fn reload_page(&self);

    /// Static page facts for device/network classification and report
    /// tagging.
    fn page(&self) -> PageInfo;
}

/// Session-scoped key/value storage (the browser's sessionStorage in a
/// real shell). Values live until the session's storage is cleared.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`SessionStore`]. The default for embedders without a
/// session-scoped store, and the fixture for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("session store poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("session store poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().expect("session store poisoned").remove(key);
    }
}
