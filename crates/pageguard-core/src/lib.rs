//! # PageGuard Core Library
//!
//! Resilient asset loading and web-vitals collection for browser pages,
//! shipped as a host-agnostic engine. The embedding shell (a wasm front
//! end, or a test harness) implements the platform seams; everything above
//! them -- retry policy, failure interception, metric accumulation,
//! reporting -- lives here.
//!
//! ## Architecture
//!
//! - **Loader Core**: bounded-retry asset loading with linear backoff and
//!   a terminal, user-visible fallback for critical assets
//! - **Failure Interceptor**: routes global resource errors into the
//!   loader and recovers module-load rejections with session-capped page
//!   reloads
//! - **Vitals Collector**: folds platform performance entries into one
//!   mutable per-session snapshot, plus custom timing windows
//! - **Report Sink**: console in development, fire-and-forget JSON POST in
//!   production
//!
//! ## Key Components
//!
//! - [`PageGuard`]: dependency-injected service bundling the subsystems
//! - [`Loader`]: per-URL retry state machine
//! - [`VitalsCollector`]: Core Web Vitals snapshot
//! - [`PageHost`] / [`ObserverHost`] / [`SessionStore`]: the seams a shell
//!   implements

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod interceptor;
pub mod loader;
pub mod report;
pub mod service;
pub mod vitals;

pub use config::{Environment, GuardConfig, LoaderConfig, ReportConfig};
pub use error::{ConfigError, CoreError, LoaderError, ObserverError, ReportError, Result};
pub use events::Event;
pub use host::{AttachOutcome, MemorySessionStore, PageHost, PageInfo, SessionStore};
pub use interceptor::{Interceptor, RejectionOutcome};
pub use loader::{AssetKind, AssetRecord, AssetState, FallbackNotice, Loader, LoaderStats};
pub use report::{HttpSink, ReportPayload, ReportSink, Reporter};
pub use service::PageGuard;
pub use vitals::{
    DeviceClass, ObserverFamily, ObserverHost, PerfEntry, Rating, SpanTimer, VitalsCollector,
    VitalsSnapshot,
};
