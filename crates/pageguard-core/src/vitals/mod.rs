//! Metrics Collector: Core Web Vitals and custom timing windows.

pub mod collector;
pub mod device;
pub mod snapshot;

pub use collector::{ObserverFamily, ObserverHost, PerfEntry, SpanTimer, VitalsCollector};
pub use device::DeviceClass;
pub use snapshot::{Rating, VitalsSnapshot};
