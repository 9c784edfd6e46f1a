//! The per-session metrics snapshot and Core Web Vitals ratings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceClass;

/// Standard web-vitals rating, worst-first ordering derives from the
/// variant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

fn rate(value: f64, good: f64, poor: f64) -> Rating {
    if value <= good {
        Rating::Good
    } else if value <= poor {
        Rating::NeedsImprovement
    } else {
        Rating::Poor
    }
}

/// One point-in-time measurement bundle. One mutable instance per page
/// session, continuously updated by the collector's observers and cloned
/// out on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSnapshot {
    /// First contentful paint, ms.
    pub fcp_ms: Option<f64>,
    /// Largest contentful paint, ms. Overwritten with the latest candidate.
    pub lcp_ms: Option<f64>,
    /// First input delay, ms.
    pub fid_ms: Option<f64>,
    /// Cumulative layout shift: running sum of shifts not preceded by
    /// recent user input. Monotonically non-decreasing.
    pub cls: f64,
    /// Time to first byte, ms.
    pub ttfb_ms: Option<f64>,
    /// Latest finished route-change span, ms.
    pub route_change_ms: Option<f64>,
    /// Latest finished component-render span, ms.
    pub render_ms: Option<f64>,
    pub device: DeviceClass,
    /// Platform connection hint, free text.
    pub network: String,
    /// Chunk name -> load duration in ms, fed from loader success events.
    pub chunk_load_times: HashMap<String, f64>,
    /// Refreshed on every mutation, never on reads.
    pub captured_at: DateTime<Utc>,
}

impl VitalsSnapshot {
    pub fn new(device: DeviceClass, network: String) -> Self {
        Self {
            fcp_ms: None,
            lcp_ms: None,
            fid_ms: None,
            cls: 0.0,
            ttfb_ms: None,
            route_change_ms: None,
            render_ms: None,
            device,
            network,
            chunk_load_times: HashMap::new(),
            captured_at: Utc::now(),
        }
    }

    /// Per-vital ratings for every vital observed so far. CLS is always
    /// present (a zero running sum rates Good).
    pub fn vital_ratings(&self) -> Vec<(&'static str, Rating)> {
        let mut ratings = Vec::new();
        if let Some(fcp) = self.fcp_ms {
            ratings.push(("fcp", rate(fcp, 1800.0, 3000.0)));
        }
        if let Some(lcp) = self.lcp_ms {
            ratings.push(("lcp", rate(lcp, 2500.0, 4000.0)));
        }
        if let Some(fid) = self.fid_ms {
            ratings.push(("fid", rate(fid, 100.0, 300.0)));
        }
        ratings.push(("cls", rate(self.cls, 0.1, 0.25)));
        if let Some(ttfb) = self.ttfb_ms {
            ratings.push(("ttfb", rate(ttfb, 800.0, 1800.0)));
        }
        ratings
    }

    /// Worst individual rating present.
    pub fn overall_rating(&self) -> Rating {
        self.vital_ratings()
            .into_iter()
            .map(|(_, r)| r)
            .max()
            .unwrap_or(Rating::Good)
    }
}
