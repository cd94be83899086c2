use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::host::{HostEnvironment, WebGlAcquisition};

/// Probe weights applied when the scheduler includes a collector.
pub const WEIGHT_CANVAS: f64 = 15.0;
pub const WEIGHT_WEBGL: f64 = 15.0;
pub const WEIGHT_AUDIO: f64 = 20.0;
pub const WEIGHT_PERFORMANCE: f64 = 5.0;
pub const WEIGHT_PLUGINS: f64 = 5.0;
pub const WEIGHT_MOUSE_TRAJECTORY: f64 = 25.0;
pub const WEIGHT_ANOMALY_SCAN: f64 = 50.0;

/// Collector tags the scheduler can place in a policy.
///
/// Dispatch over these tags is exhaustive; a probe that is not listed in
/// the policy is never invoked.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProbeName {
    Platform,
    Screen,
    Language,
    Plugins,
    Canvas,
    Webgl,
    Audio,
    Performance,
    MouseTrajectory,
    AnomalyScan,
}

impl ProbeName {
    /// Wire name of the collector.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProbeName::Platform => "platform",
            ProbeName::Screen => "screen",
            ProbeName::Language => "language",
            ProbeName::Plugins => "plugins",
            ProbeName::Canvas => "canvas",
            ProbeName::Webgl => "webgl",
            ProbeName::Audio => "audio",
            ProbeName::Performance => "performance",
            ProbeName::MouseTrajectory => "mouse_trajectory",
            ProbeName::AnomalyScan => "anomaly_scan",
        }
    }
}

impl fmt::Display for ProbeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host capabilities detected once at initialization.
///
/// The policy is a pure function of this snapshot (plus any overrides), so
/// equal snapshots always schedule equal policies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub has_screen: bool,
    pub has_navigator: bool,
    pub has_canvas_2d: bool,
    pub has_webgl: bool,
    pub has_offline_audio: bool,
    pub has_performance_entries: bool,
    pub has_device_motion: bool,
    /// iOS-family user-agent heuristic; offline audio is skipped there.
    pub ios_family: bool,
}

impl CapabilitySnapshot {
    /// Interrogates the host once and records what is obtainable.
    pub fn detect(host: &dyn HostEnvironment) -> Self {
        let navigator = host.navigator();
        let ios_family = navigator
            .as_ref()
            .map(|nav| is_ios_family(&nav.user_agent))
            .unwrap_or(false);

        CapabilitySnapshot {
            has_screen: host.screen().is_some(),
            has_navigator: navigator.is_some(),
            has_canvas_2d: host.canvas_2d(1, 1).is_some(),
            has_webgl: matches!(host.webgl(), WebGlAcquisition::Adapter(_)),
            has_offline_audio: host.has_offline_audio(),
            has_performance_entries: host.performance().is_some(),
            has_device_motion: host.supports_device_motion(),
            ios_family,
        }
    }
}

fn is_ios_family(user_agent: &str) -> bool {
    ["iPad", "iPhone", "iPod"]
        .iter()
        .any(|marker| user_agent.contains(marker))
}

/// Caller-supplied toggles layered over snapshot detection for the four
/// capability-gated probes. `Some(false)` removes a probe detection would
/// include, `Some(true)` force-includes one, `None` defers to detection.
/// Weights are unaffected.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub canvas: Option<bool>,
    pub webgl: Option<bool>,
    pub audio: Option<bool>,
    pub performance: Option<bool>,
}

impl PolicyOverrides {
    /// Returns true when no override is set.
    pub fn is_empty(&self) -> bool {
        self.canvas.is_none()
            && self.webgl.is_none()
            && self.audio.is_none()
            && self.performance.is_none()
    }
}

/// Ordered collector list plus per-collector weights, fixed at
/// initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbePolicy {
    collectors: Vec<ProbeName>,
    weights: BTreeMap<ProbeName, f64>,
}

impl ProbePolicy {
    /// Collectors in dispatch order.
    pub fn collectors(&self) -> &[ProbeName] {
        &self.collectors
    }

    /// True when the policy schedules the given collector.
    pub fn includes(&self, name: ProbeName) -> bool {
        self.collectors.contains(&name)
    }

    /// Weight assigned to a collector, when one was.
    pub fn weight(&self, name: ProbeName) -> Option<f64> {
        self.weights.get(&name).copied()
    }
}

/// Builds the probe policy for a capability snapshot.
///
/// `platform`, `screen`, `language`, `plugins`, `mouse_trajectory`, and
/// `anomaly_scan` are always scheduled. `canvas`/`webgl` require an
/// obtainable context, `audio` requires the offline constructor on a
/// non-iOS host, `performance` requires the entries API; each of those can
/// be forced either way through `overrides`.
pub fn schedule_policy(snapshot: &CapabilitySnapshot, overrides: &PolicyOverrides) -> ProbePolicy {
    let mut collectors = vec![
        ProbeName::Platform,
        ProbeName::Screen,
        ProbeName::Language,
        ProbeName::Plugins,
    ];
    let mut weights = BTreeMap::from([(ProbeName::Plugins, WEIGHT_PLUGINS)]);

    let canvas = overrides.canvas.unwrap_or(snapshot.has_canvas_2d);
    if canvas {
        collectors.push(ProbeName::Canvas);
        weights.insert(ProbeName::Canvas, WEIGHT_CANVAS);
    }

    let webgl = overrides.webgl.unwrap_or(snapshot.has_webgl);
    if webgl {
        collectors.push(ProbeName::Webgl);
        weights.insert(ProbeName::Webgl, WEIGHT_WEBGL);
    }

    let audio = overrides
        .audio
        .unwrap_or(snapshot.has_offline_audio && !snapshot.ios_family);
    if audio {
        collectors.push(ProbeName::Audio);
        weights.insert(ProbeName::Audio, WEIGHT_AUDIO);
    }

    let performance = overrides
        .performance
        .unwrap_or(snapshot.has_performance_entries);
    if performance {
        collectors.push(ProbeName::Performance);
        weights.insert(ProbeName::Performance, WEIGHT_PERFORMANCE);
    }

    collectors.push(ProbeName::MouseTrajectory);
    collectors.push(ProbeName::AnomalyScan);
    weights.insert(ProbeName::MouseTrajectory, WEIGHT_MOUSE_TRAJECTORY);
    weights.insert(ProbeName::AnomalyScan, WEIGHT_ANOMALY_SCAN);

    ProbePolicy {
        collectors,
        weights,
    }
}
