mod audio;
mod canvas;
mod graphics;
mod system;
mod timing;
mod trajectory;

pub use canvas::CANVAS_PAYLOAD;
pub use trajectory::{
    analyze, TrajectoryAnalysis, TrajectoryCapture, TrajectoryPoint, TrajectoryTracker,
    MAX_SAMPLES, MIN_SAMPLE_GAP_MS,
};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::anomaly::{AnomalyReport, AnomalyScanner};
use crate::host::HostEnvironment;
use crate::policy::{ProbeName, ProbePolicy};

/// Closed set of sentinel faults a probe may resolve to instead of a
/// value.
///
/// The wire strings are contract: the risk scorer pattern-matches them and
/// the server accepts them verbatim inside the fingerprint record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFault {
    Canvas,
    NoWebgl,
    Webgl,
    NoOfflineContext,
    AudioRender,
    AudioContext,
    Platform,
    Screen,
    NoPerfApi,
    NoTiming,
    Perf,
}

impl ProbeFault {
    /// Sentinel string carried on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProbeFault::Canvas => "err_canvas",
            ProbeFault::NoWebgl => "err_no_webgl",
            ProbeFault::Webgl => "err_webgl",
            ProbeFault::NoOfflineContext => "err_no_offline_context",
            ProbeFault::AudioRender => "err_audio_render",
            ProbeFault::AudioContext => "err_audio_context",
            ProbeFault::Platform => "err_platform",
            ProbeFault::Screen => "err_screen",
            ProbeFault::NoPerfApi => "err_no_perf_api",
            ProbeFault::NoTiming => "err_no_timing",
            ProbeFault::Perf => "err_perf",
        }
    }
}

impl std::fmt::Display for ProbeFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-formed value produced by a successful probe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeValue {
    Text(String),
    Graphics(GraphicsAdapter),
    Platform(PlatformProfile),
    Screen(ScreenProfile),
    Navigation(NavigationProfile),
    Trajectory(TrajectoryCapture),
    Anomalies(AnomalyReport),
}

/// Result of one probe dispatch: a value or a sentinel fault. Probes never
/// fail out of the fabric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeOutcome {
    Value(ProbeValue),
    Fault(ProbeFault),
}

impl ProbeOutcome {
    /// True when the probe resolved to a sentinel fault.
    pub const fn is_fault(&self) -> bool {
        matches!(self, ProbeOutcome::Fault(_))
    }
}

/// WebGL vendor/renderer identity.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GraphicsAdapter {
    pub vendor: String,
    pub renderer: String,
}

/// Platform probe value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub platform: String,
    pub plugins: String,
    pub touch_points: u32,
    pub click_count: u64,
}

/// Screen probe value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScreenProfile {
    pub screen: String,
    pub language: String,
}

/// Performance probe value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationProfile {
    pub entry_type: String,
    pub transfer_size: i64,
    pub load_time_ms: f64,
}

/// Outcomes of one gather pass, keyed by collector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeReport {
    pub(crate) outcomes: BTreeMap<ProbeName, ProbeOutcome>,
}

impl ProbeReport {
    /// Outcome recorded for a collector, when it was scheduled.
    pub fn outcome(&self, name: ProbeName) -> Option<&ProbeOutcome> {
        self.outcomes.get(&name)
    }

    /// Platform profile, when that probe ran and succeeded.
    pub fn platform(&self) -> Option<&PlatformProfile> {
        match self.outcome(ProbeName::Platform) {
            Some(ProbeOutcome::Value(ProbeValue::Platform(profile))) => Some(profile),
            _ => None,
        }
    }

    /// Graphics adapter identity, when the WebGL probe succeeded.
    pub fn graphics(&self) -> Option<&GraphicsAdapter> {
        match self.outcome(ProbeName::Webgl) {
            Some(ProbeOutcome::Value(ProbeValue::Graphics(adapter))) => Some(adapter),
            _ => None,
        }
    }

    /// Audio fingerprint text, when the audio probe succeeded.
    pub fn audio_text(&self) -> Option<&str> {
        match self.outcome(ProbeName::Audio) {
            Some(ProbeOutcome::Value(ProbeValue::Text(text))) => Some(text),
            _ => None,
        }
    }

    /// Drained trajectory, when that probe ran.
    pub fn trajectory(&self) -> Option<&TrajectoryCapture> {
        match self.outcome(ProbeName::MouseTrajectory) {
            Some(ProbeOutcome::Value(ProbeValue::Trajectory(capture))) => Some(capture),
            _ => None,
        }
    }

    /// Anomaly report, when the scan ran.
    pub fn anomalies(&self) -> Option<&AnomalyReport> {
        match self.outcome(ProbeName::AnomalyScan) {
            Some(ProbeOutcome::Value(ProbeValue::Anomalies(report))) => Some(report),
            _ => None,
        }
    }

    /// Navigation profile, when the performance probe succeeded.
    pub fn navigation(&self) -> Option<&NavigationProfile> {
        match self.outcome(ProbeName::Performance) {
            Some(ProbeOutcome::Value(ProbeValue::Navigation(profile))) => Some(profile),
            _ => None,
        }
    }

    /// Number of collectors that resolved to a sentinel fault.
    pub fn fault_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|outcome| outcome.is_fault())
            .count()
    }
}

/// Probe fabric: dispatches collectors by tag and gathers policy runs.
///
/// Holds the host boundary and the trajectory tracker; the anomaly scanner
/// is one of its collectors.
pub struct DataLoom {
    host: Arc<dyn HostEnvironment>,
    tracker: Arc<TrajectoryTracker>,
    scanner: AnomalyScanner,
}

impl DataLoom {
    pub fn new(host: Arc<dyn HostEnvironment>, tracker: Arc<TrajectoryTracker>) -> Self {
        let scanner = AnomalyScanner::new(host.clone());
        DataLoom {
            host,
            tracker,
            scanner,
        }
    }

    /// The pointer-state owner events should be wired to.
    pub fn tracker(&self) -> &Arc<TrajectoryTracker> {
        &self.tracker
    }

    /// Runs a single collector. Every arm resolves; faults come back as
    /// sentinel outcomes rather than errors.
    pub async fn dispatch(&self, name: ProbeName) -> ProbeOutcome {
        match name {
            ProbeName::Platform => system::platform(self.host.as_ref(), &self.tracker),
            ProbeName::Screen => system::screen(self.host.as_ref()),
            ProbeName::Language => system::language(self.host.as_ref()),
            ProbeName::Plugins => system::plugins(self.host.as_ref()),
            ProbeName::Canvas => canvas::run(self.host.as_ref()),
            ProbeName::Webgl => graphics::run(self.host.as_ref()),
            ProbeName::Audio => audio::run(self.host.as_ref()).await,
            ProbeName::Performance => timing::run(self.host.as_ref()),
            ProbeName::MouseTrajectory => {
                let points = self.tracker.drain();
                let analysis = trajectory::analyze(&points);
                ProbeOutcome::Value(ProbeValue::Trajectory(TrajectoryCapture {
                    points,
                    analysis,
                }))
            }
            ProbeName::AnomalyScan => {
                ProbeOutcome::Value(ProbeValue::Anomalies(self.scanner.scan().await))
            }
        }
    }

    /// Dispatches every collector in the policy concurrently and waits for
    /// all outcomes.
    pub async fn gather(&self, policy: &ProbePolicy) -> ProbeReport {
        let runs = policy
            .collectors()
            .iter()
            .map(|&name| async move { (name, self.dispatch(name).await) });
        let outcomes: BTreeMap<ProbeName, ProbeOutcome> = join_all(runs).await.into_iter().collect();

        let faults = outcomes.values().filter(|outcome| outcome.is_fault()).count();
        if faults > 0 {
            debug!(faults, "probe gather completed with sentinel outcomes");
        }
        ProbeReport { outcomes }
    }
}
