use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::clock::Clock;

/// Maximum number of samples the trajectory buffer holds.
pub const MAX_SAMPLES: usize = 50;

/// Minimum gap between accepted pointer samples.
pub const MIN_SAMPLE_GAP_MS: u64 = 100;

const MIN_POINTS_FOR_ANALYSIS: usize = 10;
const REGULAR_INTERVAL_SIGMA_MS: f64 = 10.0;
const SLOPE_CONSISTENCY_EPSILON: f64 = 0.1;
const STRAIGHT_LINE_RATIO: f64 = 0.8;

/// One accepted pointer sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
    pub t: u64,
}

/// Shape analysis over one drained trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryAnalysis {
    pub regularity_score: f64,
    pub is_straight_line: bool,
}

/// A drained trajectory plus its analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCapture {
    pub points: Vec<TrajectoryPoint>,
    pub analysis: TrajectoryAnalysis,
}

#[derive(Default)]
struct MouseState {
    x: f64,
    y: f64,
    t: u64,
    click_count: u64,
    buffer: Vec<TrajectoryPoint>,
}

/// Sole owner of the pointer state.
///
/// Event wiring holds a reference to this tracker and feeds it through
/// `record_move`/`record_click`; the trajectory probe drains it. Samples
/// are throttled to one per [`MIN_SAMPLE_GAP_MS`] and the buffer is capped
/// at [`MAX_SAMPLES`]; the click counter only ever grows.
pub struct TrajectoryTracker {
    clock: Arc<dyn Clock>,
    state: Mutex<MouseState>,
}

impl TrajectoryTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        TrajectoryTracker {
            clock,
            state: Mutex::new(MouseState::default()),
        }
    }

    /// Records a pointer move. Ignored when the throttle window since the
    /// last accepted sample has not elapsed; buffered only below the cap.
    pub fn record_move(&self, x: f64, y: f64) {
        let now = self.clock.now_ms();
        if let Ok(mut state) = self.state.lock() {
            if now.saturating_sub(state.t) < MIN_SAMPLE_GAP_MS && state.t != 0 {
                return;
            }
            state.x = x;
            state.y = y;
            state.t = now;
            if state.buffer.len() < MAX_SAMPLES {
                state.buffer.push(TrajectoryPoint { x, y, t: now });
            }
        }
    }

    /// Records a click.
    pub fn record_click(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.click_count += 1;
        }
    }

    /// Clicks recorded since construction.
    pub fn click_count(&self) -> u64 {
        self.state
            .lock()
            .map(|state| state.click_count)
            .unwrap_or(0)
    }

    /// Takes the buffered samples, leaving the buffer empty. Snapshot and
    /// clear happen under one lock acquisition.
    pub fn drain(&self) -> Vec<TrajectoryPoint> {
        self.state
            .lock()
            .map(|mut state| std::mem::take(&mut state.buffer))
            .unwrap_or_default()
    }
}

/// Scores how machine-like a trajectory looks.
///
/// Near-constant sampling intervals contribute 0.8; a consistent slope
/// across at least 80% of adjacent segment pairs classifies the path as a
/// straight line and contributes 1.0. The score is clamped to [0, 1].
/// Trajectories under ten points are not analyzed.
pub fn analyze(points: &[TrajectoryPoint]) -> TrajectoryAnalysis {
    if points.len() < MIN_POINTS_FOR_ANALYSIS {
        return TrajectoryAnalysis {
            regularity_score: 0.0,
            is_straight_line: false,
        };
    }

    let intervals: Vec<f64> = points
        .windows(2)
        .map(|pair| pair[1].t.saturating_sub(pair[0].t) as f64)
        .collect();
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let variance = intervals
        .iter()
        .map(|interval| (interval - mean).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let sigma = variance.sqrt();

    let mut score: f64 = 0.0;
    if sigma < REGULAR_INTERVAL_SIGMA_MS {
        score += 0.8;
    }

    let mut slopes = Vec::with_capacity(points.len() - 1);
    for pair in points.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        if dx == 0.0 && dy == 0.0 {
            continue;
        }
        slopes.push(if dx == 0.0 { f64::INFINITY } else { dy / dx });
    }

    let mut is_straight_line = false;
    if slopes.len() >= 2 {
        let consistent = slopes
            .windows(2)
            .filter(|pair| (pair[1] - pair[0]).abs() < SLOPE_CONSISTENCY_EPSILON)
            .count();
        if consistent as f64 / (slopes.len() - 1) as f64 > STRAIGHT_LINE_RATIO {
            is_straight_line = true;
            score += 1.0;
        }
    }

    TrajectoryAnalysis {
        regularity_score: score.clamp(0.0, 1.0),
        is_straight_line,
    }
}
