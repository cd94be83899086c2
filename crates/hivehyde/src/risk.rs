use crate::anomaly::PermissionVerdict;
use crate::policy::{ProbeName, ProbePolicy, WEIGHT_ANOMALY_SCAN, WEIGHT_MOUSE_TRAJECTORY};
use crate::probes::ProbeReport;

const PERMISSIONS_DENIED_POINTS: f64 = 5.0;
const EMPTY_TRAJECTORY_POINTS: f64 = 3.0;
const SPARSE_TRAJECTORY_POINTS: f64 = 2.0;
const SPARSE_TRAJECTORY_THRESHOLD: usize = 5;
const ZERO_CLICK_POINTS: f64 = 1.0;
const ACTIVE_USER_BONUS: f64 = 5.0;
const ACTIVE_USER_CLICKS: u64 = 5;
const ACTIVE_USER_TRAJECTORY: usize = 20;
const CACHED_NAVIGATION_BONUS: f64 = 5.0;
const FAULT_COUNT_THRESHOLD: usize = 2;

/// Folds one gather pass into the 0-100 risk score.
///
/// Anomaly signals dominate through the `anomaly_scan` weight; trajectory
/// shape contributes through the `mouse_trajectory` weight, softened on
/// touch devices where straight lines arise naturally; real-user evidence
/// (clicks with a long trajectory, a cached navigation) subtracts; a pile
/// of sentinel faults adds. The result is rounded and clamped.
pub(crate) fn score(report: &ProbeReport, policy: &ProbePolicy) -> u8 {
    let mut score = 0.0f64;

    let anomaly_weight = policy
        .weight(ProbeName::AnomalyScan)
        .unwrap_or(WEIGHT_ANOMALY_SCAN);
    if let Some(scan) = report.anomalies() {
        if scan.webdriver {
            score += anomaly_weight;
        }
        if scan.webdriver_tampered {
            score += 1.2 * anomaly_weight;
        }
        if scan.tostring_tampered {
            score += 1.1 * anomaly_weight;
        }
        if scan.stack_anomaly.is_anomalous() {
            score += 0.7 * anomaly_weight;
        }
        if scan.permissions_denied == PermissionVerdict::Denied {
            score += PERMISSIONS_DENIED_POINTS;
        }
    }

    let trajectory_weight = policy
        .weight(ProbeName::MouseTrajectory)
        .unwrap_or(WEIGHT_MOUSE_TRAJECTORY);
    let platform = report.platform();
    let mut point_count = 0usize;
    if let Some(capture) = report.trajectory() {
        point_count = capture.points.len();
        if point_count == 0 {
            score += EMPTY_TRAJECTORY_POINTS;
        } else if point_count < SPARSE_TRAJECTORY_THRESHOLD {
            score += SPARSE_TRAJECTORY_POINTS;
        }
        if capture.analysis.is_straight_line {
            let touch_points = platform.map(|profile| profile.touch_points).unwrap_or(0);
            score += if touch_points > 0 {
                trajectory_weight * 0.1
            } else {
                trajectory_weight * 0.7
            };
        } else if capture.analysis.regularity_score > 0.5 {
            score += trajectory_weight * 0.5;
        }
    }

    if let Some(profile) = platform {
        if profile.click_count == 0 {
            score += ZERO_CLICK_POINTS;
        }
        if profile.click_count > ACTIVE_USER_CLICKS && point_count > ACTIVE_USER_TRAJECTORY {
            score -= ACTIVE_USER_BONUS;
        }
    }

    if let Some(navigation) = report.navigation() {
        if navigation.transfer_size == 0 && navigation.entry_type == "navigate" {
            score -= CACHED_NAVIGATION_BONUS;
        }
    }

    let faults = report.fault_count();
    if faults > FAULT_COUNT_THRESHOLD {
        score += (2 * faults) as f64;
    }

    score.round().clamp(0.0, 100.0) as u8
}
