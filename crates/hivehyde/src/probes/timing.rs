use crate::host::HostEnvironment;
use crate::probes::{NavigationProfile, ProbeFault, ProbeOutcome, ProbeValue};

/// Entry type reported when only legacy timing marks are available.
pub(crate) const LEGACY_ENTRY_TYPE: &str = "legacy";

/// Navigation profile from the modern entries API, falling back to legacy
/// timing marks (`transfer_size` fixed at -1 there).
pub(crate) fn run(host: &dyn HostEnvironment) -> ProbeOutcome {
    let Some(timeline) = host.performance() else {
        return ProbeOutcome::Fault(ProbeFault::NoPerfApi);
    };

    if let Some(entry) = timeline.navigation {
        return ProbeOutcome::Value(ProbeValue::Navigation(NavigationProfile {
            entry_type: entry.entry_type,
            transfer_size: entry.transfer_size,
            load_time_ms: entry.duration_ms,
        }));
    }

    let Some(legacy) = timeline.legacy else {
        return ProbeOutcome::Fault(ProbeFault::NoTiming);
    };
    if legacy.load_event_end_ms < legacy.navigation_start_ms {
        return ProbeOutcome::Fault(ProbeFault::Perf);
    }
    ProbeOutcome::Value(ProbeValue::Navigation(NavigationProfile {
        entry_type: LEGACY_ENTRY_TYPE.to_string(),
        transfer_size: -1,
        load_time_ms: (legacy.load_event_end_ms - legacy.navigation_start_ms) as f64,
    }))
}
