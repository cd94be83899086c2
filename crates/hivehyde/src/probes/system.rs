use crate::host::HostEnvironment;
use crate::probes::{
    PlatformProfile, ProbeFault, ProbeOutcome, ProbeValue, ScreenProfile, TrajectoryTracker,
};

/// Platform profile: platform string, comma-joined plugin names, touch
/// points, and the click counter at probe time.
pub(crate) fn platform(host: &dyn HostEnvironment, tracker: &TrajectoryTracker) -> ProbeOutcome {
    let Some(navigator) = host.navigator() else {
        return ProbeOutcome::Fault(ProbeFault::Platform);
    };
    ProbeOutcome::Value(ProbeValue::Platform(PlatformProfile {
        platform: navigator.platform,
        plugins: navigator.plugins.join(","),
        touch_points: navigator.touch_points,
        click_count: tracker.click_count(),
    }))
}

/// Screen profile: `WxHxD` geometry plus the navigator language.
pub(crate) fn screen(host: &dyn HostEnvironment) -> ProbeOutcome {
    let Some(screen) = host.screen() else {
        return ProbeOutcome::Fault(ProbeFault::Screen);
    };
    let language = host
        .navigator()
        .map(|navigator| navigator.language)
        .unwrap_or_default();
    ProbeOutcome::Value(ProbeValue::Screen(ScreenProfile {
        screen: format!("{}x{}x{}", screen.width, screen.height, screen.color_depth),
        language,
    }))
}

/// Navigator language; empty when the navigator is absent.
pub(crate) fn language(host: &dyn HostEnvironment) -> ProbeOutcome {
    let language = host
        .navigator()
        .map(|navigator| navigator.language)
        .unwrap_or_default();
    ProbeOutcome::Value(ProbeValue::Text(language))
}

/// Comma-joined plugin names; empty when the navigator is absent.
pub(crate) fn plugins(host: &dyn HostEnvironment) -> ProbeOutcome {
    let plugins = host
        .navigator()
        .map(|navigator| navigator.plugins.join(","))
        .unwrap_or_default();
    ProbeOutcome::Value(ProbeValue::Text(plugins))
}
