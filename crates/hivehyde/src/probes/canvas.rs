use crate::host::HostEnvironment;
use crate::probes::{ProbeFault, ProbeOutcome, ProbeValue};

/// Text payload rendered into the canvas fingerprint. Part of the wire
/// contract; the server expects surfaces rendered from exactly this string.
pub const CANVAS_PAYLOAD: &str = "HiveHyde Anti-Crawler <canvas> 1.0 @!#$";

pub(crate) const CANVAS_WIDTH: u32 = 200;
pub(crate) const CANVAS_HEIGHT: u32 = 60;

/// Renders the fixed fingerprint scene and returns its data-URL.
///
/// The draw sequence is part of the fingerprint and must not change:
/// font `14px Arial`, baseline `top`, an `#f60` rectangle at
/// (125, 1, 62, 20), the payload in `#069` at (2, 15), and the payload
/// again in `rgba(102,204,0,0.7)` at (4, 17).
pub(crate) fn run(host: &dyn HostEnvironment) -> ProbeOutcome {
    let Some(mut surface) = host.canvas_2d(CANVAS_WIDTH, CANVAS_HEIGHT) else {
        return ProbeOutcome::Fault(ProbeFault::Canvas);
    };

    surface.set_font("14px Arial");
    surface.set_text_baseline("top");
    surface.set_fill_style("#f60");
    surface.fill_rect(125.0, 1.0, 62.0, 20.0);
    surface.set_fill_style("#069");
    surface.fill_text(CANVAS_PAYLOAD, 2.0, 15.0);
    surface.set_fill_style("rgba(102,204,0,0.7)");
    surface.fill_text(CANVAS_PAYLOAD, 4.0, 17.0);

    match surface.to_data_url() {
        Some(data_url) => ProbeOutcome::Value(ProbeValue::Text(data_url)),
        None => ProbeOutcome::Fault(ProbeFault::Canvas),
    }
}
