use crate::host::{HostEnvironment, WebGlAcquisition};
use crate::probes::{GraphicsAdapter, ProbeFault, ProbeOutcome, ProbeValue};

/// Reports the WebGL adapter identity, preferring the unmasked
/// vendor/renderer strings over the masked pair.
pub(crate) fn run(host: &dyn HostEnvironment) -> ProbeOutcome {
    match host.webgl() {
        WebGlAcquisition::Unavailable => ProbeOutcome::Fault(ProbeFault::NoWebgl),
        WebGlAcquisition::Failed => ProbeOutcome::Fault(ProbeFault::Webgl),
        WebGlAcquisition::Adapter(adapter) => {
            let identity = adapter.unmasked.unwrap_or(adapter.masked);
            ProbeOutcome::Value(ProbeValue::Graphics(GraphicsAdapter {
                vendor: identity.vendor,
                renderer: identity.renderer,
            }))
        }
    }
}
