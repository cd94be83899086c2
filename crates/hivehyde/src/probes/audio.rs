use crate::host::{
    AudioFailure, AudioPipelineSpec, CompressorSettings, HostEnvironment, OscillatorSpec, Waveform,
};
use crate::probes::{ProbeFault, ProbeOutcome, ProbeValue};

/// Channel-0 sample window summed into the audio fingerprint.
pub(crate) const SAMPLE_WINDOW_START: usize = 4500;
pub(crate) const SAMPLE_WINDOW_LEN: usize = 500;

/// Fixed pipeline the host renders: a 10 kHz triangle oscillator through a
/// dynamics compressor into a 2-channel, 44.1 kHz, 1-second offline
/// destination.
pub(crate) fn pipeline_spec() -> AudioPipelineSpec {
    AudioPipelineSpec {
        channels: 2,
        sample_rate_hz: 44_100,
        duration_secs: 1.0,
        oscillator: OscillatorSpec {
            waveform: Waveform::Triangle,
            frequency_hz: 10_000.0,
        },
        compressor: CompressorSettings {
            threshold: -50.0,
            knee: 40.0,
            ratio: 12.0,
            reduction: -20.0,
            attack: 0.0,
            release: 0.25,
        },
    }
}

/// Renders the fixed pipeline and sums the absolute values of the
/// fingerprint sample window, returned as a decimal string.
pub(crate) async fn run(host: &dyn HostEnvironment) -> ProbeOutcome {
    if !host.has_offline_audio() {
        return ProbeOutcome::Fault(ProbeFault::NoOfflineContext);
    }
    match host.render_audio(&pipeline_spec()).await {
        Err(AudioFailure::Context) => ProbeOutcome::Fault(ProbeFault::AudioContext),
        Err(AudioFailure::Render) => ProbeOutcome::Fault(ProbeFault::AudioRender),
        Ok(samples) => {
            let sum: f64 = samples
                .iter()
                .skip(SAMPLE_WINDOW_START)
                .take(SAMPLE_WINDOW_LEN)
                .map(|sample| f64::from(sample.abs()))
                .sum();
            ProbeOutcome::Value(ProbeValue::Text(sum.to_string()))
        }
    }
}
