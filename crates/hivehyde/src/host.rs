use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Boundary between the signing pipeline and the surface it fingerprints.
///
/// The crate owns every decision the pipeline makes (the canvas draw
/// sequence, the audio pipeline parameters, fallback ladders, anomaly
/// classification) while implementations of this trait supply only raw
/// primitives: a drawing surface, rendered samples, the navigator record,
/// a raw stack string. Hosts embedding the SDK (webview bridges,
/// instrumented clients, test harnesses) implement whichever surfaces they
/// have; every method defaults to "absent", so a minimal host implements
/// nothing and still signs (with sentinel fingerprints and a conservative
/// policy). [`DetachedHost`] is exactly that empty implementation.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// Display geometry, when a screen is present.
    fn screen(&self) -> Option<ScreenInfo> {
        None
    }

    /// Navigator record (platform, language, plugins, touch points, UA).
    fn navigator(&self) -> Option<NavigatorInfo> {
        None
    }

    /// Acquires a 2D drawing surface of the given size, when obtainable.
    fn canvas_2d(&self, _width: u32, _height: u32) -> Option<Box<dyn Canvas2d>> {
        None
    }

    /// Attempts to acquire a WebGL adapter description.
    fn webgl(&self) -> WebGlAcquisition {
        WebGlAcquisition::Unavailable
    }

    /// True when an offline audio context constructor exists.
    fn has_offline_audio(&self) -> bool {
        false
    }

    /// Renders the described audio pipeline offline and returns the
    /// channel-0 samples. Hosts skip compressor parameters their surface
    /// lacks a setter for.
    async fn render_audio(&self, _pipeline: &AudioPipelineSpec) -> Result<Vec<f32>, AudioFailure> {
        Err(AudioFailure::Context)
    }

    /// Navigation performance timeline, when a timing API is present.
    fn performance(&self) -> Option<PerformanceTimeline> {
        None
    }

    /// True when device-motion events are supported.
    fn supports_device_motion(&self) -> bool {
        false
    }

    /// The navigator automation flag; `None` when the navigator is absent.
    fn webdriver_flag(&self) -> Option<bool> {
        None
    }

    /// Property descriptor of the automation flag, when one exists at all.
    /// Genuine browsers typically expose no descriptor.
    fn webdriver_descriptor(&self) -> Option<DescriptorShape> {
        None
    }

    /// Shape of the Chrome runtime object, when one exists.
    fn chrome_runtime(&self) -> Option<ChromeRuntimeShape> {
        None
    }

    /// Source-text samples used for `toString` tamper detection. The user
    /// function sample must embed [`crate::anomaly::TOSTRING_PROBE_MARKER`]
    /// in its body.
    fn to_string_samples(&self) -> Option<ToStringSamples> {
        None
    }

    /// Raw stack text captured from a thrown probe error.
    fn stack_sample(&self) -> Option<String> {
        None
    }

    /// Resolved notification-permission states.
    async fn notification_permission(&self) -> PermissionProbe {
        PermissionProbe::Unsupported
    }
}

/// Host with every capability absent.
///
/// Useful as a default for embeddings that only need signing (every probe
/// resolves to its sentinel and the policy stays minimal) and as a baseline
/// in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedHost;

#[async_trait]
impl HostEnvironment for DetachedHost {}

/// Display geometry reported by the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
}

/// Navigator record reported by the host.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NavigatorInfo {
    pub platform: String,
    pub language: String,
    pub user_agent: String,
    pub plugins: Vec<String>,
    pub touch_points: u32,
}

/// Minimal 2D drawing surface the canvas probe issues its draw sequence to.
///
/// Styles are passed as CSS-style strings so hosts can forward them to a
/// real context verbatim.
pub trait Canvas2d: Send {
    fn set_font(&mut self, font: &str);
    fn set_text_baseline(&mut self, baseline: &str);
    fn set_fill_style(&mut self, style: &str);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    /// Data-URL representation of the rendered surface; `None` when the
    /// surface cannot be exported.
    fn to_data_url(&self) -> Option<String>;
}

/// Outcome of attempting to acquire a WebGL context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WebGlAcquisition {
    /// No WebGL context could be constructed.
    Unavailable,
    /// A context exists but interrogating it failed.
    Failed,
    /// Adapter identity strings for an acquired context.
    Adapter(WebGlAdapter),
}

/// Vendor/renderer identity of a WebGL adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WebGlAdapter {
    /// Unmasked identity from the debug-renderer-info extension, when
    /// available.
    pub unmasked: Option<AdapterStrings>,
    /// Masked identity; always present on an acquired context.
    pub masked: AdapterStrings,
}

/// A vendor/renderer string pair.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AdapterStrings {
    pub vendor: String,
    pub renderer: String,
}

/// Offline audio pipeline the audio probe asks the host to render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioPipelineSpec {
    pub channels: u32,
    pub sample_rate_hz: u32,
    pub duration_secs: f64,
    pub oscillator: OscillatorSpec,
    pub compressor: CompressorSettings,
}

/// Oscillator feeding the compressor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorSpec {
    pub waveform: Waveform,
    pub frequency_hz: f64,
}

/// Oscillator waveform shapes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Dynamics-compressor parameters. Hosts apply each value only when the
/// underlying surface exposes the corresponding setter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorSettings {
    pub threshold: f64,
    pub knee: f64,
    pub ratio: f64,
    pub reduction: f64,
    pub attack: f64,
    pub release: f64,
}

/// Stage at which offline audio rendering failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AudioFailure {
    /// The offline context could not be constructed.
    Context,
    /// The context was constructed but rendering failed.
    Render,
}

/// Navigation performance data reported by the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceTimeline {
    /// Modern navigation entry, when the entries API is present.
    pub navigation: Option<NavigationEntry>,
    /// Legacy timing marks, for hosts predating the entries API.
    pub legacy: Option<LegacyTiming>,
}

/// Modern navigation-entry fields consumed by the performance probe.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationEntry {
    pub entry_type: String,
    pub transfer_size: i64,
    pub duration_ms: f64,
}

/// Legacy navigation timing marks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LegacyTiming {
    pub navigation_start_ms: u64,
    pub load_event_end_ms: u64,
}

/// Shape of a property descriptor found on the automation flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DescriptorShape {
    pub configurable: bool,
}

/// Shape of a Chrome runtime object found on the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChromeRuntimeShape {
    /// True when the `csi` timing function exists and is callable.
    pub has_callable_csi: bool,
}

/// Source-text samples for `toString` tamper detection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToStringSamples {
    /// `toString` output of a built-in function.
    pub builtin: String,
    /// Source text of a user-defined probe function.
    pub user_function: String,
}

/// A notification-permission state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// Result of querying the notification permission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PermissionProbe {
    /// The permissions API is missing.
    Unsupported,
    /// The query itself failed.
    Failed,
    /// Both the permissions query and the legacy notification API resolved.
    States {
        query: PermissionState,
        legacy: PermissionState,
    },
}
