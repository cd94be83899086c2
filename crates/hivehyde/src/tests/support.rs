use super::*;

use async_trait::async_trait;
use httpmock::MockServer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use url::Url;

/// 32-byte session key used across tests, as the server would issue it.
pub(crate) const TEST_SESSION_KEY: &str =
    "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

/// A second key for rotation tests.
pub(crate) const ROTATED_SESSION_KEY: &str =
    "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100";

pub(crate) struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub(crate) fn at(now_ms: u64) -> Arc<Self> {
        Arc::new(ManualClock {
            now: AtomicU64::new(now_ms),
        })
    }

    pub(crate) fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Canvas fake that records the exact operation sequence issued to it.
pub(crate) struct RecordingCanvas {
    ops: Arc<Mutex<Vec<String>>>,
    data_url: Option<String>,
}

impl Canvas2d for RecordingCanvas {
    fn set_font(&mut self, font: &str) {
        self.record(format!("font={font}"));
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        self.record(format!("baseline={baseline}"));
    }

    fn set_fill_style(&mut self, style: &str) {
        self.record(format!("fill={style}"));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(format!("rect={x},{y},{width},{height}"));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.record(format!("text={text}@{x},{y}"));
    }

    fn to_data_url(&self) -> Option<String> {
        self.data_url.clone()
    }
}

impl RecordingCanvas {
    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

/// Script describing what canvas acquisitions should observe and return.
#[derive(Clone)]
pub(crate) struct CanvasScript {
    pub ops: Arc<Mutex<Vec<String>>>,
    pub data_url: Option<String>,
}

impl CanvasScript {
    pub(crate) fn exporting(data_url: &str) -> Self {
        CanvasScript {
            ops: Arc::new(Mutex::new(Vec::new())),
            data_url: Some(data_url.to_string()),
        }
    }

    pub(crate) fn unexportable() -> Self {
        CanvasScript {
            ops: Arc::new(Mutex::new(Vec::new())),
            data_url: None,
        }
    }

    pub(crate) fn recorded_ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

/// Host fake scripted per test. Defaults to every surface absent, matching
/// [`DetachedHost`].
pub(crate) struct ScriptedHost {
    pub screen: Option<ScreenInfo>,
    pub navigator: Option<NavigatorInfo>,
    pub canvas: Option<CanvasScript>,
    pub webgl: WebGlAcquisition,
    pub offline_audio: bool,
    pub audio_result: Result<Vec<f32>, AudioFailure>,
    pub performance: Option<PerformanceTimeline>,
    pub device_motion: bool,
    pub webdriver_flag: Option<bool>,
    pub webdriver_descriptor: Option<DescriptorShape>,
    pub chrome_runtime: Option<ChromeRuntimeShape>,
    pub to_string_samples: Option<ToStringSamples>,
    pub stack_sample: Option<String>,
    pub permission: PermissionProbe,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        ScriptedHost {
            screen: None,
            navigator: None,
            canvas: None,
            webgl: WebGlAcquisition::Unavailable,
            offline_audio: false,
            audio_result: Err(AudioFailure::Context),
            performance: None,
            device_motion: false,
            webdriver_flag: None,
            webdriver_descriptor: None,
            chrome_runtime: None,
            to_string_samples: None,
            stack_sample: None,
            permission: PermissionProbe::Unsupported,
        }
    }
}

#[async_trait]
impl HostEnvironment for ScriptedHost {
    fn screen(&self) -> Option<ScreenInfo> {
        self.screen
    }

    fn navigator(&self) -> Option<NavigatorInfo> {
        self.navigator.clone()
    }

    fn canvas_2d(&self, _width: u32, _height: u32) -> Option<Box<dyn Canvas2d>> {
        self.canvas.as_ref().map(|script| {
            Box::new(RecordingCanvas {
                ops: script.ops.clone(),
                data_url: script.data_url.clone(),
            }) as Box<dyn Canvas2d>
        })
    }

    fn webgl(&self) -> WebGlAcquisition {
        self.webgl.clone()
    }

    fn has_offline_audio(&self) -> bool {
        self.offline_audio
    }

    async fn render_audio(&self, _pipeline: &AudioPipelineSpec) -> Result<Vec<f32>, AudioFailure> {
        self.audio_result.clone()
    }

    fn performance(&self) -> Option<PerformanceTimeline> {
        self.performance.clone()
    }

    fn supports_device_motion(&self) -> bool {
        self.device_motion
    }

    fn webdriver_flag(&self) -> Option<bool> {
        self.webdriver_flag
    }

    fn webdriver_descriptor(&self) -> Option<DescriptorShape> {
        self.webdriver_descriptor
    }

    fn chrome_runtime(&self) -> Option<ChromeRuntimeShape> {
        self.chrome_runtime
    }

    fn to_string_samples(&self) -> Option<ToStringSamples> {
        self.to_string_samples.clone()
    }

    fn stack_sample(&self) -> Option<String> {
        self.stack_sample.clone()
    }

    async fn notification_permission(&self) -> PermissionProbe {
        self.permission
    }
}

/// Host with every surface a genuine desktop browser would expose.
pub(crate) fn desktop_host() -> ScriptedHost {
    ScriptedHost {
        screen: Some(ScreenInfo {
            width: 1920,
            height: 1080,
            color_depth: 24,
        }),
        navigator: Some(NavigatorInfo {
            platform: "Linux x86_64".to_string(),
            language: "en-US".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".to_string(),
            plugins: vec!["PDF Viewer".to_string(), "Chromium PDF Viewer".to_string()],
            touch_points: 0,
        }),
        canvas: Some(CanvasScript::exporting("data:image/png;base64,ZmFrZQ==")),
        webgl: WebGlAcquisition::Adapter(WebGlAdapter {
            unmasked: Some(AdapterStrings {
                vendor: "Google Inc. (NVIDIA)".to_string(),
                renderer: "ANGLE (NVIDIA, GeForce RTX 3060)".to_string(),
            }),
            masked: AdapterStrings {
                vendor: "WebKit".to_string(),
                renderer: "WebKit WebGL".to_string(),
            },
        }),
        offline_audio: true,
        audio_result: Ok(flat_samples(0.25)),
        performance: Some(PerformanceTimeline {
            navigation: Some(NavigationEntry {
                entry_type: "navigate".to_string(),
                transfer_size: 14_523,
                duration_ms: 812.5,
            }),
            legacy: None,
        }),
        device_motion: false,
        to_string_samples: Some(genuine_to_string_samples()),
        stack_sample: Some(genuine_stack()),
        permission: PermissionProbe::States {
            query: PermissionState::Prompt,
            legacy: PermissionState::Prompt,
        },
        ..ScriptedHost::default()
    }
}

pub(crate) fn flat_samples(level: f32) -> Vec<f32> {
    vec![level; 44_100]
}

pub(crate) fn genuine_to_string_samples() -> ToStringSamples {
    ToStringSamples {
        builtin: "function toString() { [native code] }".to_string(),
        user_function: format!("function probe() {{ return '{TOSTRING_PROBE_MARKER}'; }}"),
    }
}

pub(crate) fn genuine_stack() -> String {
    [
        "Error: probe",
        "    at gather (app.js:10:5)",
        "    at dispatch (app.js:22:9)",
        "    at main (app.js:40:1)",
    ]
    .join("\n")
}

/// Registers a successful `/warden/init` mock issuing the given material.
pub(crate) async fn session_endpoint<'a>(
    server: &'a MockServer,
    key: &str,
    token: &str,
) -> httpmock::Mock<'a> {
    let body = json!({"code": 0, "data": {"key": key, "token": token}, "msg": "ok"});
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path("/warden/init");
            then.status(200).json_body(body.clone());
        })
        .await
}

/// Registers a `/warden/init` mock answering with the given status/body.
pub(crate) async fn session_endpoint_raw<'a>(
    server: &'a MockServer,
    status: u16,
    body: serde_json::Value,
) -> httpmock::Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path("/warden/init");
            then.status(status).json_body(body.clone());
        })
        .await
}

pub(crate) fn vault_for(server: &MockServer, clock: Arc<dyn Clock>) -> SessionVault {
    crate::vault::SessionVault::new(
        reqwest::Client::new(),
        &Url::parse(&server.base_url()).unwrap(),
        clock,
        DEFAULT_SESSION_LIFESPAN,
        DEFAULT_REFRESH_BUFFER,
    )
    .unwrap()
}

pub(crate) fn hive_for(
    server: &MockServer,
    host: Arc<dyn HostEnvironment>,
    clock: Arc<dyn Clock>,
) -> HiveHyde {
    HiveHyde::builder()
        .api_base_url(server.base_url())
        .host(host)
        .clock(clock)
        .build()
        .expect("test configuration should build")
}
