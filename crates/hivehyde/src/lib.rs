#![forbid(unsafe_code)]
//! Client-side anti-automation and request-integrity layer for
//! HiveHyde-protected APIs.
//!
//! Every protected request is bound to a short-lived server-issued session
//! secret, a risk score derived from environment and behavior probes, and
//! an HMAC-SHA256 signature over canonical request data. The server
//! mirrors the signing computation and rejects mismatches, so every rule
//! in this crate (parameter canonicalization, the fingerprint plaintext,
//! key and IV derivation, the `||`-delimited signing record) must match
//! its implementation byte for byte.
//!
//! ## Setup
//! - [`HiveHyde::builder`] takes the one required setting,
//!   `api_base_url`, plus optional host/clock/HTTP-client injection and
//!   session timing; `build()` validates the configuration.
//! - [`HiveHyde::initialize`] detects host capabilities once, schedules
//!   the immutable probe policy, and acquires the first session from
//!   `POST <api_base_url>/warden/init`. It fails hard when no session can
//!   be fetched; afterwards the key rotates silently in the background of
//!   [`SessionVault::current_key`] calls.
//! - Probe surfaces reach the crate through the [`HostEnvironment`]
//!   trait. Hosts implement whichever surfaces they have (every method
//!   defaults to absent); [`DetachedHost`] implements none and still
//!   signs with sentinel fingerprints.
//!
//! ## Signing a request
//! ```rust,no_run
//! use hivehyde::{HiveHyde, OutboundRequest};
//! use reqwest::Method;
//! use serde_json::json;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hive = HiveHyde::builder()
//!     .api_base_url("https://api.example.com")
//!     .build()?;
//! hive.initialize().await?;
//!
//! let sentinel = hive.attach()?;
//! let _response = sentinel
//!     .execute(
//!         OutboundRequest::new(Method::POST, "orders/create")
//!             .params(json!({"sku": "tea-128", "qty": 2}))
//!             .protect(true),
//!     )
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Hosts on other HTTP stacks call [`HiveHyde::process_request`] for the
//! raw [`SignaturePackage`] and render it with [`signature_headers`].
//!
//! ## Surfaces
//! - [`SessionVault`] fetches and silently rotates the session secret;
//!   concurrent callers in the refresh window share a single fetch.
//! - [`DataLoom`] dispatches the policy's collectors concurrently, each
//!   resolving to a value or a closed-set sentinel; nothing throws out of
//!   the fabric.
//! - [`AnomalyScanner`] classifies automation signals (webdriver flags,
//!   runtime shape, `toString` tampering, stack shape, permissions).
//! - [`RiskMatrix`] folds a gather pass into the 0-100 risk score and
//!   emits the signature package.
//! - [`ApiSentinel`] wraps one `reqwest` client; protected requests are
//!   signed before dispatch and cancelled when signing fails.

mod anomaly;
mod canonical;
mod clock;
mod config;
mod crypto;
mod engine;
mod error;
mod host;
mod policy;
mod probes;
mod risk;
mod sentinel;
mod vault;

pub use anomaly::{
    AnomalyReport, AnomalyScanner, PermissionVerdict, StackVerdict, MIN_STACK_FRAMES,
    STACK_KEYWORDS, TOSTRING_PROBE_MARKER,
};
pub use canonical::{
    canonical_json, compose_signing_record, serialize_params, RECORD_DELIMITER,
};
pub use clock::{Clock, SystemClock};
pub use config::HiveHydeBuilder;
pub use crypto::{
    decrypt_fingerprint, derive_iv, encrypt_fingerprint, generate_nonce, hmac_sha256_hex,
    parse_session_key, SESSION_KEY_HEX_LEN,
};
pub use engine::{RiskMatrix, SignaturePackage, FINGERPRINT_PLACEHOLDER};
pub use error::HiveHydeError;
pub use host::{
    AdapterStrings, AudioFailure, AudioPipelineSpec, Canvas2d, ChromeRuntimeShape,
    CompressorSettings, DescriptorShape, DetachedHost, HostEnvironment, LegacyTiming,
    NavigationEntry, NavigatorInfo, OscillatorSpec, PerformanceTimeline, PermissionProbe,
    PermissionState, ScreenInfo, ToStringSamples, Waveform, WebGlAcquisition, WebGlAdapter,
};
pub use policy::{
    schedule_policy, CapabilitySnapshot, PolicyOverrides, ProbeName, ProbePolicy,
    WEIGHT_ANOMALY_SCAN, WEIGHT_AUDIO, WEIGHT_CANVAS, WEIGHT_MOUSE_TRAJECTORY,
    WEIGHT_PERFORMANCE, WEIGHT_PLUGINS, WEIGHT_WEBGL,
};
pub use probes::{
    analyze, DataLoom, GraphicsAdapter, NavigationProfile, PlatformProfile, ProbeFault,
    ProbeOutcome, ProbeReport, ProbeValue, ScreenProfile, TrajectoryAnalysis,
    TrajectoryCapture, TrajectoryPoint, TrajectoryTracker, CANVAS_PAYLOAD, MAX_SAMPLES,
    MIN_SAMPLE_GAP_MS,
};
pub use sentinel::{
    signature_headers, ApiSentinel, OutboundRequest, HEADER_FINGERPRINT, HEADER_NONCE,
    HEADER_RISK_SCORE, HEADER_SIGNATURE, HEADER_TIMESTAMP, HEADER_TOKEN,
};
pub use vault::{SessionVault, DEFAULT_REFRESH_BUFFER, DEFAULT_SESSION_LIFESPAN, INIT_PATH};

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Handle wiring the vault, probe fabric, engine, and sentinel together.
///
/// Built by [`HiveHydeBuilder`]; unusable for signing until
/// [`HiveHyde::initialize`] succeeds. The capability snapshot and probe
/// policy are fixed at initialization and never change afterwards.
pub struct HiveHyde {
    base_url: Url,
    host: Arc<dyn HostEnvironment>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    session_lifespan: Duration,
    refresh_buffer: Duration,
    policy_overrides: PolicyOverrides,
    runtime: tokio::sync::OnceCell<Runtime>,
}

struct Runtime {
    snapshot: CapabilitySnapshot,
    policy: Arc<ProbePolicy>,
    tracker: Arc<TrajectoryTracker>,
    loom: Arc<DataLoom>,
    vault: Arc<SessionVault>,
    engine: Arc<RiskMatrix>,
    sentinel: OnceLock<Arc<ApiSentinel>>,
}

impl HiveHyde {
    /// Returns a [`HiveHydeBuilder`] preloaded with defaults.
    pub fn builder() -> HiveHydeBuilder {
        HiveHydeBuilder::new()
    }

    pub(crate) fn assemble(
        base_url: Url,
        host: Arc<dyn HostEnvironment>,
        clock: Arc<dyn Clock>,
        http: reqwest::Client,
        session_lifespan: Duration,
        refresh_buffer: Duration,
        policy_overrides: PolicyOverrides,
    ) -> Self {
        HiveHyde {
            base_url,
            host,
            clock,
            http,
            session_lifespan,
            refresh_buffer,
            policy_overrides,
            runtime: tokio::sync::OnceCell::new(),
        }
    }

    /// Detects capabilities, schedules the probe policy, and acquires the
    /// first session.
    ///
    /// Fails when the session fetch fails; protected requests cannot
    /// proceed without a first key. Calling again after success is a
    /// logged no-op.
    pub async fn initialize(&self) -> Result<(), HiveHydeError> {
        if self.runtime.get().is_some() {
            warn!("hivehyde already initialized; ignoring repeated initialize");
            return Ok(());
        }
        self.runtime
            .get_or_try_init(|| async {
                let snapshot = CapabilitySnapshot::detect(self.host.as_ref());
                let policy = Arc::new(schedule_policy(&snapshot, &self.policy_overrides));
                debug!(
                    collectors = policy.collectors().len(),
                    "probe policy scheduled"
                );

                let tracker = Arc::new(TrajectoryTracker::new(self.clock.clone()));
                let loom = Arc::new(DataLoom::new(self.host.clone(), tracker.clone()));
                let vault = Arc::new(SessionVault::new(
                    self.http.clone(),
                    &self.base_url,
                    self.clock.clone(),
                    self.session_lifespan,
                    self.refresh_buffer,
                )?);
                vault.initialize().await?;

                let engine = Arc::new(RiskMatrix::new(
                    vault.clone(),
                    loom.clone(),
                    policy.clone(),
                    self.clock.clone(),
                ));
                Ok(Runtime {
                    snapshot,
                    policy,
                    tracker,
                    loom,
                    vault,
                    engine,
                    sentinel: OnceLock::new(),
                })
            })
            .await
            .map(|_| ())
    }

    /// Computes the signature package for one request without dispatching
    /// it, for hosts that inject headers into their own transport.
    pub async fn process_request(
        &self,
        method: &str,
        url: &str,
        params: &serde_json::Value,
    ) -> Result<SignaturePackage, HiveHydeError> {
        let runtime = self.runtime()?;
        let target = sentinel::resolve_target(&self.base_url, url)?;
        let path = sentinel::normalize_path(target.path());
        runtime.engine.sign_request(method, &path, params).await
    }

    /// Returns the sentinel bound to the configured HTTP client, creating
    /// it on first call. Repeated attachment is a logged no-op returning
    /// the existing sentinel.
    pub fn attach(&self) -> Result<Arc<ApiSentinel>, HiveHydeError> {
        let runtime = self.runtime()?;
        if let Some(existing) = runtime.sentinel.get() {
            warn!("sentinel already attached; returning existing instance");
            return Ok(existing.clone());
        }
        let sentinel = runtime.sentinel.get_or_init(|| {
            Arc::new(ApiSentinel::new(
                runtime.engine.clone(),
                self.http.clone(),
                self.base_url.clone(),
            ))
        });
        Ok(sentinel.clone())
    }

    /// Capability snapshot taken at initialization.
    pub fn capability_snapshot(&self) -> Result<CapabilitySnapshot, HiveHydeError> {
        Ok(self.runtime()?.snapshot)
    }

    /// Probe policy scheduled at initialization.
    pub fn policy(&self) -> Result<&ProbePolicy, HiveHydeError> {
        Ok(self.runtime()?.policy.as_ref())
    }

    /// Session vault.
    pub fn vault(&self) -> Result<&Arc<SessionVault>, HiveHydeError> {
        Ok(&self.runtime()?.vault)
    }

    /// Probe fabric.
    pub fn loom(&self) -> Result<&Arc<DataLoom>, HiveHydeError> {
        Ok(&self.runtime()?.loom)
    }

    /// Risk & signing engine.
    pub fn risk_matrix(&self) -> Result<&Arc<RiskMatrix>, HiveHydeError> {
        Ok(&self.runtime()?.engine)
    }

    /// Pointer-state owner host events should be wired to.
    pub fn tracker(&self) -> Result<&Arc<TrajectoryTracker>, HiveHydeError> {
        Ok(&self.runtime()?.tracker)
    }

    fn runtime(&self) -> Result<&Runtime, HiveHydeError> {
        self.runtime.get().ok_or(HiveHydeError::NotInitialized)
    }
}

#[cfg(test)]
mod tests;
