use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::error::HiveHydeError;
use crate::policy::{ProbeName, ProbePolicy};
use crate::probes::{DataLoom, ProbeFault, ProbeOutcome, ProbeReport, ProbeValue};
use crate::vault::SessionVault;
use crate::{canonical, crypto, risk};

/// Placeholder for fingerprint fields whose probe produced nothing usable.
pub const FINGERPRINT_PLACEHOLDER: &str = "N/A";

/// Everything the transport needs to bind one request to the session:
/// signature, timestamp, nonce, risk score, session token, and the
/// encrypted fingerprint envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignaturePackage {
    pub signature: String,
    pub timestamp_ms: u64,
    pub nonce: String,
    pub risk_score: u8,
    pub token: String,
    pub encrypted_fingerprint: String,
}

/// The plaintext the server decrypts and re-signs. Field order is the wire
/// contract; do not reorder.
#[derive(Debug, Serialize)]
struct RawFingerprint<'a> {
    platform: &'a str,
    renderer: &'a str,
    audio: &'a str,
}

/// Risk & signing engine.
///
/// One signing attempt gathers the policy's probes, folds them into a risk
/// score, serializes the raw fingerprint, composes the canonical signing
/// record, and emits the HMAC signature plus the AES fingerprint envelope,
/// all bound to the vault's current session key.
pub struct RiskMatrix {
    vault: Arc<SessionVault>,
    loom: Arc<DataLoom>,
    policy: Arc<ProbePolicy>,
    clock: Arc<dyn Clock>,
}

impl RiskMatrix {
    pub(crate) fn new(
        vault: Arc<SessionVault>,
        loom: Arc<DataLoom>,
        policy: Arc<ProbePolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RiskMatrix {
            vault,
            loom,
            policy,
            clock,
        }
    }

    /// Signs one request described by method, derived path, and params
    /// (query parameters for GET, body otherwise).
    ///
    /// Fails with [`HiveHydeError::SessionKeyUnavailable`] when the vault
    /// holds no session; probe faults never fail the attempt, they fold
    /// into the risk score and the fingerprint sentinels.
    pub async fn sign_request(
        &self,
        method: &str,
        path: &str,
        params: &Value,
    ) -> Result<SignaturePackage, HiveHydeError> {
        let key_hex = self
            .vault
            .current_key()
            .await
            .ok_or(HiveHydeError::SessionKeyUnavailable)?;
        let token = self
            .vault
            .current_token()
            .ok_or(HiveHydeError::SessionKeyUnavailable)?;

        let report = self.loom.gather(&self.policy).await;
        let risk_score = risk::score(&report, &self.policy);
        let fingerprint_json = raw_fingerprint_json(&report)?;

        let timestamp_ms = self.clock.now_ms();
        let nonce = crypto::generate_nonce(timestamp_ms);
        let serialized_params = canonical::serialize_params(method, params);
        let record = canonical::compose_signing_record(
            timestamp_ms,
            &nonce,
            method,
            path,
            &serialized_params,
            risk_score,
            &fingerprint_json,
        );

        let key = crypto::parse_session_key(&key_hex)?;
        let signature = crypto::hmac_sha256_hex(&key, record.as_bytes())?;
        let encrypted_fingerprint = crypto::encrypt_fingerprint(&key_hex, &fingerprint_json)?;

        debug!(risk_score, nonce = %nonce, method, path, "signed protected request");
        Ok(SignaturePackage {
            signature,
            timestamp_ms,
            nonce,
            risk_score,
            token,
            encrypted_fingerprint,
        })
    }

    /// Policy the engine gathers under.
    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }
}

/// Serializes the `{platform, renderer, audio}` fingerprint plaintext.
///
/// `platform` and `renderer` fall back to [`FINGERPRINT_PLACEHOLDER`];
/// `audio` carries the probe outcome verbatim: its value, its sentinel,
/// or the missing-constructor sentinel when the probe was never scheduled.
fn raw_fingerprint_json(report: &ProbeReport) -> Result<String, HiveHydeError> {
    let platform = report
        .platform()
        .map(|profile| profile.platform.as_str())
        .unwrap_or(FINGERPRINT_PLACEHOLDER);
    let renderer = report
        .graphics()
        .map(|adapter| adapter.renderer.as_str())
        .unwrap_or(FINGERPRINT_PLACEHOLDER);
    let audio = match report.outcome(ProbeName::Audio) {
        Some(ProbeOutcome::Value(ProbeValue::Text(text))) => text.as_str(),
        Some(ProbeOutcome::Fault(fault)) => fault.as_str(),
        _ => ProbeFault::NoOfflineContext.as_str(),
    };

    serde_json::to_string(&RawFingerprint {
        platform,
        renderer,
        audio,
    })
    .map_err(|_| HiveHydeError::Signing {
        context: "fingerprint json",
    })
}
