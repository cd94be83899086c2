use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::canonical;
use crate::engine::{RiskMatrix, SignaturePackage};
use crate::error::HiveHydeError;

/// Signature header names, in injection order.
pub const HEADER_TIMESTAMP: &str = "X-Hive-Timestamp";
pub const HEADER_NONCE: &str = "X-Hive-Nonce";
pub const HEADER_SIGNATURE: &str = "X-Hive-Signature";
pub const HEADER_TOKEN: &str = "X-Hive-Token";
pub const HEADER_RISK_SCORE: &str = "X-Hive-RiskScore";
pub const HEADER_FINGERPRINT: &str = "X-Hive-Fingerprint-Json";

/// Renders a signature package as header pairs.
///
/// Exposed so hosts on transports other than the built-in sentinel can
/// inject the bundle themselves.
pub fn signature_headers(package: &SignaturePackage) -> [(&'static str, String); 6] {
    [
        (HEADER_TIMESTAMP, package.timestamp_ms.to_string()),
        (HEADER_NONCE, package.nonce.clone()),
        (HEADER_SIGNATURE, package.signature.clone()),
        (HEADER_TOKEN, package.token.clone()),
        (HEADER_RISK_SCORE, package.risk_score.to_string()),
        (HEADER_FINGERPRINT, package.encrypted_fingerprint.clone()),
    ]
}

/// One outbound request as the sentinel sees it.
///
/// `params` carries query parameters for GET and the JSON body otherwise;
/// only requests with `protect` set are signed.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub params: Value,
    pub protect: bool,
}

impl OutboundRequest {
    /// Starts an unprotected request with no params.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        OutboundRequest {
            method,
            url: url.into(),
            params: Value::Null,
            protect: false,
        }
    }

    /// Sets the query parameters (GET) or JSON body (other methods).
    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Marks the request for signing.
    pub fn protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }
}

/// Request-integration adapter around one `reqwest::Client`.
///
/// Protected requests are signed before dispatch and cancelled (never
/// sent) when signing fails; unprotected requests pass through untouched.
pub struct ApiSentinel {
    engine: Arc<RiskMatrix>,
    http: reqwest::Client,
    base_url: Url,
}

impl ApiSentinel {
    pub(crate) fn new(engine: Arc<RiskMatrix>, http: reqwest::Client, base_url: Url) -> Self {
        ApiSentinel {
            engine,
            http,
            base_url,
        }
    }

    /// The path component a request URL signs under: the base URL and
    /// request URL joined, slashes normalized, query and fragment
    /// stripped. Absolute request URLs keep their own path.
    pub fn derive_path(&self, raw_url: &str) -> Result<String, HiveHydeError> {
        let target = resolve_target(&self.base_url, raw_url)?;
        Ok(normalize_path(target.path()))
    }

    /// Dispatches one request, signing it first when it is protected.
    ///
    /// A signing failure cancels the request (nothing reaches the
    /// network) and surfaces to the caller; later requests are
    /// unaffected.
    pub async fn execute(
        &self,
        request: OutboundRequest,
    ) -> Result<reqwest::Response, HiveHydeError> {
        let target = resolve_target(&self.base_url, &request.url)?;
        let mut builder = self.http.request(request.method.clone(), target.clone());

        if request.method == Method::GET {
            let pairs = query_pairs(&request.params);
            if !pairs.is_empty() {
                builder = builder.query(&pairs);
            }
        } else if !request.params.is_null() {
            builder = builder.json(&request.params);
        }

        if request.protect {
            let path = normalize_path(target.path());
            let package = self
                .engine
                .sign_request(request.method.as_str(), &path, &request.params)
                .await?;
            debug!(%path, risk_score = package.risk_score, "injecting signature headers");
            for (name, value) in signature_headers(&package) {
                builder = builder.header(name, value);
            }
        }

        builder
            .send()
            .await
            .map_err(|source| HiveHydeError::Transport { source })
    }
}

/// Resolves a request URL against the base URL. Absolute URLs stand
/// alone; relative ones are joined onto the base with duplicate slashes
/// collapsed at the seam.
pub(crate) fn resolve_target(base_url: &Url, raw_url: &str) -> Result<Url, HiveHydeError> {
    if let Ok(absolute) = Url::parse(raw_url) {
        return Ok(absolute);
    }
    let joined = format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        raw_url.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|source| HiveHydeError::RequestUrl {
        url: raw_url.to_string(),
        source,
    })
}

pub(crate) fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn query_pairs(params: &Value) -> Vec<(String, String)> {
    params
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), canonical::scalar_text(value)))
                .collect()
        })
        .unwrap_or_default()
}
