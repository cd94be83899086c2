use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::clock::Clock;
use crate::error::HiveHydeError;

/// Path of the session-issuing endpoint, relative to the API base URL.
pub const INIT_PATH: &str = "warden/init";

/// How long an issued session key lives.
pub const DEFAULT_SESSION_LIFESPAN: Duration = Duration::from_secs(30 * 60);

/// How long before expiry the silent refresh window opens.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(2 * 60);

#[derive(Clone, Debug, Default)]
struct SessionState {
    key: Option<String>,
    token: Option<String>,
    expires_at_ms: u64,
}

/// Holds the server-issued `(key, token)` pair and rotates it silently.
///
/// The key doubles as HMAC and AES material, so it never leaves process
/// memory and is cleared outright when an initialize fetch fails. Silent
/// refreshes are single-flighted through an async gate: concurrent
/// [`SessionVault::current_key`] callers never start a second fetch, and a
/// failed refresh is logged and swallowed so the previous key stays in
/// service until the next attempt.
pub struct SessionVault {
    http: reqwest::Client,
    init_url: Url,
    clock: Arc<dyn Clock>,
    lifespan_ms: u64,
    refresh_buffer_ms: u64,
    state: std::sync::Mutex<SessionState>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl SessionVault {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: &Url,
        clock: Arc<dyn Clock>,
        lifespan: Duration,
        refresh_buffer: Duration,
    ) -> Result<Self, HiveHydeError> {
        let joined = format!("{}/{}", base_url.as_str().trim_end_matches('/'), INIT_PATH);
        let init_url = Url::parse(&joined).map_err(|source| HiveHydeError::InvalidBaseUrl {
            url: joined,
            source,
        })?;
        Ok(SessionVault {
            http,
            init_url,
            clock,
            lifespan_ms: lifespan.as_millis() as u64,
            refresh_buffer_ms: refresh_buffer.as_millis() as u64,
            state: std::sync::Mutex::new(SessionState::default()),
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Acquires a fresh session. Failure clears any previously held key and
    /// propagates: protected requests cannot proceed without a first key.
    pub async fn initialize(&self) -> Result<(), HiveHydeError> {
        let _gate = self.refresh_gate.lock().await;
        match self.fetch_session().await {
            Ok(state) => {
                self.store(state);
                Ok(())
            }
            Err(error) => {
                self.store(SessionState::default());
                Err(error)
            }
        }
    }

    /// Current session key, after a silent refresh check.
    ///
    /// When the key has entered its refresh window, one caller fetches
    /// while the rest wait on the gate and re-check; a failed refresh is
    /// swallowed (the stale key is still returned) and the next caller
    /// re-attempts. `None` until a successful [`SessionVault::initialize`].
    pub async fn current_key(&self) -> Option<String> {
        if self.needs_refresh() {
            let _gate = self.refresh_gate.lock().await;
            if self.needs_refresh() {
                match self.fetch_session().await {
                    Ok(state) => self.store(state),
                    Err(error) => {
                        warn!(%error, "silent session refresh failed; keeping previous key");
                    }
                }
            }
        }
        self.snapshot().key
    }

    /// Cached session token; never performs I/O.
    pub fn current_token(&self) -> Option<String> {
        self.snapshot().token
    }

    /// Epoch-ms expiry of the held session; zero when none is held.
    pub fn expires_at_ms(&self) -> u64 {
        self.snapshot().expires_at_ms
    }

    fn needs_refresh(&self) -> bool {
        let state = self.snapshot();
        state.key.is_some()
            && self.clock.now_ms() >= state.expires_at_ms.saturating_sub(self.refresh_buffer_ms)
    }

    fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn store(&self, next: SessionState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    async fn fetch_session(&self) -> Result<SessionState, HiveHydeError> {
        debug!(url = %self.init_url, "requesting session material");
        let response = self
            .http
            .post(self.init_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| HiveHydeError::SessionRequest {
                url: self.init_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HiveHydeError::SessionEnvelope {
                reason: format!("unexpected status {status}"),
            });
        }

        let envelope: serde_json::Value =
            response
                .json()
                .await
                .map_err(|source| HiveHydeError::SessionRequest {
                    url: self.init_url.to_string(),
                    source,
                })?;

        if envelope.get("code").and_then(serde_json::Value::as_i64) != Some(0) {
            let msg = envelope
                .get("msg")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            return Err(HiveHydeError::SessionEnvelope {
                reason: format!("code {:?}, msg {msg:?}", envelope.get("code")),
            });
        }
        let payload = envelope
            .get("data")
            .ok_or_else(|| HiveHydeError::SessionEnvelope {
                reason: "missing `data`".to_string(),
            })?;
        let key = payload
            .get("key")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| HiveHydeError::SessionEnvelope {
                reason: "missing or non-string `data.key`".to_string(),
            })?
            .to_string();
        let token = payload
            .get("token")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| HiveHydeError::SessionEnvelope {
                reason: "missing or non-string `data.token`".to_string(),
            })?
            .to_string();

        let now = self.clock.now_ms();
        debug!("session material acquired");
        Ok(SessionState {
            key: Some(key),
            token: Some(token),
            expires_at_ms: now + self.lifespan_ms,
        })
    }
}
