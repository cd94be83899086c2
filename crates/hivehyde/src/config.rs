use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::error::HiveHydeError;
use crate::host::{DetachedHost, HostEnvironment};
use crate::policy::PolicyOverrides;
use crate::vault::{DEFAULT_REFRESH_BUFFER, DEFAULT_SESSION_LIFESPAN};
use crate::HiveHyde;

/// Builder for [`HiveHyde`].
///
/// `api_base_url` is the one required field; everything else defaults:
/// a [`DetachedHost`], the system clock, a fresh `reqwest` client, a
/// 30-minute session lifespan with a 2-minute refresh buffer, and no
/// policy overrides.
#[derive(Clone)]
pub struct HiveHydeBuilder {
    api_base_url: Option<String>,
    host: Option<Arc<dyn HostEnvironment>>,
    clock: Option<Arc<dyn Clock>>,
    http: Option<reqwest::Client>,
    session_lifespan: Duration,
    refresh_buffer: Duration,
    policy_overrides: PolicyOverrides,
}

impl HiveHydeBuilder {
    /// Starts a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL protected requests are signed against. Required.
    pub fn api_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api_base_url = (!base_url.trim().is_empty()).then_some(base_url);
        self
    }

    /// Supplies the host environment the probe fabric interrogates.
    /// Defaults to [`DetachedHost`] (every capability absent).
    pub fn host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = Some(host);
        self
    }

    /// Overrides the time source. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Supplies the `reqwest` client used for the session fetch and the
    /// sentinel transport.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Overrides how long an issued session key lives.
    pub fn session_lifespan(mut self, lifespan: Duration) -> Self {
        self.session_lifespan = lifespan;
        self
    }

    /// Overrides how long before expiry the silent refresh window opens.
    pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    /// Layers caller toggles over capability detection for the gated
    /// probes.
    pub fn policy_overrides(mut self, overrides: PolicyOverrides) -> Self {
        self.policy_overrides = overrides;
        self
    }

    /// Validates the configuration and returns an uninitialized handle.
    pub fn build(self) -> Result<HiveHyde, HiveHydeError> {
        let raw = self.api_base_url.ok_or(HiveHydeError::ConfigMissing)?;
        let base_url = Url::parse(&raw).map_err(|source| HiveHydeError::InvalidBaseUrl {
            url: raw,
            source,
        })?;
        Ok(HiveHyde::assemble(
            base_url,
            self.host.unwrap_or_else(|| Arc::new(DetachedHost)),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.http.unwrap_or_default(),
            self.session_lifespan,
            self.refresh_buffer,
            self.policy_overrides,
        ))
    }
}

impl Default for HiveHydeBuilder {
    fn default() -> Self {
        HiveHydeBuilder {
            api_base_url: None,
            host: None,
            clock: None,
            http: None,
            session_lifespan: DEFAULT_SESSION_LIFESPAN,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            policy_overrides: PolicyOverrides::default(),
        }
    }
}
