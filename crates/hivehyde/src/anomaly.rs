use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::host::{HostEnvironment, PermissionProbe, PermissionState};

/// Marker the host's user-function source sample must embed. A sample that
/// omits it has been rewritten by a `toString` hook.
pub const TOSTRING_PROBE_MARKER: &str = "hivehyde_tostring_probe";

/// Substrings that betray an automation framework in a stack trace.
pub const STACK_KEYWORDS: &[&str] = &["puppeteer", "webdriver", "phantom"];

/// Minimum frame count a genuine stack is expected to carry.
pub const MIN_STACK_FRAMES: usize = 3;

/// Verdict of the stack-shape check.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackVerdict {
    Clean,
    NoStack,
    ContainsKeyword,
    StackTooShort,
}

impl StackVerdict {
    /// True for every verdict except a clean stack.
    pub const fn is_anomalous(self) -> bool {
        !matches!(self, StackVerdict::Clean)
    }
}

/// Verdict of the notification-permission check.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionVerdict {
    /// Both the permissions query and the legacy API reported denied.
    Denied,
    NotDenied,
    NoPermissionsApi,
    PermissionsError,
}

/// Automation signals classified from raw host surfaces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub webdriver: bool,
    pub webdriver_tampered: bool,
    pub headless_chrome: bool,
    pub tostring_tampered: bool,
    pub stack_anomaly: StackVerdict,
    pub permissions_denied: PermissionVerdict,
}

/// Classifies the seven automation signals the risk scorer consumes.
#[derive(Clone)]
pub struct AnomalyScanner {
    host: Arc<dyn HostEnvironment>,
}

impl AnomalyScanner {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        AnomalyScanner { host }
    }

    /// Runs every check and returns the combined report. Checks never fail;
    /// an absent surface classifies as its benign value.
    pub async fn scan(&self) -> AnomalyReport {
        AnomalyReport {
            webdriver: self.host.webdriver_flag().unwrap_or(false),
            webdriver_tampered: self
                .host
                .webdriver_descriptor()
                .map(|descriptor| descriptor.configurable)
                .unwrap_or(false),
            headless_chrome: self
                .host
                .chrome_runtime()
                .map(|runtime| !runtime.has_callable_csi)
                .unwrap_or(false),
            tostring_tampered: self.classify_to_string(),
            stack_anomaly: classify_stack(self.host.stack_sample()),
            permissions_denied: classify_permission(self.host.notification_permission().await),
        }
    }

    fn classify_to_string(&self) -> bool {
        match self.host.to_string_samples() {
            None => false,
            Some(samples) => {
                !samples.builtin.contains("native code")
                    || !samples.user_function.contains(TOSTRING_PROBE_MARKER)
            }
        }
    }
}

fn classify_stack(sample: Option<String>) -> StackVerdict {
    let Some(stack) = sample else {
        return StackVerdict::NoStack;
    };
    let lowered = stack.to_lowercase();
    if STACK_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        return StackVerdict::ContainsKeyword;
    }
    if stack.lines().count() < MIN_STACK_FRAMES {
        return StackVerdict::StackTooShort;
    }
    StackVerdict::Clean
}

fn classify_permission(probe: PermissionProbe) -> PermissionVerdict {
    match probe {
        PermissionProbe::Unsupported => PermissionVerdict::NoPermissionsApi,
        PermissionProbe::Failed => PermissionVerdict::PermissionsError,
        PermissionProbe::States { query, legacy } => {
            if query == PermissionState::Denied && legacy == PermissionState::Denied {
                PermissionVerdict::Denied
            } else {
                PermissionVerdict::NotDenied
            }
        }
    }
}
