use thiserror::Error;

/// Errors that may occur while configuring, initializing, or signing with
/// the HiveHyde client.
#[derive(Debug, Error)]
pub enum HiveHydeError {
    #[error("`api_base_url` must be set before building the client")]
    ConfigMissing,
    #[error("api base URL `{url}` is invalid: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("hivehyde was used before `initialize` completed")]
    NotInitialized,
    #[error("session init request to `{url}` failed: {source}")]
    SessionRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("session init envelope rejected: {reason}")]
    SessionEnvelope { reason: String },
    #[error("no session key is available for signing")]
    SessionKeyUnavailable,
    #[error("session key is not 64 hex characters: {source}")]
    SessionKeyFormat {
        #[source]
        source: hex::FromHexError,
    },
    #[error("fingerprint ciphertext is not valid base64: {source}")]
    FingerprintDecode {
        #[source]
        source: base64::DecodeError,
    },
    #[error("fingerprint ciphertext failed to decrypt")]
    FingerprintDecrypt,
    #[error("outbound request URL `{url}` is invalid: {source}")]
    RequestUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to compose {context} while signing")]
    Signing { context: &'static str },
    #[error("failed to dispatch outbound request: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
}
