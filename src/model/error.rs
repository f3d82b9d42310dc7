use std::fmt;

use thiserror::Error;

/// What the caller should offer the user after a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerAction {
    Reauthenticate,
    Retry,
}

impl CallerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerAction::Reauthenticate => "reauthenticate",
            CallerAction::Retry => "retry",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("no valid credential for the completion service")]
    CredentialMissing,
    #[error("completion service returned output that could not be parsed")]
    MalformedResponse,
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::CredentialMissing => "credential_missing",
            GatewayError::MalformedResponse => "malformed_response",
            GatewayError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    pub fn action(&self) -> CallerAction {
        match self {
            GatewayError::CredentialMissing => CallerAction::Reauthenticate,
            GatewayError::MalformedResponse | GatewayError::ServiceUnavailable(_) => {
                CallerAction::Retry
            }
        }
    }

    /// Maps a failed outbound call onto the caller-facing taxonomy.
    pub fn classify(err: UpstreamError) -> Self {
        if err.is_auth_failure() {
            GatewayError::CredentialMissing
        } else {
            GatewayError::ServiceUnavailable(err.to_string())
        }
    }
}

/// Provider status strings that mean the key was rejected.
const AUTH_STATUSES: &[&str] = &["UNAUTHENTICATED", "PERMISSION_DENIED"];
/// Provider error-detail reasons that mean the key was rejected.
const AUTH_REASONS: &[&str] = &["API_KEY_INVALID", "API_KEY_EXPIRED", "API_KEY_SERVICE_BLOCKED"];
/// Compatibility shim: messages the provider has been seen to return for a bad key
/// without any structured signal. Known fragile; only consulted when the status,
/// provider status and reasons say nothing.
const AUTH_MESSAGE_HINTS: &[&str] = &["API key not valid", "Requested entity was not found"];

/// A failed call to the completion service, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamError {
    /// HTTP status, absent for transport failures.
    pub status: Option<u16>,
    /// Structured provider status such as `UNAUTHENTICATED`.
    pub provider_status: Option<String>,
    pub reasons: Vec<String>,
    pub message: String,
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        if matches!(self.status, Some(401) | Some(403)) {
            return true;
        }
        if self
            .provider_status
            .as_deref()
            .is_some_and(|s| AUTH_STATUSES.contains(&s))
        {
            return true;
        }
        if self.reasons.iter().any(|r| AUTH_REASONS.contains(&r.as_str())) {
            return true;
        }
        let has_structured_signal = self.provider_status.is_some() || !self.reasons.is_empty();
        !has_structured_signal && AUTH_MESSAGE_HINTS.iter().any(|hint| self.message.contains(hint))
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.provider_status) {
            (Some(code), Some(status)) => write!(f, "HTTP {} {}: {}", code, status, self.message),
            (Some(code), None) => write!(f, "HTTP {}: {}", code, self.message),
            (None, _) => write!(f, "transport error: {}", self.message),
        }
    }
}

impl std::error::Error for UpstreamError {}
