use std::fmt;

/// API key for the completion service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty or whitespace-only key.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Where the gateway gets its credential from when asked to refresh it.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Option<ApiKey>;
}

/// A fixed credential, resolved once at composition time.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<ApiKey>);

#[cfg(test)]
impl CredentialSource for StaticCredential {
    fn resolve(&self) -> Option<ApiKey> {
        self.0.clone()
    }
}
