//! Bearer credentials for outgoing requests
//!
//! The credential is opaque to this crate. Providers are injected into
//! the client rather than looked up from ambient state.

/// Supplies the bearer credential attached to each request.
pub trait CredentialProvider: Send + Sync {
    /// The current credential, or `None` for anonymous requests.
    fn bearer(&self) -> Option<String>;
}

/// A fixed credential, typically a CMS API token.
#[derive(Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.0.is_some() { "<redacted>" } else { "<none>" };
        f.debug_tuple("StaticCredential").field(&shown).finish()
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the credential from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredential {
    fn bearer(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
