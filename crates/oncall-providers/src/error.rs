//! Error types for remote provider operations.
//!
//! Every failure talking to the shift calendar or the contacts directory is a
//! [`ProviderError`]. The resolver treats them in two ways:
//!
//! - a *remote failure* (transport, credentials, quota, a response it cannot
//!   read) sends it to the local cache;
//! - a *data error* ([`ProviderErrorCode::NoMatch`]) means the remote side
//!   answered and the answer is unusable, so there is nothing to fall back to.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// What went wrong talking to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials are missing, invalid or expired.
    AuthenticationFailed,
    /// The account may not read the calendar or the contacts.
    AuthorizationFailed,
    /// Connection failure, timeout or DNS error.
    NetworkError,
    /// Quota exceeded.
    RateLimited,
    /// The service answered with a 5xx status.
    ServerError,
    /// The response could not be parsed or is missing required fields.
    InvalidResponse,
    /// The calendar does not exist (404).
    NotFound,
    /// The service rejected the request (400).
    BadRequest,
    /// Client ID, secret or calendar reference are missing or malformed.
    ConfigurationError,
    /// A contacts search returned no entries.
    NoMatch,
    /// Anything else, such as an HTTP client that cannot be built.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the remote side answered with unusable data.
    pub fn is_data_error(self) -> bool {
        self == Self::NoMatch
    }

    /// Returns true if the resolver should serve the local cache instead.
    pub fn falls_back_to_cache(self) -> bool {
        !self.is_data_error()
    }

    /// Returns the snake_case name used in messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::NoMatch => "no_match",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by a calendar or contacts provider.
///
/// Cloning is cheap: the underlying cause is shared, so a resolver can hand
/// the same failure to every later query.
#[derive(Debug, Clone, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<String>,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// An empty contacts search for `message`.
    pub fn no_match(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoMatch, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Tags the error with the provider that raised it.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// See [`ProviderErrorCode::is_data_error`].
    pub fn is_data_error(&self) -> bool {
        self.code.is_data_error()
    }

    /// See [`ProviderErrorCode::falls_back_to_cache`].
    pub fn falls_back_to_cache(&self) -> bool {
        self.code.falls_back_to_cache()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_match_is_a_data_error() {
        assert!(ProviderErrorCode::NoMatch.is_data_error());
        assert!(!ProviderErrorCode::NoMatch.falls_back_to_cache());

        for code in [
            ProviderErrorCode::AuthenticationFailed,
            ProviderErrorCode::NetworkError,
            ProviderErrorCode::RateLimited,
            ProviderErrorCode::ServerError,
            ProviderErrorCode::InvalidResponse,
            ProviderErrorCode::NotFound,
        ] {
            assert!(code.falls_back_to_cache(), "{code}");
            assert!(!code.is_data_error(), "{code}");
        }
    }

    #[test]
    fn error_code_names() {
        assert_eq!(
            ProviderErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(ProviderErrorCode::InvalidResponse.to_string(), "invalid_response");
        assert_eq!(ProviderErrorCode::NoMatch.as_str(), "no_match");
    }

    #[test]
    fn provider_error_accessors() {
        let err = ProviderError::authentication("token expired");
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "token expired");
        assert!(err.provider().is_none());
        assert!(err.falls_back_to_cache());

        let err = ProviderError::no_match("no contact matches \"Alice\"").with_provider("google");
        assert_eq!(err.provider(), Some("google"));
        assert!(err.is_data_error());
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::rate_limited("too many requests").with_provider("google");
        assert_eq!(
            err.to_string(),
            "[google] rate_limited: too many requests"
        );
    }

    #[test]
    fn clone_shares_source() {
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::internal("failed to store tokens").with_source(io_err);
        let copy = err.clone();

        assert_eq!(copy.code(), err.code());
        assert_eq!(copy.source().map(|s| s.to_string()), Some("disk full".to_string()));
    }
}
