//! Client error types and process exit codes.

use std::io;

use oncall_calendar::CalendarError;
use oncall_core::TracingError;
use oncall_providers::{ProviderError, ProviderErrorCode};
use thiserror::Error;

/// Successful termination.
pub const EX_OK: u8 = 0;
/// Anything that does not fit a more specific code.
pub const EX_FAILURE: u8 = 1;
/// The command was used incorrectly.
pub const EX_USAGE: u8 = 64;
/// The input data was incorrect, or there was nothing to report.
pub const EX_DATAERR: u8 = 65;
/// A required service is unavailable.
pub const EX_UNAVAILABLE: u8 = 69;
/// A child process could not be started.
pub const EX_OSERR: u8 = 71;
/// Something was found in an unconfigured or misconfigured state.
pub const EX_CONFIG: u8 = 78;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad command-line usage.
    #[error("usage error: {0}")]
    Usage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The resolver failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// A provider call made outside the resolver failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// No shift covers the current time.
    #[error("there is no current person")]
    NoCurrentPerson,

    /// The calendar holds no shifts at all.
    #[error("no shifts are known")]
    NoShifts,

    /// A placeholder needs a value the on-call person does not have.
    #[error("{query} has no value for {field}")]
    MissingField { query: String, field: String },

    /// The command given to `exec` could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Logging could not be set up.
    #[error("failed to set up logging: {0}")]
    Tracing(#[from] TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Returns the sysexits code `main` should exit with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EX_USAGE,
            Self::Config(_) | Self::Tracing(_) => EX_CONFIG,
            Self::NoCurrentPerson | Self::NoShifts | Self::MissingField { .. } => EX_DATAERR,
            Self::Spawn { .. } => EX_OSERR,
            Self::Calendar(err) => match err {
                CalendarError::NoMatch { .. } => EX_DATAERR,
                CalendarError::Unavailable { .. } => EX_UNAVAILABLE,
                CalendarError::RemoteFetch(remote) => provider_exit_code(remote),
                CalendarError::Cache(_) => EX_FAILURE,
            },
            Self::Provider(err) => provider_exit_code(err),
            Self::Io(_) => EX_FAILURE,
        }
    }
}

fn provider_exit_code(err: &ProviderError) -> u8 {
    match err.code() {
        ProviderErrorCode::AuthenticationFailed
        | ProviderErrorCode::AuthorizationFailed
        | ProviderErrorCode::ConfigurationError => EX_CONFIG,
        ProviderErrorCode::NoMatch => EX_DATAERR,
        ProviderErrorCode::NetworkError
        | ProviderErrorCode::RateLimited
        | ProviderErrorCode::ServerError => EX_UNAVAILABLE,
        _ => EX_FAILURE,
    }
}
