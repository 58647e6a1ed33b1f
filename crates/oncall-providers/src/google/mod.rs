//! Google provider implementation.
//!
//! Shift events come from the Calendar API v3 and contact details from the
//! People API. Both use one OAuth token set.
//!
//! # Authentication Flow
//!
//! 1. User provides their own OAuth client ID/secret (required by Google)
//! 2. Provider binds a loopback listener and opens the consent page
//! 3. Google redirects to the loopback listener with the authorization code
//! 4. Provider exchanges the code for access and refresh tokens
//! 5. Tokens are persisted and refreshed when they expire
//!
//! # Example
//!
//! ```ignore
//! use oncall_providers::google::{GoogleProvider, GoogleConfig, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::new(
//!     "your-client-id.apps.googleusercontent.com",
//!     "your-client-secret",
//! );
//!
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials))?;
//!
//! if provider.needs_reauth() {
//!     provider.authenticate().await?;
//! }
//!
//! let events = provider.list_events("team-oncall@group.calendar.google.com").await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::{CalendarListEntry, GoogleApiClient, calendar_id_from};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::GoogleProvider;
pub use tokens::{TokenInfo, TokenStorage};
