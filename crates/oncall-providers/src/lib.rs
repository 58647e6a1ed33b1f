//! OnCallProvider trait and implementations.
//!
//! This crate provides the remote side of the on-call resolver:
//!
//! - [`OnCallProvider`] - The trait the resolver talks to
//! - [`RawEvent`] - A shift event as the calendar returned it
//! - [`ContactRecord`] - A contacts directory entry
//! - [`ProviderError`] - Error type for every remote operation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ Calendar API v3  │   │    People API    │
//! └────────┬─────────┘   └────────┬─────────┘
//!          │                      │
//!          └──────────┬───────────┘
//!                     ▼
//!            ┌─────────────────┐
//!            │ GoogleProvider  │
//!            └────────┬────────┘
//!                     │ OnCallProvider
//!          ┌──────────┴───────────┐
//!          ▼                      ▼
//!   ┌─────────────┐       ┌───────────────┐
//!   │  RawEvent   │       │ ContactRecord │
//!   └─────────────┘       └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use oncall_providers::OnCallProvider;
//!
//! async fn shifts(provider: &dyn OnCallProvider) -> ProviderResult<Vec<Shift>> {
//!     let events = provider.list_events("team-oncall@group.calendar.google.com").await?;
//!     Ok(events.into_iter().map(RawEvent::into_shift).collect())
//! }
//! ```

pub mod contact;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod provider;
pub mod raw_event;

// Re-export main types at crate root
pub use contact::{ContactEmail, ContactPhone, ContactRecord};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, CalendarInfo, ErrorProvider, OnCallProvider};
pub use raw_event::{RawEvent, RawEventTime};
