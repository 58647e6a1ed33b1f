//! Shift calendar resolver.
//!
//! This crate answers "who is on call":
//! - Syncs shift events from the remote calendar through an [`OnCallProvider`]
//! - Resolves each shift title to a person through the contacts directory
//! - Keeps plain-text cache files and falls back to them when the remote
//!   side cannot be reached
//!
//! # Example
//!
//! ```rust,no_run
//! use oncall_calendar::{CalendarConfig, ShiftCalendar};
//! # use oncall_providers::OnCallProvider;
//!
//! # async fn run(provider: Box<dyn OnCallProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = CalendarConfig::new(
//!     "team-oncall@group.calendar.google.com",
//!     "/var/cache/oncall/calendar.tsv",
//!     "/var/cache/oncall/contacts.tsv",
//! );
//! let mut calendar = ShiftCalendar::new(config, provider);
//!
//! if let Some(person) = calendar.current_person().await? {
//!     println!("{}", person.email.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`OnCallProvider`]: oncall_providers::OnCallProvider

mod cache;
mod calendar;
mod config;
mod error;

pub use cache::CacheStore;
pub use calendar::{ShiftCalendar, SyncSource, SyncState, person_from_contact};
pub use config::{CalendarConfig, DEFAULT_CACHE_FRESHNESS, DEFAULT_PHONE_TYPES};
pub use error::{CacheError, CacheResult, CalendarError, CalendarResult};
