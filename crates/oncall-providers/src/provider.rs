//! OnCallProvider trait definition.
//!
//! This module defines the [`OnCallProvider`] trait, the remote side of the
//! resolver: it lists shift events from a calendar and searches the contacts
//! directory for the person a shift title names.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::contact::ContactRecord;
use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// Information about a calendar.
#[derive(Debug, Clone)]
pub struct CalendarInfo {
    /// Unique identifier for the calendar.
    pub id: String,
    /// Human-readable name of the calendar.
    pub name: String,
    /// Description of the calendar, if available.
    pub description: Option<String>,
    /// Whether this is the primary calendar.
    pub is_primary: bool,
    /// The timezone of the calendar (IANA identifier).
    pub timezone: Option<String>,
}

impl CalendarInfo {
    /// Creates a new CalendarInfo with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_primary: false,
            timezone: None,
        }
    }

    /// Builder method to mark as primary.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    /// Builder method to set timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

/// A boxed future for async trait methods.
///
/// Using boxed futures keeps the trait object-safe, so the resolver can hold a
/// `Box<dyn OnCallProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The remote collaborator of the shift resolver.
///
/// # Implementation Notes
///
/// - Implementations should be `Send + Sync` for use in async contexts
/// - `list_events` handles pagination internally and skips cancelled events
/// - Authentication state should be managed internally
///
/// # Example Implementation
///
/// ```ignore
/// impl OnCallProvider for StaticProvider {
///     fn name(&self) -> &str { "static" }
///
///     fn list_events(&self, _calendar: &str) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
///         let events = self.events.clone();
///         Box::pin(async move { Ok(events) })
///     }
///     // ... other methods
/// }
/// ```
pub trait OnCallProvider: Send + Sync {
    /// Returns the name/type of this provider (e.g., "google").
    fn name(&self) -> &str;

    /// Lists every event of the shift calendar.
    ///
    /// `calendar` is a calendar ID or a full events URL.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network errors, authentication failures, etc.
    fn list_events<'a>(&'a self, calendar: &'a str)
    -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;

    /// Searches the contacts directory with free text.
    ///
    /// Entries come back in the order the directory ranks them. An empty list
    /// is not an error here.
    fn search_contacts<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>>;

    /// Finds the single contact for `query`.
    ///
    /// An empty search fails with [`ProviderErrorCode::NoMatch`]. With several
    /// matches a warning is logged and the first entry wins.
    ///
    /// [`ProviderErrorCode::NoMatch`]: crate::ProviderErrorCode::NoMatch
    fn find_contact<'a>(&'a self, query: &'a str) -> BoxFuture<'a, ProviderResult<ContactRecord>> {
        Box::pin(async move {
            let mut matches = self.search_contacts(query).await?;
            if matches.len() > 1 {
                warn!(
                    provider = self.name(),
                    query,
                    matches = matches.len(),
                    "ambiguous contact search, using the first match"
                );
            }
            if matches.is_empty() {
                return Err(ProviderError::no_match(format!(
                    "no contact matches {query:?}"
                ))
                .with_provider(self.name()));
            }
            Ok(matches.swap_remove(0))
        })
    }

    /// Lists available calendars.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;

    /// Checks if the provider is currently authenticated.
    fn is_authenticated(&self) -> bool;
}

/// A provider that always returns an error.
///
/// Used when the remote side cannot be constructed, so that the resolver still
/// runs off the local cache.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        self.error.clone().with_provider(&self.name)
    }
}

impl OnCallProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_events<'a>(
        &'a self,
        _calendar: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn search_contacts<'a>(
        &'a self,
        _query: &'a str,
    ) -> BoxFuture<'a, ProviderResult<Vec<ContactRecord>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn is_authenticated(&self) -> bool {
        false
    }
}
