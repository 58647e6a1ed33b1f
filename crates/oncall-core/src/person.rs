//! Contact details for the owner of a shift.

use serde::{Deserialize, Serialize};

/// A person reachable through the contacts directory.
///
/// Keyed by the free-text `query` (a shift title) that was used to find them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// The search text used to find this person.
    pub query: String,
    /// Primary email address, if the contact has one.
    pub email: Option<String>,
    /// Preferred phone number, if the contact has one of the wanted labels.
    pub phone: Option<String>,
    /// Set once a remote lookup has populated this person in the current run.
    #[serde(skip)]
    resolved: bool,
}

impl Person {
    /// Creates a person that has not been looked up remotely.
    pub fn new(query: impl Into<String>, email: Option<String>, phone: Option<String>) -> Self {
        Self {
            query: query.into(),
            email,
            phone,
            resolved: false,
        }
    }

    /// Creates a person from a completed remote lookup.
    ///
    /// Both fields may still be empty when the matching contact has neither a
    /// primary email nor a preferred phone number.
    pub fn resolved(
        query: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            resolved: true,
            ..Self::new(query, email, phone)
        }
    }

    /// Returns true if a remote lookup populated this person.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}
