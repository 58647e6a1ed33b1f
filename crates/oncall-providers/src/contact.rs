//! Contact records from the contacts directory.

use serde::{Deserialize, Serialize};

/// An email address attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub address: String,
    /// Whether the directory marks this as the contact's primary address.
    #[serde(default)]
    pub primary: bool,
}

/// A phone number attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub number: String,
    /// Free-form label such as `mobile` or `work`.
    #[serde(default)]
    pub label: Option<String>,
}

/// A single entry returned by a contacts search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Display name, used only for logging.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
    #[serde(default)]
    pub phones: Vec<ContactPhone>,
}

impl ContactRecord {
    /// Creates an empty contact record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method to add an email address.
    pub fn with_email(mut self, address: impl Into<String>, primary: bool) -> Self {
        self.emails.push(ContactEmail {
            address: address.into(),
            primary,
        });
        self
    }

    /// Builder method to add a phone number.
    pub fn with_phone(mut self, number: impl Into<String>, label: Option<&str>) -> Self {
        self.phones.push(ContactPhone {
            number: number.into(),
            label: label.map(str::to_string),
        });
        self
    }

    /// Returns the address flagged as primary, if any.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.primary)
            .map(|e| e.address.as_str())
    }

    /// Returns the number for the first label in `preference` that the
    /// contact has. Labels compare case-insensitively; unlabeled numbers never
    /// match.
    pub fn preferred_phone<S: AsRef<str>>(&self, preference: &[S]) -> Option<&str> {
        preference.iter().find_map(|wanted| {
            self.phones
                .iter()
                .find(|p| {
                    p.label
                        .as_deref()
                        .is_some_and(|l| l.eq_ignore_ascii_case(wanted.as_ref()))
                })
                .map(|p| p.number.as_str())
        })
    }
}
