//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod exec;
pub mod shifts;

use std::io::Write;

use oncall_calendar::ShiftCalendar;
use oncall_providers::{CalendarInfo, OnCallProvider};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds the Google provider from the `[google]` section.
#[cfg(feature = "google")]
pub fn google_provider(
    config: &ClientConfig,
) -> ClientResult<oncall_providers::google::GoogleProvider> {
    let settings = config.google.clone().unwrap_or_default();
    let provider_config = settings.to_provider_config()?;
    Ok(oncall_providers::google::GoogleProvider::new(provider_config)?)
}

/// Builds the configured provider.
pub fn provider(config: &ClientConfig) -> ClientResult<Box<dyn OnCallProvider>> {
    #[cfg(feature = "google")]
    {
        Ok(Box::new(google_provider(config)?))
    }

    #[cfg(not(feature = "google"))]
    {
        let _ = config;
        Ok(Box::new(oncall_providers::ErrorProvider::new(
            "none",
            oncall_providers::ProviderError::configuration("built without a calendar provider"),
        )))
    }
}

/// Opens the resolver for the query commands.
///
/// Stored credentials are required even when the answer ends up coming from
/// the cache: a missing token set means setup never ran.
pub fn open_calendar(config: &ClientConfig) -> ClientResult<ShiftCalendar> {
    config.oncall.validate()?;
    let provider = provider(config)?;
    calendar_with(config, provider)
}

/// Opens the resolver over an already built provider.
pub fn calendar_with(
    config: &ClientConfig,
    provider: Box<dyn OnCallProvider>,
) -> ClientResult<ShiftCalendar> {
    if !provider.is_authenticated() {
        return Err(ClientError::Config(
            "bad credentials, run `oncall sync` for initial setup".to_string(),
        ));
    }
    Ok(ShiftCalendar::new(
        config.oncall.to_calendar_config(),
        provider,
    ))
}

/// Prints calendars as title, underline and ID.
pub fn write_calendars(out: &mut impl Write, calendars: &[CalendarInfo]) -> ClientResult<()> {
    for calendar in calendars {
        let marker = if calendar.is_primary { " (primary)" } else { "" };
        let title = format!("{}{}", calendar.name, marker);
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", "-".repeat(title.chars().count()))?;
        writeln!(out, "{}", calendar.id)?;
        writeln!(out)?;
    }
    Ok(())
}
