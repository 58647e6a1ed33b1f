//! Shift commands: `sync`, `current` and `last-shift`.

use std::io::Write;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use oncall_calendar::{ShiftCalendar, SyncSource, SyncState};
use oncall_core::NONE_SENTINEL;
use tracing::info;

use crate::cli::PersonField;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Syncs shifts and contacts from Google.
///
/// Runs the OAuth flow first when there are no usable tokens. With no
/// calendar configured, the account's calendars are listed and the command
/// fails with a configuration error.
#[cfg(feature = "google")]
pub async fn sync(config: &ClientConfig, verbose: bool, out: &mut impl Write) -> ClientResult<()> {
    use oncall_providers::OnCallProvider;

    let provider = super::google_provider(config)?;
    if provider.needs_reauth() {
        info!("no usable tokens, starting authentication");
        writeln!(out, "A browser window will open for you to authorize access.")?;
        provider.authenticate().await?;
    }

    if config.oncall.calendar_url_missing() {
        writeln!(
            out,
            "No calendar URL configured! Set [oncall] calendar_url to one of the IDs below:\n"
        )?;
        let calendars = provider.list_calendars().await?;
        super::write_calendars(out, &calendars)?;
        return Err(ClientError::Config("calendar_url is not set".to_string()));
    }

    let calendar_config = config
        .oncall
        .to_calendar_config()
        .with_cache_freshness(StdDuration::ZERO);
    let mut calendar = ShiftCalendar::new(calendar_config, Box::new(provider));
    run_sync(&mut calendar, verbose, out).await.map(|_| ())
}

#[cfg(not(feature = "google"))]
pub async fn sync(config: &ClientConfig, verbose: bool, out: &mut impl Write) -> ClientResult<()> {
    let mut calendar = super::open_calendar(config)?;
    run_sync(&mut calendar, verbose, out).await.map(|_| ())
}

/// Syncs `calendar` and reports where the shifts ended up.
pub async fn run_sync(
    calendar: &mut ShiftCalendar,
    verbose: bool,
    out: &mut impl Write,
) -> ClientResult<usize> {
    let count = calendar.sync().await?;
    if verbose {
        let cache = calendar.cache();
        match calendar.state() {
            SyncState::Synced(SyncSource::Remote) => {
                writeln!(out, "Wrote {} shifts to {}", count, cache.shifts_path().display())?;
                writeln!(
                    out,
                    "Discovered contacts written to {}",
                    cache.people_path().display()
                )?;
            }
            _ => {
                writeln!(
                    out,
                    "Remote sync skipped or failed, {} shifts read from {}",
                    count,
                    cache.shifts_path().display()
                )?;
            }
        }
    }
    Ok(count)
}

/// Prints a field of the person on call at `now`.
pub async fn current_at(
    calendar: &mut ShiftCalendar,
    field: PersonField,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> ClientResult<()> {
    let person = calendar
        .current_person_at(now)
        .await?
        .ok_or(ClientError::NoCurrentPerson)?;

    let value = match field {
        PersonField::Email => person.email.as_deref(),
        PersonField::Phone => person.phone.as_deref(),
    };
    writeln!(out, "{}", value.unwrap_or(NONE_SENTINEL))?;
    Ok(())
}

/// Prints the days left until the last known shift ends.
pub async fn last_shift_at(
    calendar: &mut ShiftCalendar,
    now: DateTime<Utc>,
    verbose: bool,
    out: &mut impl Write,
) -> ClientResult<()> {
    let shift = calendar.last_shift().await?.ok_or(ClientError::NoShifts)?;
    writeln!(out, "{}", shift.days_until_end(now))?;

    if verbose {
        let person = calendar.person(&shift.title).await?;
        writeln!(out, "Person: {}", person.query)?;
        writeln!(
            out,
            "E-mail: {}",
            person.email.as_deref().unwrap_or(NONE_SENTINEL)
        )?;
        writeln!(
            out,
            "Phone#: {}",
            person.phone.as_deref().unwrap_or(NONE_SENTINEL)
        )?;
        writeln!(out, "Ends in {}", format_time_left(shift.time_left(now)))?;
    }
    Ok(())
}

/// Formats a duration as `[D day[s], ]H:MM:SS`.
///
/// Days are floored, so one hour ago reads `-1 day, 23:00:00`.
pub fn format_time_left(left: Duration) -> String {
    const SECS_PER_DAY: i64 = 86_400;

    let secs = left.num_seconds();
    let days = secs.div_euclid(SECS_PER_DAY);
    let rest = secs.rem_euclid(SECS_PER_DAY);
    let clock = format!("{}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);

    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}
