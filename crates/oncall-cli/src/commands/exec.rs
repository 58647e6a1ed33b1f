//! `exec`: run a notification command addressed to whoever is on call.
//!
//! Meant to sit in front of a monitoring system's notification command. Any
//! argument that is exactly one of the placeholders below is replaced with the
//! on-call person's details; everything else is passed through untouched.
//! The child inherits stdin, stdout and stderr, and its exit status becomes
//! ours.

use std::process::ExitStatus;

use chrono::{DateTime, Utc};
use oncall_calendar::ShiftCalendar;
use oncall_core::Person;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult, EX_FAILURE};

/// Replaced with the on-call person's email address.
pub const EMAIL_PLACEHOLDER: &str = "ONCALL_EMAIL_ADDRESS";

/// Replaced with the on-call person's phone number.
pub const PHONE_PLACEHOLDER: &str = "ONCALL_PHONE";

/// Returns `args` with every placeholder argument replaced.
///
/// Fails with [`ClientError::MissingField`] when a placeholder is used and the
/// person has no value for it.
pub fn substitute(args: &[String], person: &Person) -> ClientResult<Vec<String>> {
    args.iter()
        .map(|arg| {
            let value = match arg.as_str() {
                EMAIL_PLACEHOLDER => person.email.as_deref(),
                PHONE_PLACEHOLDER => person.phone.as_deref(),
                _ => return Ok(arg.clone()),
            };
            value.map(str::to_string).ok_or_else(|| ClientError::MissingField {
                query: person.query.clone(),
                field: arg.clone(),
            })
        })
        .collect()
}

/// Runs `command` for the person on call at `now` and returns the exit code
/// to leave with.
///
/// With `shell`, the substituted arguments are joined with spaces and handed
/// to `sh -c`, for command lines that rely on shell syntax.
pub async fn run_at(
    calendar: &mut ShiftCalendar,
    command: &[String],
    shell: bool,
    now: DateTime<Utc>,
) -> ClientResult<u8> {
    let person = calendar
        .current_person_at(now)
        .await?
        .ok_or(ClientError::NoCurrentPerson)?;
    let args = substitute(command, &person)?;

    let (program, rest) = args
        .split_first()
        .ok_or_else(|| ClientError::Usage("no command given".to_string()))?;
    let mut child = if shell {
        let mut child = Command::new("sh");
        child.arg("-c").arg(args.join(" "));
        child
    } else {
        let mut child = Command::new(program);
        child.args(rest);
        child
    };

    info!(query = %person.query, program = %program, "running notification command");
    let status = child
        .status()
        .await
        .map_err(|source| ClientError::Spawn {
            program: program.clone(),
            source,
        })?;
    debug!(%status, "notification command finished");
    Ok(exit_code(status))
}

/// Maps a child's status to our exit code. A child killed by a signal exits
/// with `128 + signal`, as a shell would report it.
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(EX_FAILURE);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(EX_FAILURE);
        }
    }

    EX_FAILURE
}
