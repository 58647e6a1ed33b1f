//! The shift calendar resolver.
//!
//! [`ShiftCalendar`] answers "who is on call right now". It syncs once per
//! instance: shifts and people come from the remote provider when it answers,
//! otherwise from the local cache files.
//!
//! ```text
//!            sync()
//!   NotSynced ──────┬──▶ Synced(Remote)   remote ok, cache rewritten
//!                   ├──▶ Synced(Cache)    cache fresh, or remote failed
//!                   └──▶ Failed           no match, or nothing to fall back to
//! ```
//!
//! Every query syncs first, so callers never see an empty calendar just
//! because they forgot to call [`ShiftCalendar::sync`]. The remote calendar is
//! asked at most once: a failed sync is latched and replayed to later queries.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};
use oncall_core::{Person, Shift};
use oncall_providers::{ContactRecord, OnCallProvider, RawEvent};
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::config::CalendarConfig;
use crate::error::{CalendarError, CalendarResult};

/// Where the in-memory shift data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    /// Fetched from the remote calendar during this run.
    Remote,
    /// Read from the local cache files.
    Cache,
}

/// Sync progress of a [`ShiftCalendar`]. Only `NotSynced` ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NotSynced,
    Synced(SyncSource),
    Failed,
}

/// Builds a person from a contacts entry.
///
/// The email is the address flagged primary. The phone is the number whose
/// label comes first in `phone_types`.
pub fn person_from_contact<S: AsRef<str>>(
    query: &str,
    contact: &ContactRecord,
    phone_types: &[S],
) -> Person {
    Person::resolved(
        query,
        contact.primary_email().map(str::to_string),
        contact.preferred_phone(phone_types).map(str::to_string),
    )
}

/// Resolves shifts and the people behind them.
pub struct ShiftCalendar {
    config: CalendarConfig,
    cache: CacheStore,
    provider: Box<dyn OnCallProvider>,
    state: SyncState,
    failure: Option<CalendarError>,
    shifts: Vec<Shift>,
    people: HashMap<String, Person>,
}

impl ShiftCalendar {
    /// Creates a resolver. Nothing is read or fetched until the first query.
    pub fn new(config: CalendarConfig, provider: Box<dyn OnCallProvider>) -> Self {
        let cache = CacheStore::new(&config.calendar_file, &config.contacts_file);
        Self {
            config,
            cache,
            provider,
            state: SyncState::NotSynced,
            failure: None,
            shifts: Vec::new(),
            people: HashMap::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Returns the cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the remote provider.
    pub fn provider(&self) -> &dyn OnCallProvider {
        self.provider.as_ref()
    }

    /// Returns the sync state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Returns the known shifts. Empty until synced.
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Returns the known people, keyed by query.
    pub fn people(&self) -> &HashMap<String, Person> {
        &self.people
    }

    /// Loads shift data and returns the number of shifts.
    ///
    /// Uses the cache when it is fresher than the configured window, tries the
    /// remote calendar otherwise and falls back to the cache when the remote
    /// side fails. Only the first call does any work: later calls return the
    /// same count, or the same error.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::NoMatch`] when a shift title has no contact. Nothing
    ///   is written and no shifts are loaded.
    /// - [`CalendarError::Unavailable`] when the remote side failed and the
    ///   cache cannot be read either.
    pub async fn sync(&mut self) -> CalendarResult<usize> {
        match self.state {
            SyncState::Synced(_) => return Ok(self.shifts.len()),
            SyncState::Failed => {
                if let Some(ref failure) = self.failure {
                    debug!("replaying failed sync: {}", failure);
                    return Err(failure.clone());
                }
            }
            SyncState::NotSynced => {}
        }

        match self.sync_once().await {
            Ok(count) => Ok(count),
            Err(e) => {
                self.state = SyncState::Failed;
                self.failure = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn sync_once(&mut self) -> CalendarResult<usize> {
        let cached_shifts = self.cache.load_shifts();
        let cached_people = self.cache.load_people();

        if let (Ok(shifts), Ok(people)) = (&cached_shifts, &cached_people)
            && self.cache_is_fresh()
        {
            warn!(
                shifts = shifts.len(),
                "cache is fresh, skipping remote sync"
            );
            let (shifts, people) = (shifts.clone(), people.clone());
            self.adopt(shifts, people, SyncSource::Cache);
            return Ok(self.shifts.len());
        }

        match self.fetch_remote().await {
            Ok((mut shifts, people)) => {
                shifts.sort_by_key(|s| s.start);
                if let Err(e) = self.cache.save_shifts(&shifts) {
                    error!("failed to update shift cache: {}", e);
                }
                if let Err(e) = self.cache.save_people(people.values()) {
                    error!("failed to update contacts cache: {}", e);
                }
                info!(
                    shifts = shifts.len(),
                    people = people.len(),
                    "synced from {}",
                    self.provider.name()
                );
                self.shifts = shifts;
                self.people = people;
                self.state = SyncState::Synced(SyncSource::Remote);
            }
            Err(CalendarError::RemoteFetch(remote)) => {
                error!("remote sync failed, using cache: {}", remote);
                match (cached_shifts, cached_people) {
                    (Ok(shifts), Ok(people)) => {
                        self.adopt(shifts, people, SyncSource::Cache);
                    }
                    (Err(cache), _) | (_, Err(cache)) => {
                        return Err(CalendarError::Unavailable { remote, cache });
                    }
                }
            }
            Err(other) => return Err(other),
        }

        Ok(self.shifts.len())
    }

    fn cache_is_fresh(&self) -> bool {
        if self.config.cache_freshness.is_zero() {
            return false;
        }
        match self.cache.age() {
            Ok(age) => age < self.config.cache_freshness,
            Err(e) => {
                debug!("cannot tell cache age: {}", e);
                false
            }
        }
    }

    fn adopt(&mut self, shifts: Vec<Shift>, people: Vec<Person>, source: SyncSource) {
        self.shifts = shifts;
        self.people = people
            .into_iter()
            .map(|p| (p.query.clone(), p))
            .collect();
        self.state = SyncState::Synced(source);
    }

    /// Fetches all shifts and resolves one person per distinct title.
    async fn fetch_remote(&self) -> CalendarResult<(Vec<Shift>, HashMap<String, Person>)> {
        let events = self.provider.list_events(&self.config.calendar_url).await?;
        let shifts: Vec<Shift> = events.into_iter().map(RawEvent::into_shift).collect();

        let mut people = HashMap::new();
        for shift in &shifts {
            if let Entry::Vacant(slot) = people.entry(shift.title.clone()) {
                let person = self.lookup(&shift.title).await?;
                slot.insert(person);
            }
        }

        Ok((shifts, people))
    }

    async fn lookup(&self, query: &str) -> CalendarResult<Person> {
        let contact = self
            .provider
            .find_contact(query)
            .await
            .map_err(|e| CalendarError::from_lookup(query, e))?;
        debug!(query, contact = ?contact.name, "resolved contact");
        Ok(person_from_contact(
            query,
            &contact,
            &self.config.phone_types,
        ))
    }

    /// Returns the shift covering the current time.
    pub async fn current_shift(&mut self) -> CalendarResult<Option<Shift>> {
        self.current_shift_at(Utc::now()).await
    }

    /// Returns the first shift with `start < now < end`.
    pub async fn current_shift_at(&mut self, now: DateTime<Utc>) -> CalendarResult<Option<Shift>> {
        self.sync().await?;
        let shift = self.shifts.iter().find(|s| s.is_current_at(now)).cloned();
        if shift.is_none() {
            error!(%now, shifts = self.shifts.len(), "no shift covers the current time");
        }
        Ok(shift)
    }

    /// Returns the person on the current shift.
    pub async fn current_person(&mut self) -> CalendarResult<Option<Person>> {
        self.current_person_at(Utc::now()).await
    }

    /// Returns the person on the shift covering `now`, if there is one.
    pub async fn current_person_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> CalendarResult<Option<Person>> {
        match self.current_shift_at(now).await? {
            Some(shift) => self.person(&shift.title).await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns the shift that starts last.
    pub async fn last_shift(&mut self) -> CalendarResult<Option<Shift>> {
        self.sync().await?;
        Ok(self.shifts.iter().max_by_key(|s| s.start).cloned())
    }

    /// Returns the person for `query`, asking the contacts directory only
    /// when the query is not known yet.
    pub async fn person(&mut self, query: &str) -> CalendarResult<Person> {
        self.sync().await?;
        if let Some(person) = self.people.get(query) {
            return Ok(person.clone());
        }

        let person = self.lookup(query).await?;
        self.people.insert(query.to_string(), person.clone());
        Ok(person)
    }
}
