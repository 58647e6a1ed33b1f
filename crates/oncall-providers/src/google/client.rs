//! Google Calendar and People API client.
//!
//! This module provides a low-level HTTP client for the two Google APIs the
//! resolver needs, handling authentication, request building, and response
//! parsing.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::contact::{ContactEmail, ContactPhone, ContactRecord};
use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Base URL for the People API v1.
const PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";

/// Fields requested from the People API for each contact.
const PEOPLE_READ_MASK: &str = "names,emailAddresses,phoneNumbers";

/// Largest page the events endpoint accepts.
const EVENTS_PAGE_SIZE: u32 = 2500;

/// Largest result count the contacts search accepts.
const CONTACTS_PAGE_SIZE: u32 = 30;

/// Extracts the calendar ID from a configured calendar reference.
///
/// Accepts a bare calendar ID, an API events URL
/// (`https://www.googleapis.com/calendar/v3/calendars/<id>/events`) or a legacy
/// feed URL (`https://www.google.com/calendar/feeds/<id>/private/full`).
pub fn calendar_id_from(reference: &str) -> ProviderResult<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ProviderError::configuration("calendar reference is empty"));
    }
    if !reference.starts_with("http://") && !reference.starts_with("https://") {
        return Ok(reference.to_string());
    }

    let url = Url::parse(reference).map_err(|e| {
        ProviderError::configuration(format!("invalid calendar URL {reference:?}"))
            .with_source(e)
    })?;
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

    let encoded = match segments.as_slice() {
        ["calendar", "v3", "calendars", id, ..] => *id,
        ["calendar", "feeds", id, ..] => *id,
        _ => {
            return Err(ProviderError::configuration(format!(
                "calendar URL {reference:?} does not name a calendar"
            )));
        }
    };
    let id = urlencoding::decode(encoded).map_err(|e| {
        ProviderError::configuration(format!("invalid calendar ID in {reference:?}"))
            .with_source(e)
    })?;
    Ok(id.into_owned())
}

/// Google Calendar and People API client.
#[derive(Debug)]
pub struct GoogleApiClient {
    http_client: reqwest::Client,
    access_token: String,
    calendar_api: String,
    people_api: String,
    /// Set once the contacts search cache has been warmed up.
    contacts_warm: OnceCell<()>,
}

impl GoogleApiClient {
    /// Creates a new client with the given access token.
    pub fn new(
        access_token: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            calendar_api: CALENDAR_API_BASE.to_string(),
            people_api: PEOPLE_API_BASE.to_string(),
            contacts_warm: OnceCell::new(),
        })
    }

    /// Points both APIs at `base`, for tests against a local server.
    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.calendar_api = base.to_string();
        self.people_api = base.to_string();
        self
    }

    /// Updates the access token (after refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Lists every event of a calendar, expanding recurring events.
    ///
    /// Follows `nextPageToken` until the last page. Cancelled events are
    /// skipped; any other event without a usable time window fails the whole
    /// listing with [`ProviderError::invalid_response`].
    pub async fn list_events(&self, calendar_id: &str) -> ProviderResult<Vec<RawEvent>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(calendar_id, page_token.as_deref())
                .await?;

            for item in page.items {
                if let Some(event) = convert_event(item)? {
                    all_events.push(event);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            calendar = calendar_id,
            events = all_events.len(),
            "fetched shift events"
        );
        Ok(all_events)
    }

    /// Fetches a single page of events.
    async fn list_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let url = format!(
            "{}/calendars/{}/events",
            self.calendar_api,
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("singleEvents", "true".to_string()),
                ("maxResults", EVENTS_PAGE_SIZE.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(request_error)?;
        let body = read_body(response, "calendar").await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse events response: {}", e))
        })
    }

    /// Searches the authenticated user's contacts with free text.
    ///
    /// The first search on a client is preceded by one with an empty query:
    /// the People API serves searches from a cache that stays stale, or
    /// empty, until such a request has been made.
    pub async fn search_contacts(&self, query: &str) -> ProviderResult<Vec<ContactRecord>> {
        self.contacts_warm
            .get_or_try_init(|| async {
                debug!("warming up contacts search");
                self.send_contacts_search("").await.map(|_| ())
            })
            .await?;

        let results = self.send_contacts_search(query).await?;
        let contacts: Vec<ContactRecord> = results
            .results
            .into_iter()
            .map(|r| convert_person(r.person))
            .collect();
        debug!(query, matches = contacts.len(), "searched contacts");
        Ok(contacts)
    }

    async fn send_contacts_search(&self, query: &str) -> ProviderResult<SearchResponse> {
        let url = format!("{}/people:searchContacts", self.people_api);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("query", query.to_string()),
                ("readMask", PEOPLE_READ_MASK.to_string()),
                ("pageSize", CONTACTS_PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .map_err(request_error)?;
        let body = read_body(response, "contacts").await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse contacts response: {}", e))
        })
    }

    /// Lists available calendars.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.calendar_api);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(request_error)?;
        let body = read_body(response, "calendar list").await?;

        let list: CalendarListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        Ok(list.items)
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

/// Maps the response status to a provider error and returns the body text.
async fn read_body(response: reqwest::Response, resource: &str) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::authentication(
            "access token expired or invalid",
        ));
    }

    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::authorization(format!(
            "access denied to {}",
            resource
        )));
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::not_found(format!("{} not found", resource)));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = format!("API error ({}): {}", status, body);
        return Err(if status.is_client_error() {
            ProviderError::bad_request(error)
        } else {
            ProviderError::server(error)
        });
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok("{}".to_string());
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))
}

/// Converts a Google Calendar API event to a RawEvent.
///
/// Returns `Ok(None)` for cancelled events.
fn convert_event(event: ApiEvent) -> ProviderResult<Option<RawEvent>> {
    if event.status.as_deref() == Some("cancelled") {
        return Ok(None);
    }

    let id = event
        .id
        .ok_or_else(|| ProviderError::invalid_response("event without an id"))?;
    let start = parse_event_time(&id, "start", &event.start)?;
    let end = parse_event_time(&id, "end", &event.end)?;

    let mut raw_event = RawEvent::new(id, event.summary.unwrap_or_default(), start, end);
    raw_event.status = event.status;
    Ok(Some(raw_event))
}

fn parse_event_time(id: &str, field: &str, time: &ApiEventTime) -> ProviderResult<RawEventTime> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
            .map(|parsed| RawEventTime::DateTime(parsed.with_timezone(&Utc)))
            .map_err(|e| {
                ProviderError::invalid_response(format!(
                    "event {id} has an invalid {field} time {dt:?}"
                ))
                .with_source(e)
            }),
        (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(RawEventTime::Date)
            .map_err(|e| {
                ProviderError::invalid_response(format!(
                    "event {id} has an invalid {field} date {date:?}"
                ))
                .with_source(e)
            }),
        (None, None) => Err(ProviderError::invalid_response(format!(
            "event {id} has no {field} time"
        ))),
    }
}

/// Converts a People API person to a ContactRecord.
fn convert_person(person: ApiPerson) -> ContactRecord {
    ContactRecord {
        name: person
            .names
            .into_iter()
            .find_map(|n| n.display_name),
        emails: person
            .email_addresses
            .into_iter()
            .filter_map(|e| {
                Some(ContactEmail {
                    address: e.value?,
                    primary: e.metadata.is_some_and(|m| m.primary),
                })
            })
            .collect(),
        phones: person
            .phone_numbers
            .into_iter()
            .filter_map(|p| {
                Some(ContactPhone {
                    number: p.value?,
                    label: p.kind.or(p.formatted_type),
                })
            })
            .collect(),
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    status: Option<String>,
}

/// Event time from the API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Response from people:searchContacts.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    person: ApiPerson,
}

/// A person resource, limited to the fields in the read mask.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPerson {
    #[serde(default)]
    names: Vec<ApiName>,
    #[serde(default)]
    email_addresses: Vec<ApiEmailAddress>,
    #[serde(default)]
    phone_numbers: Vec<ApiPhoneNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiName {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFieldMetadata {
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Deserialize)]
struct ApiEmailAddress {
    value: Option<String>,
    metadata: Option<ApiFieldMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPhoneNumber {
    value: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    formatted_type: Option<String>,
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

/// A calendar from the calendar list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    /// The calendar ID.
    pub id: String,
    /// The calendar summary (name).
    pub summary: String,
    /// The calendar description.
    pub description: Option<String>,
    /// Whether this is the primary calendar.
    #[serde(default)]
    pub primary: bool,
    /// The calendar timezone.
    pub time_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[test]
    fn calendar_id_from_bare_id() {
        assert_eq!(
            calendar_id_from(" team-oncall@group.calendar.google.com ").unwrap(),
            "team-oncall@group.calendar.google.com"
        );
    }

    #[test]
    fn calendar_id_from_api_url() {
        let url = "https://www.googleapis.com/calendar/v3/calendars/team-oncall%40group.calendar.google.com/events";
        assert_eq!(
            calendar_id_from(url).unwrap(),
            "team-oncall@group.calendar.google.com"
        );
    }

    #[test]
    fn calendar_id_from_legacy_feed_url() {
        let url = "https://www.google.com/calendar/feeds/abc123%40group.calendar.google.com/private/full";
        assert_eq!(
            calendar_id_from(url).unwrap(),
            "abc123@group.calendar.google.com"
        );
    }

    #[test]
    fn calendar_id_from_rejects_unknown_url() {
        let err = calendar_id_from("https://example.com/some/page").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        let err = calendar_id_from("").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "nextPageToken": "page-2",
            "items": [
                {
                    "id": "event1",
                    "summary": "Alice",
                    "start": { "dateTime": "2024-03-15T10:00:00+01:00" },
                    "end": { "dateTime": "2024-03-22T10:00:00+01:00" },
                    "status": "confirmed"
                },
                {
                    "id": "event2",
                    "summary": "Bob",
                    "start": { "dateTime": "2024-03-22T10:00:00+01:00" },
                    "end": { "dateTime": "2024-03-29T10:00:00+01:00" },
                    "status": "cancelled"
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("page-2"));

        let events: Vec<RawEvent> = response
            .items
            .into_iter()
            .filter_map(|item| convert_event(item).unwrap())
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Alice");
        assert_eq!(
            events[0].start,
            RawEventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_all_day_event() {
        let json = r#"{
            "id": "event1",
            "summary": "Carol",
            "start": { "date": "2024-03-15" },
            "end": { "date": "2024-03-16" }
        }"#;

        let event: ApiEvent = serde_json::from_str(json).unwrap();
        let raw = convert_event(event).unwrap().unwrap();
        assert!(raw.start.is_all_day());
        assert_eq!(
            raw.into_shift().end,
            Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn event_without_times_is_invalid() {
        let json = r#"{ "id": "event1", "summary": "Broken", "start": {}, "end": {} }"#;
        let event: ApiEvent = serde_json::from_str(json).unwrap();
        let err = convert_event(event).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert!(err.message().contains("no start time"));
    }

    #[test]
    fn malformed_date_time_is_invalid() {
        let json = r#"{
            "id": "event1",
            "summary": "Alice",
            "start": { "dateTime": "2024-03-15T10:00:00+01:00" },
            "end": { "dateTime": "next tuesday" }
        }"#;
        let event: ApiEvent = serde_json::from_str(json).unwrap();
        let err = convert_event(event).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert!(err.falls_back_to_cache());
        assert!(err.message().contains("invalid end time"));
    }

    #[test]
    fn cancelled_event_with_bad_times_is_skipped() {
        let json = r#"{ "id": "event1", "status": "cancelled", "start": {}, "end": {} }"#;
        let event: ApiEvent = serde_json::from_str(json).unwrap();
        assert!(convert_event(event).unwrap().is_none());
    }

    fn test_client(server: &MockServer) -> GoogleApiClient {
        GoogleApiClient::new("token", Duration::from_secs(5), "oncall-test")
            .unwrap()
            .with_api_base(&server.uri())
    }

    #[tokio::test]
    async fn list_events_fails_on_malformed_event() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "good",
                        "summary": "Alice",
                        "start": { "dateTime": "2024-03-15T10:00:00Z" },
                        "end": { "dateTime": "2024-03-22T10:00:00Z" }
                    },
                    {
                        "id": "bad",
                        "summary": "Bob",
                        "start": { "dateTime": "2024-03-22T10:00:00" },
                        "end": { "dateTime": "2024-03-29T10:00:00Z" }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).list_events("primary").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert!(err.message().contains("event bad"));
    }

    #[tokio::test]
    async fn first_contact_search_is_warmed_up_once() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/people:searchContacts"))
            .and(matchers::query_param("query", ""))
            .and(matchers::query_param("readMask", PEOPLE_READ_MASK))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/people:searchContacts"))
            .and(matchers::query_param("query", "Alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "person": { "emailAddresses": [
                        { "value": "alice@example.com", "metadata": { "primary": true } }
                    ] } }
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        for _ in 0..2 {
            let contacts = client.search_contacts("Alice").await.unwrap();
            assert_eq!(contacts.len(), 1);
            assert_eq!(contacts[0].primary_email(), Some("alice@example.com"));
        }
    }

    #[tokio::test]
    async fn failed_warm_up_fails_the_search() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/people:searchContacts"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).search_contacts("Alice").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
    }

    #[test]
    fn parse_contacts_search() {
        let json = r#"{
            "results": [
                {
                    "person": {
                        "resourceName": "people/c123",
                        "names": [{ "displayName": "Alice Example" }],
                        "emailAddresses": [
                            { "value": "alice.home@example.org" },
                            { "value": "alice@example.com", "metadata": { "primary": true } }
                        ],
                        "phoneNumbers": [
                            { "value": "+46 8 555 01", "type": "work", "formattedType": "Work" },
                            { "value": "+46 70 555 02", "type": "mobile", "formattedType": "Mobile" },
                            { "value": "+46 70 555 03", "formattedType": "Pager" }
                        ]
                    }
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let contacts: Vec<ContactRecord> = response
            .results
            .into_iter()
            .map(|r| convert_person(r.person))
            .collect();

        assert_eq!(contacts.len(), 1);
        let alice = &contacts[0];
        assert_eq!(alice.name.as_deref(), Some("Alice Example"));
        assert_eq!(alice.primary_email(), Some("alice@example.com"));
        assert_eq!(alice.preferred_phone(&["mobile"]), Some("+46 70 555 02"));
        assert_eq!(alice.preferred_phone(&["pager"]), Some("+46 70 555 03"));
    }

    #[test]
    fn parse_empty_contacts_search() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn parse_calendar_list() {
        let json = r#"{
            "items": [
                {
                    "id": "primary",
                    "summary": "My Calendar",
                    "primary": true,
                    "timeZone": "Europe/Stockholm"
                },
                {
                    "id": "team-oncall@group.calendar.google.com",
                    "summary": "On-call rota",
                    "primary": false
                }
            ]
        }"#;

        let response: CalendarListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert!(response.items[0].primary);
        assert!(!response.items[1].primary);
    }
}
