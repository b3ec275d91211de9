use crate::domain::models::{Item, ItemKind};
use crate::domain::week::WeekWindow;
use crate::infrastructure::config::CalendarEntry;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::EngineError;
use crate::infrastructure::source::ItemSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
const SOURCE_NAME: &str = "google";

pub struct GoogleCalendarSource<S: CredentialStore> {
    client: Client,
    credentials: Arc<S>,
    calendars: Vec<CalendarEntry>,
}

impl<S: CredentialStore> GoogleCalendarSource<S> {
    pub fn new(credentials: Arc<S>, calendars: Vec<CalendarEntry>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            calendars,
        }
    }

    fn events_endpoint(calendar_id: &str) -> Result<Url, EngineError> {
        let mut url = Url::parse(CALENDAR_API_BASE).map_err(|error| {
            EngineError::source_unavailable(SOURCE_NAME, format!("invalid api base url: {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                EngineError::source_unavailable(SOURCE_NAME, "api base URL cannot be a base")
            })?;
            segments.push("calendars");
            segments.push(calendar_id);
            segments.push("events");
        }
        Ok(url)
    }

    async fn fetch_calendar(
        &self,
        access_token: &str,
        entry: &CalendarEntry,
        window: &WeekWindow,
    ) -> Result<Vec<Item>, EngineError> {
        let endpoint = Self::events_endpoint(&entry.id)?;
        let (time_min, time_max) = window.utc_range();
        let mut page_token: Option<String> = None;
        let mut items = Vec::new();

        loop {
            let mut request = self
                .client
                .get(endpoint.clone())
                .bearer_auth(access_token)
                .query(&[
                    ("timeMin", time_min.to_rfc3339()),
                    ("timeMax", time_max.to_rfc3339()),
                ])
                .query(&[
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                    ("maxResults", "2500"),
                ]);
            if let Some(page_token) = page_token.as_deref() {
                request = request.query(&[("pageToken", page_token)]);
            }

            let response = request.send().await.map_err(|error| {
                EngineError::source_unavailable(
                    SOURCE_NAME,
                    format!("network error while listing events: {error}"),
                )
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|error| {
                EngineError::source_unavailable(
                    SOURCE_NAME,
                    format!("failed reading events response: {error}"),
                )
            })?;

            if !status.is_success() {
                return Err(EngineError::source_unavailable(
                    SOURCE_NAME,
                    format!("calendar api error: http {}", status.as_u16()),
                ));
            }

            let mut parsed: EventsPageResponse = serde_json::from_str(&body).map_err(|error| {
                EngineError::source_unavailable(
                    SOURCE_NAME,
                    format!("invalid events payload: {error}"),
                )
            })?;

            for event in parsed.items.take().unwrap_or_default() {
                match normalize_event(event, &entry.name, window.tz) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(calendar = %entry.name, %error, "dropping malformed event");
                    }
                }
            }

            match parsed.next_page_token.take() {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl<S: CredentialStore> ItemSource for GoogleCalendarSource<S> {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, window: &WeekWindow) -> Result<Vec<Item>, EngineError> {
        let Some(access_token) = self.credentials.access_token()? else {
            return Err(EngineError::source_unavailable(
                SOURCE_NAME,
                "no stored credential",
            ));
        };

        let mut items = Vec::new();
        let mut failures = Vec::new();

        for entry in &self.calendars {
            match self.fetch_calendar(&access_token, entry, window).await {
                Ok(calendar_items) => {
                    tracing::debug!(
                        calendar = %entry.name,
                        count = calendar_items.len(),
                        "fetched calendar events"
                    );
                    items.extend(calendar_items);
                }
                Err(error) => {
                    tracing::warn!(calendar = %entry.name, %error, "calendar fetch failed");
                    failures.push(entry.name.clone());
                }
            }
        }

        if !self.calendars.is_empty() && failures.len() == self.calendars.len() {
            return Err(EngineError::source_unavailable(
                SOURCE_NAME,
                format!("every calendar failed: {}", failures.join(", ")),
            ));
        }

        Ok(items)
    }
}

#[derive(Debug, serde::Deserialize)]
struct EventsPageResponse {
    items: Option<Vec<GoogleEvent>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct GoogleEvent {
    summary: Option<String>,
    status: Option<String>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

/// Parses one wire bound into a display-local instant plus its all-day
/// flag. `Ok(None)` means the bound is absent; `Err` carries the parse
/// failure for the caller to log.
fn parse_bound(
    bound: &GoogleEventTime,
    tz: Tz,
) -> Result<Option<(DateTime<FixedOffset>, bool)>, EngineError> {
    if let Some(raw) = bound.date_time.as_deref() {
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|error| EngineError::MalformedItem(format!("invalid dateTime '{raw}': {error}")))?;
        return Ok(Some((parsed.with_timezone(&tz).fixed_offset(), false)));
    }
    if let Some(raw) = bound.date.as_deref() {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|error| EngineError::MalformedItem(format!("invalid date '{raw}': {error}")))?;
        let midnight = date.and_hms_opt(0, 0, 0).expect("valid fixed time");
        let local = tz
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight));
        return Ok(Some((local.fixed_offset(), true)));
    }
    Ok(None)
}

/// Converts a wire event into an `Item`. Cancelled events and events with
/// missing bounds or an empty title map to `Ok(None)`; unparseable dates
/// map to `Err`.
fn normalize_event(event: GoogleEvent, calendar: &str, tz: Tz) -> Result<Option<Item>, EngineError> {
    if event
        .status
        .as_deref()
        .is_some_and(|status| status.eq_ignore_ascii_case("cancelled"))
    {
        return Ok(None);
    }

    let title = event
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let Some(title) = title else {
        return Ok(None);
    };

    let Some(start_bound) = event.start.as_ref() else {
        return Ok(None);
    };
    let Some(end_bound) = event.end.as_ref() else {
        return Ok(None);
    };
    let Some((start, is_all_day)) = parse_bound(start_bound, tz)? else {
        return Ok(None);
    };
    let Some((end, _)) = parse_bound(end_bound, tz)? else {
        return Ok(None);
    };

    // The wire format's all-day end date is exclusive; store the last
    // occupied date instead so column replication stays correct.
    let end = if is_all_day {
        (end - Duration::days(1)).max(start)
    } else {
        end.max(start)
    };

    Ok(Some(Item {
        title: title.to_string(),
        start,
        end,
        is_all_day,
        kind: ItemKind::Event {
            calendar: calendar.to_string(),
        },
        source: SOURCE_NAME.to_string(),
    }))
}
