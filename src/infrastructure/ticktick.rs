use crate::domain::models::{Item, ItemKind, Priority};
use crate::domain::week::WeekWindow;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::EngineError;
use crate::infrastructure::source::ItemSource;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

const TICKTICK_API_BASE: &str = "https://api.ticktick.com/open/v1/";
const TICKTICK_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
const COMPLETED_STATUS: i64 = 2;
const SOURCE_NAME: &str = "ticktick";

pub struct TickTickSource<S: CredentialStore> {
    client: Client,
    credentials: Arc<S>,
    project_id: String,
}

impl<S: CredentialStore> TickTickSource<S> {
    pub fn new(credentials: Arc<S>, project_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            project_id: project_id.into(),
        }
    }

    fn project_data_endpoint(&self) -> Result<Url, EngineError> {
        let mut url = Url::parse(TICKTICK_API_BASE).map_err(|error| {
            EngineError::source_unavailable(SOURCE_NAME, format!("invalid api base url: {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                EngineError::source_unavailable(SOURCE_NAME, "api base URL cannot be a base")
            })?;
            segments.push("project");
            segments.push(&self.project_id);
            segments.push("data");
        }
        Ok(url)
    }
}

#[async_trait]
impl<S: CredentialStore> ItemSource for TickTickSource<S> {
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

        let response = self
            .client
            .get(self.project_data_endpoint()?)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|error| {
                EngineError::source_unavailable(
                    SOURCE_NAME,
                    format!("network error while fetching project data: {error}"),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            EngineError::source_unavailable(
                SOURCE_NAME,
                format!("failed reading project data response: {error}"),
            )
        })?;

        if !status.is_success() {
            return Err(EngineError::source_unavailable(
                SOURCE_NAME,
                format!("ticktick api error: http {}", status.as_u16()),
            ));
        }

        let parsed: ProjectDataResponse = serde_json::from_str(&body).map_err(|error| {
            EngineError::source_unavailable(
                SOURCE_NAME,
                format!("invalid project data payload: {error}"),
            )
        })?;
        let Some(tasks) = parsed.tasks else {
            return Err(EngineError::source_unavailable(
                SOURCE_NAME,
                "project data payload is missing the tasks field",
            ));
        };

        let mut items = Vec::new();
        for task in tasks {
            match normalize_task(task, window.tz) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed task");
                }
            }
        }
        tracing::debug!(count = items.len(), "fetched ticktick tasks");

        Ok(items)
    }
}

#[derive(Debug, serde::Deserialize)]
struct ProjectDataResponse {
    tasks: Option<Vec<TickTickTask>>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct TickTickTask {
    title: Option<String>,
    status: Option<i64>,
    priority: Option<i64>,
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<String>,
    #[serde(rename = "isAllDay")]
    is_all_day: Option<bool>,
}

fn parse_task_date(raw: &str) -> Result<DateTime<FixedOffset>, EngineError> {
    DateTime::parse_from_str(raw, TICKTICK_DATE_FORMAT)
        .map_err(|error| EngineError::MalformedItem(format!("invalid task date '{raw}': {error}")))
}

/// Converts a wire task into an `Item`. Tasks without any date are not
/// calendar material and map to `Ok(None)`; unparseable dates map to `Err`.
/// `startDate` and `dueDate` stand in for each other when one is absent.
fn normalize_task(task: TickTickTask, tz: Tz) -> Result<Option<Item>, EngineError> {
    let title = task
        .title
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let Some(title) = title else {
        return Ok(None);
    };

    let start_raw = task.start_date.as_deref().or(task.due_date.as_deref());
    let end_raw = task.due_date.as_deref().or(task.start_date.as_deref());
    let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) else {
        return Ok(None);
    };

    let start = parse_task_date(start_raw)?;
    let end = parse_task_date(end_raw)?;
    let is_all_day = task.is_all_day.unwrap_or(false);

    // All-day bounds keep the wall date the provider stated, re-anchored to
    // local midnight; converting the instant first could shift the date
    // across the timezone change.
    let (start, end) = if is_all_day {
        (
            local_midnight(start.date_naive(), tz),
            local_midnight(end.date_naive(), tz),
        )
    } else {
        (
            start.with_timezone(&tz).fixed_offset(),
            end.with_timezone(&tz).fixed_offset(),
        )
    };
    let end = end.max(start);

    Ok(Some(Item {
        title: title.to_string(),
        start,
        end,
        is_all_day,
        kind: ItemKind::Task {
            completed: task.status == Some(COMPLETED_STATUS),
            priority: Priority::from_provider(task.priority.unwrap_or(0)),
        },
        source: SOURCE_NAME.to_string(),
    }))
}

fn local_midnight(date: chrono::NaiveDate, tz: Tz) -> DateTime<FixedOffset> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("valid fixed time");
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
        .fixed_offset()
}
