use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Maps the provider's integer priority field. Unknown values collapse
    /// to `Normal` rather than failing the whole record.
    pub fn from_provider(value: i64) -> Self {
        match value {
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ItemKind {
    Event { calendar: String },
    Task { completed: bool, priority: Priority },
}

/// Lookup key for the fill-color table. Derived from the item, never stored;
/// raw provider color codes do not survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Muted,
    Priority(Priority),
    Calendar(String),
}

/// One renderable unit: a calendar event or a task, normalized to the
/// display timezone. Instants carry the local fixed offset captured at
/// conversion time so date arithmetic stays wall-clock correct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub is_all_day: bool,
    pub kind: ItemKind,
    pub source: String,
}

impl Item {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "item.title")?;
        validate_non_empty(&self.source, "item.source")?;
        if self.end < self.start {
            return Err("item.end must not precede item.start".to_string());
        }
        if self.is_all_day {
            let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("valid fixed time");
            if self.start.time() != midnight || self.end.time() != midnight {
                return Err("all-day item bounds must be midnight-aligned".to_string());
            }
        }
        Ok(())
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True when the item occupies more than one calendar date.
    pub fn is_multi_day(&self) -> bool {
        self.end.date_naive() > self.start.date_naive()
    }

    pub fn color_key(&self) -> ColorKey {
        match &self.kind {
            ItemKind::Task { completed: true, .. } => ColorKey::Muted,
            ItemKind::Task {
                completed: false,
                priority,
            } => ColorKey::Priority(*priority),
            ItemKind::Event { calendar } => ColorKey::Calendar(calendar.to_ascii_lowercase()),
        }
    }

    pub fn is_completed_task(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Task {
                completed: true,
                ..
            }
        )
    }

    /// Label shown inside the box: timed items carry their local start time,
    /// all-day items just the title.
    pub fn label(&self) -> String {
        if self.is_all_day {
            return self.title.clone();
        }
        let hour24 = self.start.hour();
        let (hour12, meridiem) = match hour24 {
            0 => (12, "AM"),
            1..=11 => (hour24, "AM"),
            12 => (12, "PM"),
            _ => (hour24 - 12, "PM"),
        };
        format!(
            "{}:{:02} {} {}",
            hour12,
            self.start.minute(),
            meridiem,
            self.title
        )
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}
