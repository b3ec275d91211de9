use crate::domain::models::{ColorKey, Priority};
use serde::{Deserialize, Serialize};

/// The panel's color vocabulary. The renderer collaborator owns the mapping
/// to actual pixel values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InkColor {
    Black,
    White,
    Gray,
    Blue,
    Green,
    Orange,
    Red,
    Yellow,
    Purple,
}

impl InkColor {
    /// Static allow-list of light backgrounds. No luminance computation;
    /// the set must stay reproducible across renders.
    pub fn is_light(self) -> bool {
        matches!(self, Self::Yellow | Self::White)
    }
}

/// Fixed fill lookup. A completed task is always muted, whatever its
/// priority; events key on their calendar name.
pub fn fill_color(key: &ColorKey) -> InkColor {
    match key {
        ColorKey::Muted => InkColor::Gray,
        ColorKey::Priority(Priority::Normal) => InkColor::Black,
        ColorKey::Priority(Priority::Low) => InkColor::Blue,
        ColorKey::Priority(Priority::Medium) => InkColor::Orange,
        ColorKey::Priority(Priority::High) => InkColor::Red,
        ColorKey::Calendar(name) => calendar_color(name),
    }
}

fn calendar_color(name: &str) -> InkColor {
    match name {
        "primary" => InkColor::Red,
        "holidays" => InkColor::Green,
        "birthdays" => InkColor::Orange,
        "partiful" => InkColor::Green,
        "events_available" => InkColor::Purple,
        "work" => InkColor::Yellow,
        _ => InkColor::Blue,
    }
}

pub fn text_color(fill: InkColor) -> InkColor {
    if fill.is_light() {
        InkColor::Black
    } else {
        InkColor::White
    }
}
