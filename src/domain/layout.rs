use crate::domain::models::Item;
use crate::domain::palette::{self, InkColor};
use crate::domain::week::WeekWindow;
use serde::Serialize;

pub const DAYS_PER_WEEK: usize = 7;

const MINUTES_PER_ROW: i64 = 30;
const LONG_ITEM_MINUTES: i64 = 180;

/// Raw layout knobs, as read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub grid_width_ratio: f64,
    pub base_row_height: u32,
    pub gutter: u32,
    pub header_height: u32,
    pub wrap_char_width: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            canvas_width: 1200,
            canvas_height: 800,
            grid_width_ratio: 0.85,
            base_row_height: 30,
            gutter: 5,
            header_height: 60,
            wrap_char_width: 8,
        }
    }
}

/// Pixel geometry of the seven-column grid, derived once per render.
/// The grid occupies `grid_width_ratio` of the canvas and is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub grid_width: u32,
    pub day_width: u32,
    pub x_offset: u32,
    pub header_height: u32,
    pub base_row_height: u32,
    pub gutter: u32,
    pub chars_per_line: usize,
}

impl GridGeometry {
    pub fn new(settings: &LayoutSettings) -> Self {
        let grid_width = (f64::from(settings.canvas_width) * settings.grid_width_ratio) as u32;
        let day_width = grid_width / DAYS_PER_WEEK as u32;
        let x_offset = (settings.canvas_width - grid_width) / 2;
        let text_width = day_width.saturating_sub(2 * settings.gutter);
        let chars_per_line = (text_width / settings.wrap_char_width.max(1)).max(1) as usize;

        Self {
            canvas_width: settings.canvas_width,
            canvas_height: settings.canvas_height,
            grid_width,
            day_width,
            x_offset,
            header_height: settings.header_height,
            base_row_height: settings.base_row_height,
            gutter: settings.gutter,
            chars_per_line,
        }
    }
}

/// An item's resolved position, size, and colors within its column.
/// `y_offset` is relative to the column's content origin below the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub item: Item,
    pub y_offset: u32,
    pub pixel_height: u32,
    pub fill_color: InkColor,
    pub text_color: InkColor,
    pub title_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    pub index: u32,
    pub placements: Vec<Placement>,
}

impl DayColumn {
    fn empty(index: u32) -> Self {
        Self {
            index,
            placements: Vec::new(),
        }
    }

    /// Stacked extent of the column content, without the trailing gutter.
    /// Empty columns report zero.
    pub fn content_height(&self) -> u32 {
        self.placements
            .last()
            .map(|placement| placement.y_offset + placement.pixel_height)
            .unwrap_or(0)
    }
}

/// Assigns each item to the weekday columns it occupies, clipped to the
/// visible window. Multi-day items are replicated into every touched
/// column; items with no overlap are discarded.
pub fn bucketize(items: &[Item], window: &WeekWindow) -> Vec<Vec<Item>> {
    let mut columns: Vec<Vec<Item>> = (0..DAYS_PER_WEEK).map(|_| Vec::new()).collect();

    for item in items {
        let start_index = window.day_index_of(item.start.date_naive());
        let end_index = window.day_index_of(item.end.date_naive());
        if end_index < 0 || start_index >= DAYS_PER_WEEK as i64 {
            continue;
        }
        let first = start_index.max(0) as usize;
        let last = end_index.min(DAYS_PER_WEEK as i64 - 1) as usize;
        for column in columns.iter_mut().take(last + 1).skip(first) {
            column.push(item.clone());
        }
    }

    columns
}

/// Orders and stacks one column: all-day items first in input order, then
/// timed items ascending by start (stable, so ties keep input order).
pub fn lay_out_column(index: u32, items: Vec<Item>, geometry: &GridGeometry) -> DayColumn {
    let (all_day, mut timed): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(|item| item.is_all_day);
    timed.sort_by_key(|item| item.start);

    let mut column = DayColumn::empty(index);
    let mut y_offset = geometry.gutter;

    for item in all_day.into_iter().chain(timed) {
        let title_lines = wrap_label(&item.label(), geometry.chars_per_line);
        let units = duration_units(&item).max(title_lines.len() as u32);
        let pixel_height = units * geometry.base_row_height;
        let fill_color = palette::fill_color(&item.color_key());

        column.placements.push(Placement {
            y_offset,
            pixel_height,
            fill_color,
            text_color: palette::text_color(fill_color),
            title_lines,
            item,
        });
        y_offset += pixel_height + geometry.gutter;
    }

    column
}

/// Full pure pipeline for one week: bucketize then stack each column.
pub fn lay_out_week(items: &[Item], window: &WeekWindow, geometry: &GridGeometry) -> Vec<DayColumn> {
    bucketize(items, window)
        .into_iter()
        .enumerate()
        .map(|(index, day_items)| lay_out_column(index as u32, day_items, geometry))
        .collect()
}

/// Height in base-row units from duration alone. All-day items take one
/// unit. Items longer than three hours collapse back to one unit so they
/// cannot dominate the column.
fn duration_units(item: &Item) -> u32 {
    if item.is_all_day {
        return 1;
    }
    let minutes = item.duration_minutes().max(0);
    if minutes > LONG_ITEM_MINUTES {
        return 1;
    }
    (minutes / MINUTES_PER_ROW + 1) as u32
}

/// Greedy word wrap at the column's character budget; words longer than a
/// full line are hard-broken.
fn wrap_label(label: &str, chars_per_line: usize) -> Vec<String> {
    let limit = chars_per_line.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in label.split_whitespace() {
        let mut word = word;
        while word.chars().count() > limit {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(limit)
                .map(|(byte_index, _)| byte_index)
                .unwrap_or(word.len());
            let (head, tail) = word.split_at(split_at);
            lines.push(head.to_string());
            word = tail;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > limit && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
