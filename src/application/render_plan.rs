use crate::application::aggregator::SourceAggregator;
use crate::domain::layout::{self, DayColumn, GridGeometry, LayoutSettings, Placement};
use crate::domain::week::WeekWindow;
use crate::infrastructure::config::ConfigBundle;
use crate::infrastructure::error::EngineError;
use crate::infrastructure::source::ItemSource;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const CAPTION_FORMAT: &str = "%b %d %I:%M %p";

/// Column header data: weekday label, day-of-month, and whether the column
/// is the current local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayHeader {
    pub label: String,
    pub day_number: String,
    pub is_today: bool,
}

/// Everything the renderer collaborator needs to paint one frame.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    pub window: WeekWindow,
    pub geometry: GridGeometry,
    pub headers: Vec<DayHeader>,
    pub columns: Vec<DayColumn>,
    pub total_height: u32,
    pub generated_at: String,
}

impl RenderPlan {
    /// Flattened placement feed in paint order: column by column, top to
    /// bottom within each column.
    pub fn placements(&self) -> impl Iterator<Item = (u32, &Placement)> {
        self.columns
            .iter()
            .flat_map(|column| column.placements.iter().map(move |p| (column.index, p)))
    }
}

/// One render cycle: window → aggregate → bucketize → stack. Pure beyond
/// the adapter fetches; holds no state between invocations.
pub struct RenderPlanService {
    aggregator: SourceAggregator,
    tz: Tz,
    settings: LayoutSettings,
    now_provider: NowProvider,
}

impl RenderPlanService {
    pub fn new(aggregator: SourceAggregator, tz: Tz, settings: LayoutSettings) -> Self {
        Self {
            aggregator,
            tz,
            settings,
            now_provider: Arc::new(Utc::now),
        }
    }

    /// Wires a service from loaded configuration: display timezone, layout
    /// geometry, and the per-source fetch deadline.
    pub fn from_config(
        bundle: &ConfigBundle,
        sources: Vec<Arc<dyn ItemSource>>,
    ) -> Result<Self, EngineError> {
        let tz = bundle.app.display_timezone()?;
        bundle.display.validate()?;
        let aggregator = SourceAggregator::new(sources)
            .with_fetch_timeout(Duration::from_secs(bundle.sources.fetch_timeout_seconds));
        Ok(Self::new(aggregator, tz, bundle.display.layout_settings()))
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub async fn build_plan(&self) -> Result<RenderPlan, EngineError> {
        let now = (self.now_provider)();
        let window = WeekWindow::containing(now, self.tz);
        let items = self.aggregator.fetch_all(&window).await?;
        tracing::info!(
            items = items.len(),
            week_start = %window.start_date(),
            "building render plan"
        );

        let geometry = GridGeometry::new(&self.settings);
        let columns = layout::lay_out_week(&items, &window, &geometry);
        let content_height = columns
            .iter()
            .map(DayColumn::content_height)
            .max()
            .unwrap_or(0);

        let local_today = now.with_timezone(&self.tz).date_naive();
        let headers = (0..layout::DAYS_PER_WEEK as u32)
            .map(|index| {
                let date = window.day_date(index);
                DayHeader {
                    label: date.format("%a").to_string(),
                    day_number: date.format("%d").to_string(),
                    is_today: date == local_today,
                }
            })
            .collect();

        Ok(RenderPlan {
            total_height: geometry.header_height + content_height,
            generated_at: now
                .with_timezone(&self.tz)
                .format(CAPTION_FORMAT)
                .to_string(),
            window,
            geometry,
            headers,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Item, ItemKind, Priority};
    use crate::infrastructure::source::ItemSource;
    use async_trait::async_trait;

    struct FixedSource {
        items: Vec<Item>,
    }

    #[async_trait]
    impl ItemSource for FixedSource {
        fn name(&self) -> &str {
            "fixture"
        }

        async fn fetch(&self, _window: &WeekWindow) -> Result<Vec<Item>, EngineError> {
            Ok(self.items.clone())
        }
    }

    fn frozen_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-18T17:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn service_with(items: Vec<Item>) -> RenderPlanService {
        let aggregator = SourceAggregator::new(vec![Arc::new(FixedSource { items })]);
        RenderPlanService::new(
            aggregator,
            chrono_tz::US::Eastern,
            LayoutSettings::default(),
        )
        .with_now_provider(Arc::new(frozen_now))
    }

    fn sample_item(title: &str, start: &str, end: &str) -> Item {
        Item {
            title: title.to_string(),
            start: DateTime::parse_from_rfc3339(start).expect("valid datetime"),
            end: DateTime::parse_from_rfc3339(end).expect("valid datetime"),
            is_all_day: false,
            kind: ItemKind::Task {
                completed: false,
                priority: Priority::Normal,
            },
            source: "fixture".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_week_produces_seven_empty_columns() {
        let plan = service_with(Vec::new())
            .build_plan()
            .await
            .expect("build plan");

        assert_eq!(plan.columns.len(), 7);
        assert!(plan.columns.iter().all(|column| column.placements.is_empty()));
        assert_eq!(plan.total_height, plan.geometry.header_height);
        assert_eq!(plan.placements().count(), 0);
    }

    #[tokio::test]
    async fn plan_places_items_and_reports_grid_height() {
        let plan = service_with(vec![sample_item(
            "Dentist",
            "2026-02-17T09:00:00-05:00",
            "2026-02-17T10:00:00-05:00",
        )])
        .build_plan()
        .await
        .expect("build plan");

        let placed: Vec<(u32, &str)> = plan
            .placements()
            .map(|(column, placement)| (column, placement.item.title.as_str()))
            .collect();
        assert_eq!(placed, vec![(2, "Dentist")]);

        // 60-minute item: 3 units of 30px, one leading 5px gutter.
        let expected_column_extent = 5 + 90;
        assert_eq!(
            plan.total_height,
            plan.geometry.header_height + expected_column_extent
        );
    }

    #[tokio::test]
    async fn headers_cover_the_week_and_mark_today() {
        let plan = service_with(Vec::new())
            .build_plan()
            .await
            .expect("build plan");

        let labels: Vec<&str> = plan
            .headers
            .iter()
            .map(|header| header.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
        );
        let today_flags: Vec<bool> = plan.headers.iter().map(|header| header.is_today).collect();
        assert_eq!(
            today_flags,
            vec![false, false, false, true, false, false, false]
        );
    }

    #[tokio::test]
    async fn service_wires_from_configuration() {
        use crate::infrastructure::config::{AppConfig, DisplayConfig, SourcesConfig};

        let bundle = ConfigBundle {
            app: AppConfig {
                schema: 1,
                timezone: "US/Eastern".to_string(),
            },
            display: DisplayConfig {
                schema: 1,
                canvas_width: 800,
                canvas_height: 480,
                grid_width_ratio: 0.85,
                base_row_height: 30,
                gutter_padding: 5,
                header_height: 60,
                wrap_char_width: 8,
            },
            sources: SourcesConfig {
                schema: 1,
                calendars: Vec::new(),
                ticktick: None,
                fetch_timeout_seconds: 5,
            },
        };

        let service = RenderPlanService::from_config(
            &bundle,
            vec![Arc::new(FixedSource { items: Vec::new() })],
        )
        .expect("wire service")
        .with_now_provider(Arc::new(frozen_now));

        let plan = service.build_plan().await.expect("build plan");
        assert_eq!(plan.geometry.canvas_width, 800);
        assert_eq!(plan.geometry.day_width, 800 * 85 / 100 / 7);
    }

    #[tokio::test]
    async fn caption_is_rendered_in_the_display_timezone() {
        let plan = service_with(Vec::new())
            .build_plan()
            .await
            .expect("build plan");
        assert_eq!(plan.generated_at, "Feb 18 12:00 PM");
    }
}
