pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::aggregator::SourceAggregator;
pub use application::render_plan::{DayHeader, RenderPlan, RenderPlanService};
pub use domain::layout::{DayColumn, GridGeometry, LayoutSettings, Placement};
pub use domain::models::{ColorKey, Item, ItemKind, Priority};
pub use domain::palette::InkColor;
pub use domain::week::WeekWindow;
pub use infrastructure::error::EngineError;
pub use infrastructure::source::ItemSource;
