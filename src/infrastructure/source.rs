use crate::domain::models::Item;
use crate::domain::week::WeekWindow;
use crate::infrastructure::error::EngineError;
use async_trait::async_trait;

/// One provider of renderable items. Implementations must return every item
/// overlapping the requested window, normalized to the window's timezone,
/// and must signal failure distinctly from "zero results" so the aggregator
/// can log it.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Stable identity used for logging and color keys.
    fn name(&self) -> &str;

    async fn fetch(&self, window: &WeekWindow) -> Result<Vec<Item>, EngineError>;
}
