use crate::domain::models::Item;
use crate::domain::week::WeekWindow;
use crate::infrastructure::error::EngineError;
use crate::infrastructure::source::ItemSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;

const SOURCE_FETCH_CONCURRENCY: usize = 4;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Fans the per-source fetches out concurrently and tolerates partial
/// failure: a source that errors or exceeds its deadline contributes zero
/// items. Only when every source fails does the aggregate fail.
pub struct SourceAggregator {
    sources: Vec<Arc<dyn ItemSource>>,
    fetch_timeout: Duration,
}

impl SourceAggregator {
    pub fn new(sources: Vec<Arc<dyn ItemSource>>) -> Self {
        Self {
            sources,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Fetches every source for the window. Results are collected by source
    /// index so the output order never depends on completion order.
    pub async fn fetch_all(&self, window: &WeekWindow) -> Result<Vec<Item>, EngineError> {
        if self.sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut fetches: JoinSet<(usize, Result<Vec<Item>, EngineError>)> = JoinSet::new();
        let mut outcomes: Vec<Option<Result<Vec<Item>, EngineError>>> =
            (0..self.sources.len()).map(|_| None).collect();

        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let window = window.clone();
            let deadline = self.fetch_timeout;

            fetches.spawn(async move {
                let result = match timeout(deadline, source.fetch(&window)).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::source_unavailable(
                        source.name(),
                        format!("timed out after {}s", deadline.as_secs()),
                    )),
                };
                (index, result)
            });

            if fetches.len() >= SOURCE_FETCH_CONCURRENCY {
                collect_outcome(&mut fetches, &mut outcomes).await;
            }
        }

        while !fetches.is_empty() {
            collect_outcome(&mut fetches, &mut outcomes).await;
        }

        let mut items = Vec::new();
        let mut failures = Vec::new();

        for (index, outcome) in outcomes.into_iter().enumerate() {
            let name = self.sources[index].name();
            match outcome {
                Some(Ok(source_items)) => {
                    tracing::debug!(source = name, count = source_items.len(), "source fetched");
                    items.extend(source_items);
                }
                Some(Err(error)) => {
                    tracing::warn!(source = name, %error, "source failed; continuing without it");
                    failures.push(format!("{name}: {error}"));
                }
                None => {
                    tracing::warn!(source = name, "source task aborted; continuing without it");
                    failures.push(format!("{name}: task aborted"));
                }
            }
        }

        if failures.len() == self.sources.len() {
            return Err(EngineError::AllSourcesFailed(failures.join("; ")));
        }

        Ok(items)
    }
}

async fn collect_outcome(
    fetches: &mut JoinSet<(usize, Result<Vec<Item>, EngineError>)>,
    outcomes: &mut [Option<Result<Vec<Item>, EngineError>>],
) {
    let Some(join_result) = fetches.join_next().await else {
        return;
    };
    if let Ok((index, result)) = join_result {
        if let Some(slot) = outcomes.get_mut(index) {
            *slot = Some(result);
        }
    }
}
