use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{future, stream, StreamExt};
use tracing::warn;

use crate::error::PlatformError;
use crate::report::{MigrationOutcome, RunReport};

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Operator-triggered stop. Once raised no new calls are scheduled; calls
/// already in flight still finish and get recorded.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct RunSettings {
    pub concurrency: usize,
    pub deadline: Duration,
    pub abort: AbortSignal,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: DEFAULT_DEADLINE,
            abort: AbortSignal::new(),
        }
    }
}

impl RunSettings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }
}

/// Bounds a platform call by `deadline`.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, PlatformError>
where
    F: Future<Output = Result<T, PlatformError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(PlatformError::Deadline(deadline)),
    }
}

/// Runs `work` for every item with at most `settings.concurrency` calls in
/// flight and records each outcome as soon as it completes.
pub async fn run_bounded<I, F, Fut>(
    settings: &RunSettings,
    items: Vec<I>,
    report: &RunReport,
    work: F,
) where
    F: Fn(I) -> Fut,
    Fut: Future<Output = MigrationOutcome>,
{
    let total = items.len();
    let mut scheduled = 0usize;
    let abort = settings.abort.clone();

    stream::iter(items)
        .take_while(|_| future::ready(!abort.is_aborted()))
        .map(|item| {
            scheduled += 1;
            work(item)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .for_each(|outcome| {
            report.record(outcome);
            future::ready(())
        })
        .await;

    let unscheduled = total - scheduled;
    if unscheduled > 0 {
        warn!(unscheduled, "run aborted before every entity was scheduled");
        report.add_not_attempted(unscheduled);
    }
}
