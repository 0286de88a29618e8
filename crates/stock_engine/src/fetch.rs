use std::pin::Pin;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::task::{Context, Poll};

use futures_util::Stream;
use stock_core::ListingId;
use stock_logging::{stock_debug, stock_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, FetchError, FetchProgress, FetchedListing, MarketplaceSession};

pub const DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Size of the worker pool. Zero is treated as one.
    pub workers: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl FetchSettings {
    pub fn effective_workers(&self, jobs: usize) -> usize {
        self.workers.max(1).min(jobs)
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Shared queue of pending IDs; `claim` hands each index out exactly once.
struct WorkQueue {
    ids: Vec<ListingId>,
    next: AtomicUsize,
}

impl WorkQueue {
    fn claim(&self) -> Option<&ListingId> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.ids.get(index)
    }
}

type FetchOutcome = Result<FetchedListing, FetchError>;

/// Completion-ordered results of [`fetch_all`].
///
/// Dropping the stream cancels the batch: idle workers stop claiming IDs and
/// in-flight fetches are abandoned.
pub struct FetchResults {
    rx: mpsc::Receiver<FetchOutcome>,
    total: usize,
    completed: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl FetchResults {
    pub fn total(&self) -> usize {
        self.total
    }

    /// Fetches finished so far, whether or not their results were consumed.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub async fn next(&mut self) -> Option<FetchOutcome> {
        self.rx.recv().await
    }
}

impl Drop for FetchResults {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for FetchResults {
    type Item = FetchOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.total))
    }
}

/// Fetch every listing detail on a fixed pool of workers.
///
/// Results arrive in completion order, not submission order. Each ID is
/// fetched at most once and failures are passed through unretried. Must be
/// called from within a tokio runtime.
pub fn fetch_all<S>(
    session: Arc<S>,
    ids: Vec<ListingId>,
    settings: &FetchSettings,
    sink: Arc<dyn ProgressSink>,
) -> FetchResults
where
    S: MarketplaceSession + ?Sized + 'static,
{
    let total = ids.len();
    let workers = settings.effective_workers(total);
    let (tx, rx) = mpsc::channel(workers.max(1));
    let queue = Arc::new(WorkQueue {
        ids,
        next: AtomicUsize::new(0),
    });
    let completed = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();

    stock_debug!("Fetching {} listings with {} workers", total, workers);
    for worker in 0..workers {
        let worker = Worker {
            index: worker,
            session: session.clone(),
            queue: queue.clone(),
            completed: completed.clone(),
            total,
            tx: tx.clone(),
            sink: sink.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());
    }

    FetchResults {
        rx,
        total,
        completed,
        cancel,
    }
}

struct Worker<S: ?Sized> {
    index: usize,
    session: Arc<S>,
    queue: Arc<WorkQueue>,
    completed: Arc<AtomicUsize>,
    total: usize,
    tx: mpsc::Sender<FetchOutcome>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl<S> Worker<S>
where
    S: MarketplaceSession + ?Sized + 'static,
{
    async fn run(self) {
        while !self.cancel.is_cancelled() {
            let Some(id) = self.queue.claim() else {
                break;
            };
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.session.fetch_listing_detail(id) => result,
            };

            let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
            self.sink.emit(EngineEvent::ListingFetched(FetchProgress {
                listing_id: id.clone(),
                completed,
                total: self.total,
                succeeded: result.is_ok(),
            }));

            let outcome = match result {
                Ok(detail) => Ok(FetchedListing {
                    listing_id: id.clone(),
                    detail,
                }),
                Err(err) => {
                    stock_warn!("Worker {} failed to fetch listing {}: {}", self.index, id, err);
                    Err(err.into_fetch_error(id.clone()))
                }
            };
            if self.tx.send(outcome).await.is_err() {
                // Consumer is gone; nobody wants further results.
                break;
            }
        }
        stock_debug!("Worker {} finished", self.index);
    }
}
