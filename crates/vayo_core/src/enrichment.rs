//! Detached enrichment queue and merge rules.
//!
//! After a bookmark is persisted, its id and URL are queued here. A worker
//! task scrapes the page and fills in whatever the synchronous fetch left
//! empty. Jobs are attempted once; failures are logged and dropped. The
//! queue is bounded, and a job that finds it full is dropped the same way.

use crate::db::{bookmark::EnrichmentOutcome, Database};
use crate::metadata::{MetadataFetcher, PageMetadata};
use crate::models::bookmark::{Bookmark, TitleSource};
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Work item for the detached pass.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub bookmark_id: String,
    pub url: Url,
}

/// Sending half of the enrichment queue.
///
/// Cloneable and cheap; a disabled queue silently drops jobs.
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    sender: Option<mpsc::Sender<EnrichmentJob>>,
}

impl EnrichmentQueue {
    /// Queue with no worker behind it.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Schedule a job. Never blocks and never fails the caller.
    ///
    /// # Returns
    /// Whether the job was queued.
    pub fn enqueue(&self, job: EnrichmentJob) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        match sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(
                    bookmark_id = %job.bookmark_id,
                    capacity = sender.max_capacity(),
                    "Enrichment queue full; keeping placeholder metadata"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(
                    bookmark_id = %job.bookmark_id,
                    "Enrichment worker stopped; dropping job"
                );
                false
            }
        }
    }

    /// Whether jobs are actually delivered to a worker.
    pub fn is_enabled(&self) -> bool {
        self.sender.as_ref().is_some_and(|sender| !sender.is_closed())
    }
}

/// Fill unset fields of `bookmark` from `metadata`.
///
/// Only a placeholder title is replaced. `summary` is set whenever the
/// scrape produced one and the bookmark has none.
///
/// # Returns
/// `true` when anything changed. Applying the same metadata again returns
/// `false`.
pub fn merge_enrichment(bookmark: &mut Bookmark, metadata: &PageMetadata) -> bool {
    fn fill(slot: &mut Option<String>, value: &Option<String>) -> bool {
        match (slot.as_ref(), value) {
            (None, Some(value)) => {
                *slot = Some(value.clone());
                true
            }
            _ => false,
        }
    }

    let mut changed = false;
    if bookmark.title_source == TitleSource::Placeholder {
        if let Some(title) = metadata.title.as_ref() {
            bookmark.title = title.clone();
            bookmark.title_source = TitleSource::Metadata;
            changed = true;
        }
    }
    changed |= fill(&mut bookmark.description, &metadata.description);
    changed |= fill(&mut bookmark.favicon_url, &metadata.favicon_url);
    changed |= fill(&mut bookmark.og_image_url, &metadata.og_image_url);
    changed |= fill(&mut bookmark.summary, &metadata.summary);
    changed
}

/// Scrape one page and merge the result. Errors are logged, never returned.
pub async fn run_enrichment(db: &Database, fetcher: &dyn MetadataFetcher, job: EnrichmentJob) {
    let started = Instant::now();
    let metadata = match fetcher.scrape_page(&job.url).await {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::warn!(
                bookmark_id = %job.bookmark_id,
                url = %job.url,
                error = %err,
                "Enrichment scrape failed"
            );
            return;
        }
    };
    let scraped_ms = started.elapsed().as_millis() as u64;

    match db.bookmarks.apply_enrichment(&job.bookmark_id, &metadata) {
        Ok(EnrichmentOutcome::Updated) => tracing::debug!(
            bookmark_id = %job.bookmark_id,
            scraped_ms,
            total_ms = started.elapsed().as_millis() as u64,
            "Bookmark enriched"
        ),
        Ok(EnrichmentOutcome::Unchanged) => tracing::debug!(
            bookmark_id = %job.bookmark_id,
            scraped_ms,
            "Enrichment found nothing new"
        ),
        Ok(EnrichmentOutcome::Missing) => tracing::debug!(
            bookmark_id = %job.bookmark_id,
            "Bookmark deleted before enrichment finished"
        ),
        Err(err) => tracing::warn!(
            bookmark_id = %job.bookmark_id,
            error = %err,
            "Failed to store enrichment result"
        ),
    }
}

/// Start the enrichment worker on the current tokio runtime.
///
/// At most `concurrency` scrapes run at once and at most `capacity` jobs
/// wait behind them. The worker exits when every [`EnrichmentQueue`] clone
/// has been dropped and in-flight jobs finish.
///
/// # Returns
/// The queue to hand to request handlers and the worker's join handle.
pub fn spawn_enrichment_worker(
    db: Arc<Database>,
    fetcher: Arc<dyn MetadataFetcher>,
    concurrency: usize,
    capacity: usize,
) -> (EnrichmentQueue, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::channel::<EnrichmentJob>(capacity.max(1));
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    let handle = tokio::spawn(async move {
        let mut jobs = tokio::task::JoinSet::new();
        while let Some(job) = receiver.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let db = db.clone();
            let fetcher = fetcher.clone();
            jobs.spawn(async move {
                run_enrichment(&db, fetcher.as_ref(), job).await;
                drop(permit);
            });
            while jobs.try_join_next().is_some() {}
        }
        while jobs.join_next().await.is_some() {}
        tracing::debug!("Enrichment worker stopped");
    });

    (
        EnrichmentQueue {
            sender: Some(sender),
        },
        handle,
    )
}
