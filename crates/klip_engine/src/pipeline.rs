//! List, materialize, acknowledge.
//!
//! One pass per process. Item failures are recorded in the [`SyncReport`] and
//! never stop the loop; only the pending list and the acknowledgment can fail
//! the run.
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use klip_logging::{klip_debug, klip_info, klip_warn};
use thiserror::Error;

use crate::persist::{is_already_synced, local_target, AtomicDownload};
use crate::{Article, ItemOutcome, PersistError, RemoteClient, RemoteError, SyncReport};

/// Failure confined to a single article.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Run-aborting failure.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list pending articles: {0}")]
    List(#[source] RemoteError),
    /// Downloads are on disk but the server still lists them.
    #[error("failed to batch delete downloaded articles: {source}")]
    Acknowledge {
        #[source]
        source: RemoteError,
        report: SyncReport,
    },
}

pub struct SyncPipeline<C> {
    client: C,
    download_dir: PathBuf,
}

impl<C: RemoteClient> SyncPipeline<C> {
    pub fn new(client: C, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let articles = self.client.list_pending().await.map_err(SyncError::List)?;
        if articles.is_empty() {
            klip_info!("No new articles to download");
            return Ok(SyncReport::default());
        }
        klip_info!("{} pending article(s)", articles.len());

        let mut report = SyncReport::default();
        for article in articles {
            let outcome = self.materialize(&article).await;
            log_outcome(&article, &outcome);
            report.push(article, outcome);
        }
        klip_info!("Sync finished: {}", report.summary());

        let successes = report.success_set();
        if successes.is_empty() {
            klip_warn!("No article was synced, nothing to acknowledge");
            return Ok(report);
        }

        if let Err(source) = self.client.acknowledge_batch(&successes).await {
            return Err(SyncError::Acknowledge { source, report });
        }
        report.acknowledged = true;
        klip_info!("Acknowledged {} article(s)", successes.len());
        Ok(report)
    }

    async fn materialize(&self, article: &Article) -> ItemOutcome {
        match self.try_materialize(article).await {
            Ok(outcome) => outcome,
            Err(err) => ItemOutcome::Failed(err),
        }
    }

    async fn try_materialize(&self, article: &Article) -> Result<ItemOutcome, ItemError> {
        let target = local_target(&self.download_dir, &article.filename)?;
        if is_already_synced(&target) {
            return Ok(ItemOutcome::Skipped);
        }

        let mut stream = self
            .client
            .fetch_bytes(&article.download_url, &target)
            .await?;
        let mut download = AtomicDownload::create(&target)?;
        while let Some(chunk) = stream.next().await {
            download.write_chunk(&chunk?)?;
        }
        let bytes = download.commit()?;
        Ok(ItemOutcome::Downloaded { bytes })
    }
}

fn log_outcome(article: &Article, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Skipped => klip_debug!("Already synced: {}", article.filename),
        ItemOutcome::Downloaded { bytes } => {
            klip_info!("Downloaded {} ({} bytes)", article.filename, bytes)
        }
        ItemOutcome::Failed(err) => klip_warn!("Failed to download {}: {}", article.filename, err),
    }
}
