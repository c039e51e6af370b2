use crate::{Article, ItemError};

/// What happened to a single article during a run.
#[derive(Debug)]
pub enum ItemOutcome {
    /// A file was already present at the target path.
    Skipped,
    Downloaded { bytes: u64 },
    Failed(ItemError),
}

impl ItemOutcome {
    /// True when the file is now present locally.
    pub fn is_synced(&self) -> bool {
        matches!(self, ItemOutcome::Skipped | ItemOutcome::Downloaded { .. })
    }
}

#[derive(Debug)]
pub struct ItemReport {
    pub article: Article,
    pub outcome: ItemOutcome,
}

/// Per-run accumulator, in pending-list order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub items: Vec<ItemReport>,
    /// Set once the server accepted the acknowledgment.
    pub acknowledged: bool,
}

impl SyncReport {
    pub fn push(&mut self, article: Article, outcome: ItemOutcome) {
        self.items.push(ItemReport { article, outcome });
    }

    /// Filenames confirmed present locally, in list order.
    pub fn success_set(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.outcome.is_synced())
            .map(|item| item.article.filename.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Failed(_)))
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.items
            .iter()
            .map(|item| match item.outcome {
                ItemOutcome::Downloaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// One-line tally for the end-of-run log.
    pub fn summary(&self) -> String {
        format!(
            "downloaded={} skipped={} failed={} bytes={}",
            self.downloaded(),
            self.skipped(),
            self.failed(),
            self.bytes_downloaded()
        )
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items
            .iter()
            .filter(|item| predicate(&item.outcome))
            .count()
    }
}
