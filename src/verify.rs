use async_trait::async_trait;

use crate::stub::RequestPattern;

/// The journal's answer to "how many recorded requests already match this
/// pattern". The count includes the request currently being recorded, since
/// the journal observes every request before recording runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    count: u64,
    journal_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDisabledError;

impl std::fmt::Display for JournalDisabledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("the request journal is disabled, so recording cannot deduplicate exchanges")
    }
}

impl std::error::Error for JournalDisabledError {}

impl VerificationResult {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            journal_enabled: true,
        }
    }

    pub fn journal_disabled() -> Self {
        Self {
            count: 0,
            journal_enabled: false,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// A disabled journal is a configuration error, not a licence to record
    /// unbounded duplicates.
    pub fn assert_journal_enabled(&self) -> Result<(), JournalDisabledError> {
        if self.journal_enabled {
            Ok(())
        } else {
            Err(JournalDisabledError)
        }
    }
}

/// Point-in-time count query against the external request journal. Safe to
/// call from concurrently handled exchanges.
#[async_trait]
pub trait RequestJournal: Send + Sync {
    async fn count_requests_matching(
        &self,
        pattern: &RequestPattern,
    ) -> anyhow::Result<VerificationResult>;
}
