use std::io::{self, Read as _};
use std::sync::Arc;

use bytes::Bytes;
use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::{
    config::Config,
    exchange::{Request, Response},
    files::{DiskFileSource, FileSource, FileSourceError},
    ids::{IdGenerator, RandomIdGenerator},
    naming,
    notify::{Notifier, TracingNotifier},
    stub::{RequestPattern, ResponseDefinition, StubMapping},
    verify::{JournalDisabledError, RequestJournal},
};

const MAPPING_ROLE: &str = "mapping";
const BODY_ROLE: &str = "body";

/// Whether recorded response bodies are stored as received or gunzipped
/// first.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecompressionMode {
    #[default]
    None,
    Gzip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRecorded,
    NotFromProxy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded {
        mapping_file_name: String,
        body_file_name: String,
    },
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum RecordError {
    JournalDisabled(JournalDisabledError),
    Journal(anyhow::Error),
    Decompress(io::Error),
    SerializeMapping(serde_json::Error),
    Storage(FileSourceError),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JournalDisabled(err) => write!(f, "{err}"),
            Self::Journal(_) => f.write_str("count journaled requests matching the pattern"),
            Self::Decompress(_) => f.write_str("decompress gzip-encoded response body"),
            Self::SerializeMapping(_) => f.write_str("serialize stub mapping"),
            Self::Storage(_) => f.write_str("persist recorded files"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JournalDisabled(err) => Some(err),
            Self::Journal(err) => Some(err.as_ref()),
            Self::Decompress(err) => Some(err),
            Self::SerializeMapping(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

/// Turns completed proxied exchanges into persisted stub mappings.
///
/// The recorder holds no mutable state: every collaborator is injected at
/// construction, and each call to [`record`](Self::record) is a short,
/// self-contained unit of work, so one recorder can serve many concurrently
/// handled connections.
pub struct StubRecorder {
    mappings: Arc<dyn FileSource>,
    files: Arc<dyn FileSource>,
    journal: Arc<dyn RequestJournal>,
    ids: Arc<dyn IdGenerator>,
    notifier: Arc<dyn Notifier>,
    decompression: DecompressionMode,
}

impl StubRecorder {
    pub fn new(
        mappings: Arc<dyn FileSource>,
        files: Arc<dyn FileSource>,
        journal: Arc<dyn RequestJournal>,
        decompression: DecompressionMode,
    ) -> Self {
        Self {
            mappings,
            files,
            journal,
            ids: Arc::new(RandomIdGenerator),
            notifier: Arc::new(TracingNotifier),
            decompression,
        }
    }

    /// Builds a recorder with disk-backed storage from the configuration.
    /// The journal stays caller-provided: it belongs to whichever component
    /// observes the traffic.
    pub fn from_config(config: &Config, journal: Arc<dyn RequestJournal>) -> anyhow::Result<Self> {
        let mappings = DiskFileSource::new(&config.storage.mappings_dir)?;
        let files = DiskFileSource::new(&config.storage.files_dir)?;
        Ok(Self::new(
            Arc::new(mappings),
            Arc::new(files),
            journal,
            config.record.decompress,
        ))
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Decides whether the exchange is new and, when it is, persists one
    /// mapping file and one body file.
    ///
    /// The dedup check and the writes are not atomic: two near-simultaneous
    /// identical requests can both observe a count of 1 and both record. The
    /// redundant stub files are harmless, so no cross-exchange lock is taken.
    pub async fn record(
        &self,
        request: &Request,
        response: &Response,
    ) -> Result<RecordOutcome, RecordError> {
        let pattern = RequestPattern::from_request(request);
        let body = self.normalized_body(response)?;

        let verification = self
            .journal
            .count_requests_matching(&pattern)
            .await
            .map_err(RecordError::Journal)?;
        verification
            .assert_journal_enabled()
            .map_err(RecordError::JournalDisabled)?;

        if verification.count() > 1 {
            self.notifier.info(&format!(
                "Not recording mapping for {} as this has already been received",
                request.url
            ));
            return Ok(RecordOutcome::Skipped(SkipReason::AlreadyRecorded));
        }
        if !response.from_proxy {
            self.notifier.info(&format!(
                "Not recording mapping for {} as the response was served locally",
                request.url
            ));
            return Ok(RecordOutcome::Skipped(SkipReason::NotFromProxy));
        }

        self.notifier
            .info(&format!("Recording mappings for {}", request.url));
        self.write_mapping_and_body(request, response, &body, pattern)
            .await
    }

    fn normalized_body(&self, response: &Response) -> Result<Bytes, RecordError> {
        if self.decompression == DecompressionMode::Gzip && response.gzip_encoded {
            let mut decoder = GzDecoder::new(response.body.as_ref());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(RecordError::Decompress)?;
            return Ok(Bytes::from(decompressed));
        }
        Ok(response.body.clone())
    }

    async fn write_mapping_and_body(
        &self,
        request: &Request,
        response: &Response,
        body: &Bytes,
        pattern: RequestPattern,
    ) -> Result<RecordOutcome, RecordError> {
        let file_id = self.ids.generate();
        let mapping_file_name = naming::filename_for(request, MAPPING_ROLE, &file_id);
        let body_file_name = naming::filename_for(request, BODY_ROLE, &file_id);

        let definition = ResponseDefinition::from_response(response, body_file_name.clone());
        let mapping = StubMapping::new(pattern, definition);
        let mapping_json = mapping.to_json().map_err(RecordError::SerializeMapping)?;

        // Body first: a visible mapping file must never reference a body that
        // does not exist yet.
        self.files
            .write_binary(&body_file_name, body)
            .await
            .map_err(RecordError::Storage)?;
        self.mappings
            .write_text(&mapping_file_name, &mapping_json)
            .await
            .map_err(RecordError::Storage)?;

        Ok(RecordOutcome::Recorded {
            mapping_file_name,
            body_file_name,
        })
    }
}
