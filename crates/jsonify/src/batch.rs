use crate::feedback::Feedback;
use crate::remote::{ContentStore, RemoteFile, RepositoryRef, SyncError, UpsertOutcome, VersionToken};

/// One attempted write against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub target: RemoteFile,
    pub content: Vec<u8>,
    pub message: String,
    /// Version believed current. `None` means "create".
    pub version: Option<VersionToken>,
}

/// A file queued in a [`SyncBatch`], addressed by its remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
}

/// Ordered set of file writes for one push.
///
/// The primary document is always the first entry; companions follow in
/// the order they were added. Companions get the commit message
/// `"{message} (added {file name})"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBatch {
    repository: RepositoryRef,
    branch: String,
    message: String,
    files: Vec<BatchFile>,
}

impl SyncBatch {
    pub fn new(
        repository: RepositoryRef,
        branch: impl Into<String>,
        message: impl Into<String>,
        primary_path: impl Into<String>,
        primary_content: Vec<u8>,
    ) -> Self {
        let message = message.into();
        let primary = BatchFile {
            path: primary_path.into(),
            content: primary_content,
            message: message.clone(),
        };

        Self {
            repository,
            branch: branch.into(),
            message,
            files: vec![primary],
        }
    }

    /// Queue a companion file after everything already in the batch.
    pub fn add_companion(&mut self, path: impl Into<String>, content: Vec<u8>) {
        let path = path.into();
        let message = format!("{} (added {})", self.message, file_name(&path));
        self.files.push(BatchFile {
            path,
            content,
            message,
        });
    }

    pub fn files(&self) -> &[BatchFile] {
        &self.files
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// The remaining suffix of this batch starting at `path`, for re-driving
    /// a batch after a failure. Returns `None` if `path` is not queued.
    pub fn resume_from(&self, path: &str) -> Option<SyncBatch> {
        let start = self.files.iter().position(|f| f.path == path)?;
        Some(Self {
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            message: self.message.clone(),
            files: self.files[start..].to_vec(),
        })
    }

    fn target(&self, file: &BatchFile) -> RemoteFile {
        RemoteFile::new(self.repository.clone(), &file.path, &self.branch)
    }
}

/// What happened to a batch.
///
/// `succeeded` is always a prefix of the batch's paths. When a file fails,
/// `failed_at` names it, `error` holds the store's answer, and nothing after
/// it was attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: Vec<String>,
    pub failed_at: Option<String>,
    pub error: Option<SyncError>,
    pub feedback: Vec<Feedback>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}

/// Drives a [`SyncBatch`] against a [`ContentStore`], one file at a time.
pub struct BatchSynchronizer<S> {
    store: S,
}

impl<S: ContentStore> BatchSynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve and upsert every file in order, halting at the first failure.
    ///
    /// Files already written stay written; there is no rollback.
    pub async fn sync_batch(&self, batch: &SyncBatch) -> BatchResult {
        let mut result = BatchResult::default();

        for file in batch.files() {
            let target = batch.target(file);

            match self.sync_file(target, file).await {
                Ok(outcome) => {
                    tracing::info!(path = %file.path, %outcome, "file written");
                    result
                        .feedback
                        .push(Feedback::info(format!("{outcome} {}", file.path)));
                    result.succeeded.push(file.path.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        path = %file.path,
                        status = e.status(),
                        remaining = batch.files().len() - result.succeeded.len() - 1,
                        "batch halted"
                    );
                    result.feedback.push(Feedback::error(e.to_string()));
                    result.failed_at = Some(file.path.clone());
                    result.error = Some(e);
                    break;
                }
            }
        }

        result
    }

    async fn sync_file(&self, target: RemoteFile, file: &BatchFile) -> Result<UpsertOutcome, SyncError> {
        tracing::debug!(file = %target, store = self.store.label(), "resolving version");
        let version = self.store.resolve_version(&target).await?.into_token();

        let request = SyncRequest {
            target,
            content: file.content.clone(),
            message: file.message.clone(),
            version,
        };

        self.store.upsert(&request).await
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
