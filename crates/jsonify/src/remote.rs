use std::fmt;
use std::sync::Arc;

use crate::batch::SyncRequest;

/// Status reported for failures that never produced an HTTP response
/// (DNS, connection reset, timeout).
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Opaque content version assigned by the remote store.
///
/// Required to update an existing path, must be omitted to create one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A repository in the remote store, addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository to create before the first push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub owner: String,
    pub name: String,
    pub private: bool,
}

impl NewRepository {
    pub fn repository(&self) -> RepositoryRef {
        RepositoryRef::new(&self.owner, &self.name)
    }
}

/// A single path on a single branch of a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFile {
    pub repository: RepositoryRef,
    pub path: String,
    pub branch: String,
}

impl RemoteFile {
    pub fn new(repository: RepositoryRef, path: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repository,
            path: path.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.repository, self.path, self.branch)
    }
}

/// Outcome of looking up the current version of a remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path exists on the branch at this version.
    Found(VersionToken),
    /// The path does not exist on the branch yet. Not an error.
    Absent,
}

impl Resolution {
    pub fn into_token(self) -> Option<VersionToken> {
        match self {
            Self::Found(token) => Some(token),
            Self::Absent => None,
        }
    }
}

/// Which of the two success classes an upsert landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Errors reported by a remote content store.
///
/// Every variant carries the response status and body verbatim so the
/// operator sees exactly what the store said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("failed to resolve {path} (HTTP {status}): {body}")]
    Resolve {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to write {path} (HTTP {status}): {body}")]
    Write {
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to create repository {repository} (HTTP {status}): {body}")]
    CreateRepository {
        repository: String,
        status: u16,
        body: String,
    },
}

impl SyncError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Resolve { status, .. }
            | Self::Write { status, .. }
            | Self::CreateRepository { status, .. } => *status,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Resolve { body, .. }
            | Self::Write { body, .. }
            | Self::CreateRepository { body, .. } => body,
        }
    }

    /// True when the failure happened below HTTP.
    pub fn is_transport(&self) -> bool {
        self.status() == TRANSPORT_FAILURE_STATUS
    }
}

/// A remote store of versioned blobs addressed by path.
///
/// Implementations are stateless between calls: nothing about remote
/// state is cached, so every call observes the store as it is now.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Human-readable label identifying this store.
    fn label(&self) -> &str;

    /// Look up the current version of `target`.
    ///
    /// Returns [`Resolution::Absent`] only when the store reports the path
    /// as not found; every other non-success is a [`SyncError::Resolve`].
    async fn resolve_version(&self, target: &RemoteFile) -> Result<Resolution, SyncError>;

    /// Create or update `request.target` with `request.content`.
    ///
    /// A request carrying a version token updates the existing blob; one
    /// without creates it. Never retried.
    async fn upsert(&self, request: &SyncRequest) -> Result<UpsertOutcome, SyncError>;

    /// Create an empty, initialized repository owned by the authenticated user.
    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryRef, SyncError>;
}

#[async_trait::async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn resolve_version(&self, target: &RemoteFile) -> Result<Resolution, SyncError> {
        (**self).resolve_version(target).await
    }

    async fn upsert(&self, request: &SyncRequest) -> Result<UpsertOutcome, SyncError> {
        (**self).upsert(request).await
    }

    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryRef, SyncError> {
        (**self).create_repository(repository).await
    }
}

#[async_trait::async_trait]
impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn resolve_version(&self, target: &RemoteFile) -> Result<Resolution, SyncError> {
        (**self).resolve_version(target).await
    }

    async fn upsert(&self, request: &SyncRequest) -> Result<UpsertOutcome, SyncError> {
        (**self).upsert(request).await
    }

    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryRef, SyncError> {
        (**self).create_repository(repository).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_into_token() {
        let found = Resolution::Found(VersionToken::new("abc123"));
        assert_eq!(found.into_token(), Some(VersionToken::new("abc123")));
        assert_eq!(Resolution::Absent.into_token(), None);
    }

    #[test]
    fn sync_error_exposes_status_and_body() {
        let err = SyncError::Write {
            path: "primary.json".into(),
            status: 409,
            body: r#"{"message":"sha does not match"}"#.into(),
        };
        assert_eq!(err.status(), 409);
        assert_eq!(err.body(), r#"{"message":"sha does not match"}"#);
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            r#"failed to write primary.json (HTTP 409): {"message":"sha does not match"}"#
        );
    }

    #[test]
    fn transport_failures_use_synthetic_status() {
        let err = SyncError::Resolve {
            path: "primary.json".into(),
            status: TRANSPORT_FAILURE_STATUS,
            body: "connection refused".into(),
        };
        assert!(err.is_transport());
    }

    #[test]
    fn remote_file_display() {
        let file = RemoteFile::new(RepositoryRef::new("octo", "controls"), "data/a.json", "main");
        assert_eq!(file.to_string(), "octo/controls:data/a.json@main");
    }
}
