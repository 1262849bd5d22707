pub mod batch;
pub mod document;
pub mod feedback;
pub mod profile;
pub mod push;
pub mod record;
pub mod remote;

pub use batch::{BatchFile, BatchResult, BatchSynchronizer, SyncBatch, SyncRequest};
pub use document::{DocumentAction, DocumentError, append_to_document, create_document};
pub use feedback::{Feedback, Severity};
pub use profile::{ProfileChoice, ProfileError, ProfileStore, PushProfile};
pub use push::{PushError, PushFile, PushPlan, RepositoryAction, push};
pub use record::{Record, record};
pub use remote::{
    ContentStore, NewRepository, RemoteFile, RepositoryRef, Resolution, SyncError,
    TRANSPORT_FAILURE_STATUS, UpsertOutcome, VersionToken,
};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
