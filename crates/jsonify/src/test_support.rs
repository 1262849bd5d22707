use std::collections::HashMap;
use std::sync::Mutex;

use crate::batch::SyncRequest;
use crate::profile::{ProfileError, ProfileStore, PushProfile};
use crate::remote::{
    ContentStore, NewRepository, RemoteFile, RepositoryRef, Resolution, SyncError, UpsertOutcome,
    VersionToken,
};

/// A call observed by [`InMemoryContentStore`], named by remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Resolve(String),
    Upsert(String),
    CreateRepository(String),
}

impl RecordedCall {
    pub fn path(&self) -> &str {
        match self {
            Self::Resolve(p) | Self::Upsert(p) | Self::CreateRepository(p) => p,
        }
    }
}

#[derive(Default)]
struct State {
    versions: HashMap<RemoteFile, VersionToken>,
    next_version: u64,
    calls: Vec<RecordedCall>,
    upserts: Vec<SyncRequest>,
    resolve_failures: HashMap<String, (u16, String)>,
    upsert_failures: HashMap<String, (u16, String)>,
    create_failure: Option<(u16, String)>,
    login: Option<String>,
}

/// In-memory content store for testing.
///
/// Enforces the same version discipline as a real store: creating an
/// existing path or updating with a stale token is rejected.
#[derive(Default)]
pub struct InMemoryContentStore {
    state: Mutex<State>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a file as present at `version` without recording a call.
    pub fn seed(&self, target: &RemoteFile, version: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .versions
            .insert(target.clone(), VersionToken::new(version));
    }

    pub fn fail_resolve(&self, path: &str, status: u16, body: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .resolve_failures
            .insert(path.to_owned(), (status, body.to_owned()));
    }

    pub fn fail_upsert(&self, path: &str, status: u16, body: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .upsert_failures
            .insert(path.to_owned(), (status, body.to_owned()));
    }

    pub fn fail_create_repository(&self, status: u16, body: &str) {
        self.state.lock().unwrap().create_failure = Some((status, body.to_owned()));
    }

    /// Create repositories under `login`, the way GitHub creates them under
    /// the authenticated user whatever owner was asked for.
    pub fn create_under(&self, login: &str) {
        self.state.lock().unwrap().login = Some(login.to_owned());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.resolve_failures.clear();
        state.upsert_failures.clear();
        state.create_failure = None;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn upserts(&self) -> Vec<SyncRequest> {
        self.state.lock().unwrap().upserts.clone()
    }
}

#[async_trait::async_trait]
impl ContentStore for InMemoryContentStore {
    fn label(&self) -> &str {
        "in-memory"
    }

    async fn resolve_version(&self, target: &RemoteFile) -> Result<Resolution, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::Resolve(target.path.clone()));

        if let Some((status, body)) = state.resolve_failures.get(&target.path) {
            return Err(SyncError::Resolve {
                path: target.path.clone(),
                status: *status,
                body: body.clone(),
            });
        }

        Ok(match state.versions.get(target) {
            Some(version) => Resolution::Found(version.clone()),
            None => Resolution::Absent,
        })
    }

    async fn upsert(&self, request: &SyncRequest) -> Result<UpsertOutcome, SyncError> {
        let mut state = self.state.lock().unwrap();
        let path = request.target.path.clone();
        state.calls.push(RecordedCall::Upsert(path.clone()));
        state.upserts.push(request.clone());

        let reject = |status: u16, body: &str| SyncError::Write {
            path: path.clone(),
            status,
            body: body.to_owned(),
        };

        if let Some((status, body)) = state.upsert_failures.get(&path) {
            return Err(reject(*status, body));
        }

        let current = state.versions.get(&request.target).cloned();
        let outcome = match (&current, &request.version) {
            (None, None) => UpsertOutcome::Created,
            (Some(current), Some(given)) if current == given => UpsertOutcome::Updated,
            (Some(_), None) => return Err(reject(422, "\"sha\" wasn't supplied")),
            (_, Some(_)) => return Err(reject(409, "sha does not match")),
        };

        state.next_version += 1;
        let version = VersionToken::new(format!("v{}", state.next_version));
        state.versions.insert(request.target.clone(), version);

        Ok(outcome)
    }

    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryRef, SyncError> {
        let mut state = self.state.lock().unwrap();
        let created = repository.repository();
        state
            .calls
            .push(RecordedCall::CreateRepository(created.to_string()));

        if let Some((status, body)) = state.create_failure.clone() {
            return Err(SyncError::CreateRepository {
                repository: created.to_string(),
                status,
                body,
            });
        }

        Ok(match &state.login {
            Some(login) => RepositoryRef::new(login.clone(), &repository.name),
            None => created,
        })
    }
}

/// In-memory [`ProfileStore`] for testing.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profile: Mutex<Option<PushProfile>>,
}

impl InMemoryProfileStore {
    pub fn with(profile: PushProfile) -> Self {
        Self {
            profile: Mutex::new(Some(profile)),
        }
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load(&self) -> Result<Option<PushProfile>, ProfileError> {
        Ok(self.profile.lock().unwrap().clone())
    }

    fn save(&self, profile: &PushProfile) -> Result<(), ProfileError> {
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ProfileError> {
        *self.profile.lock().unwrap() = None;
        Ok(())
    }
}
