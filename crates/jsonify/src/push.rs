use crate::batch::{BatchResult, BatchSynchronizer, SyncBatch};
use crate::feedback::Feedback;
use crate::profile::{ProfileChoice, ProfileError, ProfileStore};
use crate::remote::{ContentStore, NewRepository, RepositoryRef, SyncError};

/// Where a push lands: an existing repository, or one created first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryAction {
    UseExisting(RepositoryRef),
    CreateRepository(NewRepository),
}

/// A local file to upload, named by its path relative to the base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl PushFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }
}

/// Everything one push needs, already decided by the caller.
#[derive(Debug, Clone)]
pub struct PushPlan {
    pub repository: RepositoryAction,
    pub branch: String,
    pub message: String,
    pub base_path: Option<String>,
    pub primary: PushFile,
    pub companions: Vec<PushFile>,
    pub profile: ProfileChoice,
}

impl PushPlan {
    pub fn new(
        repository: RepositoryAction,
        branch: impl Into<String>,
        message: impl Into<String>,
        primary: PushFile,
    ) -> Self {
        Self {
            repository,
            branch: branch.into(),
            message: message.into(),
            base_path: None,
            primary,
            companions: Vec::new(),
            profile: ProfileChoice::Keep,
        }
    }

    pub fn with_companion(mut self, file: PushFile) -> Self {
        self.companions.push(file);
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_profile(mut self, profile: ProfileChoice) -> Self {
        self.profile = profile;
        self
    }

    fn remote_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self.base_path.as_deref().map(|bp| bp.trim_matches('/')) {
            Some(bp) if !bp.is_empty() => format!("{bp}/{path}"),
            _ => path.to_owned(),
        }
    }

    fn into_batch(self, repository: RepositoryRef) -> SyncBatch {
        let primary_path = self.remote_path(&self.primary.path);
        let companions: Vec<(String, Vec<u8>)> = self
            .companions
            .iter()
            .map(|c| (self.remote_path(&c.path), c.content.clone()))
            .collect();

        let mut batch = SyncBatch::new(
            repository,
            self.branch,
            self.message,
            primary_path,
            self.primary.content,
        );
        for (path, content) in companions {
            batch.add_companion(path, content);
        }
        batch
    }
}

/// Errors that stop a push before its batch runs.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Run one push: create the repository if asked, settle the remembered
/// profile, then sync the batch.
///
/// Repository creation failures are returned as errors and leave the stored
/// profile untouched. Failures inside the batch are reported in the returned
/// [`BatchResult`].
pub async fn push<S: ContentStore>(
    store: S,
    profiles: &dyn ProfileStore,
    mut plan: PushPlan,
) -> Result<BatchResult, PushError> {
    let mut feedback = Vec::new();
    let repository = match &plan.repository {
        RepositoryAction::UseExisting(repository) => repository.clone(),
        RepositoryAction::CreateRepository(new) => {
            let created = store.create_repository(new).await?;
            tracing::info!(repository = %created, private = new.private, "repository created");
            feedback.push(Feedback::info(format!("created repository {created}")));

            if created.owner != new.owner {
                feedback.push(Feedback::warning(format!(
                    "repository was created as {created}, not {}",
                    new.repository()
                )));
            }
            // Remember where the files actually went.
            if let ProfileChoice::Remember(profile) = &mut plan.profile {
                profile.retarget(&created);
            }
            created
        }
    };

    plan.profile.apply(profiles)?;

    let batch = plan.into_batch(repository);
    let mut result = BatchSynchronizer::new(store).sync_batch(&batch).await;

    feedback.append(&mut result.feedback);
    result.feedback = feedback;
    Ok(result)
}
