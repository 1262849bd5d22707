use std::fmt;

use serde::{Deserialize, Serialize};

use crate::remote::RepositoryRef;

/// Push settings an operator asked to have remembered.
///
/// Every field is optional so a partially filled profile still loads.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PushProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl PushProfile {
    /// The token with everything but its last four characters hidden.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_deref().map(mask)
    }

    /// Point the profile at `repository` on github.com.
    pub fn retarget(&mut self, repository: &RepositoryRef) {
        self.repo_url = Some(format!("https://github.com/{repository}.git"));
        self.username = Some(repository.owner.clone());
    }
}

// The token must never reach logs through `{:?}`.
impl fmt::Debug for PushProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushProfile")
            .field("repo_url", &self.repo_url)
            .field("username", &self.username)
            .field("branch", &self.branch)
            .field("commit_message", &self.commit_message)
            .field("base_path", &self.base_path)
            .field("token", &self.masked_token())
            .finish()
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

/// Errors from persisting or loading a [`PushProfile`].
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile: {0}")]
    Parse(String),

    #[error("failed to encode profile: {0}")]
    Encode(String),
}

/// Key-value storage for the remembered profile, injected into a push.
pub trait ProfileStore: Send + Sync {
    fn load(&self) -> Result<Option<PushProfile>, ProfileError>;
    fn save(&self, profile: &PushProfile) -> Result<(), ProfileError>;
    fn clear(&self) -> Result<(), ProfileError>;
}

/// What a push should do with the remembered profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChoice {
    /// Leave whatever is stored untouched.
    Keep,
    Remember(PushProfile),
    Forget,
}

impl ProfileChoice {
    pub fn apply(&self, store: &dyn ProfileStore) -> Result<(), ProfileError> {
        match self {
            Self::Keep => Ok(()),
            Self::Remember(profile) => store.save(profile),
            Self::Forget => store.clear(),
        }
    }
}
