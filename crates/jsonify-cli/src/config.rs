use std::path::{Path, PathBuf};

use jsonify::{ProfileError, ProfileStore, PushProfile};

/// Profile file path: `~/.config/jsonify/profile.toml`
pub fn profile_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jsonify").join("profile.toml"))
}

/// Environment variable overriding the GitHub API base URL.
pub const API_URL_ENV: &str = "JSONIFY_API_URL";

pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}

pub fn api_base_url() -> Option<String> {
    std::env::var(API_URL_ENV).ok().filter(|u| !u.is_empty())
}

/// Stores the push profile as a TOML file.
pub struct TomlProfileStore {
    path: PathBuf,
}

impl TomlProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile, treating an unreadable file as absent.
    pub fn load_or_warn(&self) -> Option<PushProfile> {
        match self.load() {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!(
                    "warning: ignoring saved profile at {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }
}

impl ProfileStore for TomlProfileStore {
    fn load(&self) -> Result<Option<PushProfile>, ProfileError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&contents)
            .map(Some)
            .map_err(|e| ProfileError::Parse(e.to_string()))
    }

    fn save(&self, profile: &PushProfile) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(profile).map_err(|e| ProfileError::Encode(e.to_string()))?;
        std::fs::write(&self.path, contents)?;

        // The file may hold a token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), ProfileError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TomlProfileStore {
        TomlProfileStore::new(dir.path().join("nested").join("profile.toml"))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let profile = PushProfile {
            repo_url: Some("https://github.com/octo/controls.git".into()),
            branch: Some("main".into()),
            token: Some("ghp_abc".into()),
            ..Default::default()
        };

        store.save(&profile).unwrap();
        assert_eq!(store.load().unwrap(), Some(profile));
    }

    #[cfg(unix)]
    #[test]
    fn saved_profile_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&PushProfile::default()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn parses_hand_written_toml() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            "repo_url = \"octo/controls\"\ncommit_message = \"Nightly export\"\n",
        )
        .unwrap();

        let profile = store.load().unwrap().unwrap();
        assert_eq!(profile.repo_url.as_deref(), Some("octo/controls"));
        assert_eq!(profile.commit_message.as_deref(), Some("Nightly export"));
        assert!(profile.token.is_none());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "repo_url = [").unwrap();

        assert!(matches!(store.load(), Err(ProfileError::Parse(_))));
        assert!(store.load_or_warn().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&PushProfile::default()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
