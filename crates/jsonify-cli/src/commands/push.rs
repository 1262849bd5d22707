use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use jsonify::{
    BatchResult, Feedback, NewRepository, ProfileChoice, ProfileStore, PushFile, PushPlan,
    PushProfile, RepositoryAction,
};
use jsonify_github::{GitHubContentStore, GitHubContentStoreConfig, parse_repo_url};

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_UPDATE_MESSAGE: &str = "Update JSON file";
const DEFAULT_CREATE_MESSAGE: &str = "Initial commit";

#[derive(Debug, Clone, Default, Args)]
pub struct PushArgs {
    /// The JSON document to push (always written first)
    pub document: PathBuf,
    /// Additional file to include, in the order given
    #[arg(long = "companion", value_name = "FILE")]
    pub companions: Vec<PathBuf>,
    /// Existing repository, e.g. https://github.com/owner/repo.git
    #[arg(long, conflicts_with = "create_repo")]
    pub repo_url: Option<String>,
    /// Create a new repository with this name before pushing
    #[arg(long, value_name = "NAME")]
    pub create_repo: Option<String>,
    /// Owner (GitHub username) of the repository to create
    #[arg(long, requires = "create_repo")]
    pub owner: Option<String>,
    /// Make the created repository private
    #[arg(long, requires = "create_repo")]
    pub private: bool,
    /// Branch to write to
    #[arg(long)]
    pub branch: Option<String>,
    /// Commit message for the document; companions get "(added <name>)" appended
    #[arg(long)]
    pub message: Option<String>,
    /// Directory inside the repository to write files under
    #[arg(long)]
    pub base_path: Option<String>,
    /// Personal access token (defaults to $GITHUB_TOKEN, then the saved profile)
    #[arg(long)]
    pub token: Option<String>,
    /// Remember these settings, including the token, for next time
    #[arg(long, conflicts_with = "forget_profile")]
    pub save_profile: bool,
    /// Delete the saved profile
    #[arg(long)]
    pub forget_profile: bool,
}

/// Settings after applying flag → environment → profile → default precedence.
#[derive(Debug)]
pub struct PushSettings {
    pub repository: RepositoryAction,
    pub branch: String,
    pub message: String,
    pub base_path: Option<String>,
    pub token: String,
    pub profile: ProfileChoice,
}

pub fn resolve_settings(
    args: &PushArgs,
    env_token: Option<String>,
    saved: Option<PushProfile>,
) -> Result<PushSettings> {
    let saved = saved.unwrap_or_default();

    let Some(token) = args.token.clone().or(env_token).or(saved.token) else {
        bail!("a GitHub token is required: pass --token or set GITHUB_TOKEN");
    };

    let (repository, default_message, repo_url, username) = match &args.create_repo {
        Some(name) => {
            let Some(owner) = args.owner.clone().or(saved.username) else {
                bail!("--owner is required when creating a repository");
            };
            let url = format!("https://github.com/{owner}/{name}.git");
            let action = RepositoryAction::CreateRepository(NewRepository {
                owner: owner.clone(),
                name: name.clone(),
                private: args.private,
            });
            (action, DEFAULT_CREATE_MESSAGE, url, Some(owner))
        }
        None => {
            let Some(url) = args.repo_url.clone().or(saved.repo_url) else {
                bail!("no repository given: pass --repo-url or --create-repo");
            };
            let repository = parse_repo_url(&url)?;
            (
                RepositoryAction::UseExisting(repository),
                DEFAULT_UPDATE_MESSAGE,
                url,
                saved.username,
            )
        }
    };

    let branch = args
        .branch
        .clone()
        .or(saved.branch)
        .unwrap_or_else(|| DEFAULT_BRANCH.to_owned());
    let message = args
        .message
        .clone()
        .or(saved.commit_message)
        .unwrap_or_else(|| default_message.to_owned());
    let base_path = args.base_path.clone().or(saved.base_path);

    let profile = if args.save_profile {
        ProfileChoice::Remember(PushProfile {
            repo_url: Some(repo_url),
            username,
            branch: Some(branch.clone()),
            commit_message: Some(message.clone()),
            base_path: base_path.clone(),
            token: Some(token.clone()),
        })
    } else if args.forget_profile {
        ProfileChoice::Forget
    } else {
        ProfileChoice::Keep
    };

    Ok(PushSettings {
        repository,
        branch,
        message,
        base_path,
        token,
        profile,
    })
}

fn read_push_file(path: &Path) -> Result<PushFile> {
    let content =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok(PushFile::new(name, content))
}

/// Print batch feedback to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}

/// Run a push and report the outcome. Fails if any file was not written.
pub async fn run(
    args: &PushArgs,
    profiles: &dyn ProfileStore,
    saved: Option<PushProfile>,
    env_token: Option<String>,
    api_base_url: Option<String>,
) -> Result<BatchResult> {
    let settings = resolve_settings(args, env_token, saved)?;

    let mut plan = PushPlan::new(
        settings.repository,
        settings.branch,
        settings.message,
        read_push_file(&args.document)?,
    )
    .with_profile(settings.profile);

    for companion in &args.companions {
        plan = plan.with_companion(read_push_file(companion)?);
    }
    if let Some(base_path) = settings.base_path {
        plan = plan.with_base_path(base_path);
    }

    let store = GitHubContentStore::new(GitHubContentStoreConfig {
        token: settings.token,
        api_base_url,
    })?;

    println!("Pushing {} file(s)...", 1 + args.companions.len());
    let result = jsonify::push(store, profiles, plan).await?;
    print_feedback(&result.feedback);

    if let Some(failed_at) = &result.failed_at {
        bail!(
            "push stopped at {failed_at}; {} file(s) were written before it",
            result.succeeded.len()
        );
    }

    println!("Pushed {} file(s).", result.succeeded.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use jsonify::RepositoryRef;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::TomlProfileStore;

    use super::*;

    fn args_for(document: PathBuf) -> PushArgs {
        PushArgs {
            document,
            repo_url: Some("https://github.com/test-owner/test-repo.git".into()),
            ..Default::default()
        }
    }

    #[test]
    fn flags_override_profile() {
        let mut args = args_for(PathBuf::from("a.json"));
        args.branch = Some("release".into());
        let saved = PushProfile {
            branch: Some("develop".into()),
            commit_message: Some("Nightly".into()),
            token: Some("saved-token".into()),
            ..Default::default()
        };

        let settings = resolve_settings(&args, None, Some(saved)).unwrap();

        assert_eq!(settings.branch, "release");
        assert_eq!(settings.message, "Nightly");
        assert_eq!(settings.token, "saved-token");
        assert_eq!(
            settings.repository,
            RepositoryAction::UseExisting(RepositoryRef::new("test-owner", "test-repo"))
        );
    }

    #[test]
    fn env_token_beats_saved_token() {
        let args = args_for(PathBuf::from("a.json"));
        let saved = PushProfile {
            token: Some("saved".into()),
            ..Default::default()
        };

        let settings = resolve_settings(&args, Some("env".into()), Some(saved)).unwrap();
        assert_eq!(settings.token, "env");
    }

    #[test]
    fn defaults_apply_without_profile() {
        let args = args_for(PathBuf::from("a.json"));
        let settings = resolve_settings(&args, Some("t".into()), None).unwrap();

        assert_eq!(settings.branch, "main");
        assert_eq!(settings.message, "Update JSON file");
        assert_eq!(settings.profile, ProfileChoice::Keep);
    }

    #[test]
    fn missing_token_is_an_error() {
        let args = args_for(PathBuf::from("a.json"));
        let err = resolve_settings(&args, None, None).unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn create_repo_uses_initial_commit_and_remembers_url() {
        let args = PushArgs {
            document: PathBuf::from("a.json"),
            create_repo: Some("fresh".into()),
            owner: Some("octo".into()),
            private: true,
            save_profile: true,
            ..Default::default()
        };

        let settings = resolve_settings(&args, Some("t".into()), None).unwrap();

        assert_eq!(settings.message, "Initial commit");
        assert_eq!(
            settings.repository,
            RepositoryAction::CreateRepository(NewRepository {
                owner: "octo".into(),
                name: "fresh".into(),
                private: true,
            })
        );
        match settings.profile {
            ProfileChoice::Remember(profile) => {
                assert_eq!(
                    profile.repo_url.as_deref(),
                    Some("https://github.com/octo/fresh.git")
                );
                assert_eq!(profile.username.as_deref(), Some("octo"));
                assert_eq!(profile.token.as_deref(), Some("t"));
            }
            other => panic!("expected Remember, got {other:?}"),
        }
    }

    #[test]
    fn create_repo_needs_owner() {
        let args = PushArgs {
            document: PathBuf::from("a.json"),
            create_repo: Some("fresh".into()),
            ..Default::default()
        };
        assert!(resolve_settings(&args, Some("t".into()), None).is_err());
    }

    #[test]
    fn forget_profile_choice() {
        let mut args = args_for(PathBuf::from("a.json"));
        args.forget_profile = true;
        let settings = resolve_settings(&args, Some("t".into()), None).unwrap();
        assert_eq!(settings.profile, ProfileChoice::Forget);
    }

    #[tokio::test]
    async fn pushes_document_and_companion_by_file_name() {
        let server = MockServer::start().await;
        for file in ["controls.json", "notes.md"] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/test-owner/test-repo/contents/{file}")))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path(format!("/repos/test-owner/test-repo/contents/{file}")))
                .respond_with(ResponseTemplate::new(201))
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("controls.json");
        std::fs::write(&document, "[]").unwrap();
        let notes = dir.path().join("notes.md");
        std::fs::write(&notes, "# notes").unwrap();

        let mut args = args_for(document);
        args.companions = vec![notes];
        args.save_profile = true;
        let profiles = TomlProfileStore::new(dir.path().join("profile.toml"));

        let result = run(&args, &profiles, None, Some("t".into()), Some(server.uri()))
            .await
            .unwrap();

        assert_eq!(result.succeeded, vec!["controls.json", "notes.md"]);

        let saved = profiles.load().unwrap().unwrap();
        assert_eq!(saved.branch.as_deref(), Some("main"));

        let requests = server.received_requests().await.unwrap();
        let first_put: Value = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .unwrap();
        assert_eq!(first_put["content"], "W10=");
    }

    #[tokio::test]
    async fn saved_profile_follows_the_created_repository() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_string(r#"{"name":"fresh","owner":{"login":"octo-user"}}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-user/fresh/contents/controls.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo-user/fresh/contents/controls.json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("controls.json");
        std::fs::write(&document, "[]").unwrap();
        let profiles = TomlProfileStore::new(dir.path().join("profile.toml"));
        let args = PushArgs {
            document,
            create_repo: Some("fresh".into()),
            owner: Some("octo-org".into()),
            save_profile: true,
            ..Default::default()
        };

        let result = run(&args, &profiles, None, Some("t".into()), Some(server.uri()))
            .await
            .unwrap();

        assert!(result.feedback.iter().any(Feedback::is_warning));
        let saved = profiles.load().unwrap().unwrap();
        assert_eq!(
            saved.repo_url.as_deref(),
            Some("https://github.com/octo-user/fresh.git")
        );
        assert_eq!(saved.username.as_deref(), Some("octo-user"));
    }

    #[tokio::test]
    async fn failed_push_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/test-owner/test-repo/contents/controls.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("controls.json");
        std::fs::write(&document, "[]").unwrap();
        let profiles = TomlProfileStore::new(dir.path().join("profile.toml"));

        let err = run(
            &args_for(document),
            &profiles,
            None,
            Some("t".into()),
            Some(server.uri()),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("controls.json"));
    }
}
