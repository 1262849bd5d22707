use jsonify::RepositoryRef;

/// Errors parsing a repository reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoUrlError {
    #[error("repository URL is empty")]
    Empty,

    #[error("invalid GitHub repository URL: {0}")]
    Invalid(String),
}

/// Parse a repository reference in any of the forms people paste:
///
/// - `https://github.com/owner/repo` (optionally `.git` or a trailing `/`)
/// - `git@github.com:owner/repo.git`
/// - `owner/repo`
pub fn parse_repo_url(input: &str) -> Result<RepositoryRef, RepoUrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RepoUrlError::Empty);
    }

    let without_slash = trimmed.trim_end_matches('/');
    let bare = without_slash.strip_suffix(".git").unwrap_or(without_slash);

    let path = if let Some(rest) = bare.strip_prefix("git@") {
        rest.split_once(':').map(|(_, path)| path)
    } else if let Some((_, rest)) = bare.split_once("://") {
        rest.split_once('/').map(|(_, path)| path)
    } else {
        Some(bare)
    };

    let invalid = || RepoUrlError::Invalid(input.to_owned());
    let mut segments = path.ok_or_else(invalid)?.split('/').filter(|s| !s.is_empty());

    match (segments.next(), segments.next()) {
        (Some(owner), Some(name)) => Ok(RepositoryRef::new(owner, name)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> (String, String) {
        let repo = parse_repo_url(input).unwrap();
        (repo.owner, repo.name)
    }

    #[test]
    fn https_url() {
        assert_eq!(
            parsed("https://github.com/octo/controls"),
            ("octo".into(), "controls".into())
        );
    }

    #[test]
    fn https_url_with_git_suffix_and_slash() {
        assert_eq!(
            parsed("https://github.com/octo/controls.git/"),
            ("octo".into(), "controls".into())
        );
        assert_eq!(
            parsed("https://github.com/octo/controls/"),
            ("octo".into(), "controls".into())
        );
    }

    #[test]
    fn ssh_url() {
        assert_eq!(
            parsed("git@github.com:octo/controls.git"),
            ("octo".into(), "controls".into())
        );
    }

    #[test]
    fn shorthand() {
        assert_eq!(parsed("octo/controls"), ("octo".into(), "controls".into()));
    }

    #[test]
    fn rejects_host_only() {
        assert!(matches!(
            parse_repo_url("https://github.com/"),
            Err(RepoUrlError::Invalid(_))
        ));
        assert!(matches!(
            parse_repo_url("https://github.com/octo"),
            Err(RepoUrlError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse_repo_url("   "), Err(RepoUrlError::Empty));
    }
}
