use std::path::Path;

use jsonify::PushProfile;

/// Render a saved profile for display. The token is masked.
pub fn render(profile: &PushProfile) -> String {
    let fields = [
        ("repo_url", profile.repo_url.clone()),
        ("username", profile.username.clone()),
        ("branch", profile.branch.clone()),
        ("commit_message", profile.commit_message.clone()),
        ("base_path", profile.base_path.clone()),
        ("token", profile.masked_token()),
    ];
    fields
        .into_iter()
        .map(|(name, value)| {
            let value = value.unwrap_or_else(|| "(not set)".to_owned());
            format!("{name:<15} {value}\n")
        })
        .collect()
}

pub fn show(location: &Path, profile: Option<&PushProfile>) {
    match profile {
        Some(profile) => {
            println!("Profile: {}", location.display());
            print!("{}", render(profile));
        }
        None => println!("No saved profile at {}", location.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_token_and_marks_unset_fields() {
        let profile = PushProfile {
            repo_url: Some("https://github.com/octo/controls.git".into()),
            token: Some("ghp_secretvalue1234".into()),
            ..Default::default()
        };

        let rendered = render(&profile);

        assert!(rendered.contains("https://github.com/octo/controls.git"));
        assert!(!rendered.contains("secretvalue"));
        assert!(rendered.contains("1234"));
        assert!(rendered.lines().any(|l| l.starts_with("branch") && l.ends_with("(not set)")));
        assert_eq!(rendered.lines().count(), 6);
        assert!(rendered.ends_with('\n'));
    }
}
