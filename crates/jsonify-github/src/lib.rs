pub mod content;
pub mod repo_url;
pub mod store;

pub use repo_url::{RepoUrlError, parse_repo_url};
pub use store::{
    ConfigError, DEFAULT_REQUEST_TIMEOUT, GitHubContentStore, GitHubContentStoreConfig,
};
