use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Largest page GitHub serves for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const FIRST_PAGE_NUMBER: u32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API rate limit exceeded")]
    RateLimited,
    #[error("Resource not found")]
    NotFound,
    #[error("Unexpected response status: {0}")]
    Status(u16),
    #[error("Malformed response body: {0}")]
    Parse(String),
    #[error("Invalid theme color: {0}")]
    Color(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

impl User {
    /// Display name, or the login when the profile has none.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct Repo {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    /// Primary language as labelled by GitHub.
    pub language: Option<String>,
    pub stars: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    /// Endpoint returning the bytes-per-language breakdown.
    pub languages_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumString, Display)]
pub enum EventKind {
    #[strum(serialize = "PushEvent")]
    Push,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct Event {
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct Commit {
    pub date: DateTime<Utc>,
}

/// Bytes per language, in the order GitHub lists them.
pub type LanguageBreakdown = Vec<(String, u64)>;

#[async_trait]
pub trait Client: Send + Sync {
    async fn user(&self, login: &str) -> Result<User>;

    /// Repositories of `login`, most recently pushed first.
    async fn repos(&self, login: &str, per_page: u32) -> Result<Vec<Repo>>;

    async fn events(&self, login: &str, page: u32, per_page: u32) -> Result<Vec<Event>>;

    /// Commits authored by `login` in its repository `repo`.
    async fn commits(&self, login: &str, repo: &str, per_page: u32) -> Result<Vec<Commit>>;

    async fn languages(&self, repo: &Repo) -> Result<LanguageBreakdown>;

    /// Raw `README.md` of the `login/login` profile repository at `branch`.
    async fn readme(&self, login: &str, branch: &str) -> Result<String>;
}

#[test]
fn event_kind_parse_test() {
    use std::str::FromStr;
    assert_eq!(EventKind::from_str("PushEvent").ok(), Some(EventKind::Push));
    assert_eq!(
        EventKind::from_str("WatchEvent").ok(),
        Some(EventKind::Other("WatchEvent".to_string()))
    );
}

#[test]
fn display_name_falls_back_to_login_test() {
    let user = User::new("octocat".to_string(), Some(" ".to_string()), String::new());
    assert_eq!(user.display_name(), "octocat");
    let user = User::new("octocat".to_string(), Some("The Octocat".to_string()), String::new());
    assert_eq!(user.display_name(), "The Octocat");
}
