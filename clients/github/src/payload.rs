use chrono::{DateTime, Utc};
use homepage::api::{Commit, Event, EventKind, Repo, User};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Deserialize, Debug)]
pub struct UserBody {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

impl From<UserBody> for User {
    fn from(user: UserBody) -> Self {
        User::new(user.login, user.name, user.avatar_url)
    }
}

#[derive(Deserialize, Debug)]
pub struct RepoBody {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    pub languages_url: String,
}

impl From<RepoBody> for Repo {
    fn from(repo: RepoBody) -> Self {
        Repo::new(
            repo.name,
            repo.description,
            repo.html_url,
            repo.language,
            repo.stargazers_count,
            repo.pushed_at,
            repo.languages_url,
        )
    }
}

#[derive(Deserialize, Debug)]
pub struct EventBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl From<EventBody> for Event {
    fn from(event: EventBody) -> Self {
        let kind = EventKind::from_str(&event.kind).unwrap_or(EventKind::Other(event.kind));
        Event::new(kind, event.created_at)
    }
}

#[derive(Deserialize, Debug)]
pub struct CommitBody {
    pub commit: CommitDetail,
}

#[derive(Deserialize, Debug)]
pub struct CommitDetail {
    pub author: CommitAuthor,
}

#[derive(Deserialize, Debug)]
pub struct CommitAuthor {
    pub date: DateTime<Utc>,
}

impl From<CommitBody> for Commit {
    fn from(commit: CommitBody) -> Self {
        Commit::new(commit.commit.author.date)
    }
}

#[test]
fn repo_body_test() -> anyhow::Result<()> {
    let body = r#"{
        "name": "hello-world",
        "description": null,
        "html_url": "https://github.com/octocat/hello-world",
        "language": "Rust",
        "stargazers_count": 80,
        "pushed_at": "2026-10-01T10:00:00Z",
        "languages_url": "https://api.github.com/repos/octocat/hello-world/languages",
        "fork": false
    }"#;
    let repo = Repo::from(serde_json::from_str::<RepoBody>(body)?);
    assert_eq!(repo.name, "hello-world");
    assert_eq!(repo.language.as_deref(), Some("Rust"));
    assert_eq!(repo.stars, 80);
    assert!(repo.pushed_at.is_some());
    Ok(())
}

#[test]
fn event_body_test() -> anyhow::Result<()> {
    let push = Event::from(serde_json::from_str::<EventBody>(
        r#"{"type": "PushEvent", "created_at": "2026-10-01T10:00:00Z", "payload": {}}"#,
    )?);
    assert_eq!(push.kind, EventKind::Push);
    let watch = Event::from(serde_json::from_str::<EventBody>(
        r#"{"type": "WatchEvent", "created_at": "2026-10-01T10:00:00Z"}"#,
    )?);
    assert_eq!(watch.kind, EventKind::Other("WatchEvent".to_string()));
    Ok(())
}
