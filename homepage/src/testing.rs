//! In-memory `Client` used by the unit tests.

use crate::api::{Client, Commit, Error, Event, LanguageBreakdown, Repo, Result, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct FakeClient {
    pub user: Option<User>,
    pub repos: Vec<Repo>,
    pub event_pages: Vec<Vec<Event>>,
    pub malformed_events: bool,
    pub commits: HashMap<String, Vec<Commit>>,
    pub languages: HashMap<String, LanguageBreakdown>,
    pub readme: HashMap<String, String>,
    pub event_calls: AtomicUsize,
    pub language_calls: AtomicUsize,
}

impl FakeClient {
    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }

    pub fn language_calls(&self) -> usize {
        self.language_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn repo(name: &str, language: Option<&str>) -> Repo {
    Repo::new(
        name.to_string(),
        None,
        format!("https://github.com/octocat/{}", name),
        language.map(str::to_string),
        1,
        None,
        format!("https://api.github.com/repos/octocat/{}/languages", name),
    )
}

pub(crate) fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|err| panic!("bad timestamp {}: {}", timestamp, err))
}

#[async_trait]
impl Client for FakeClient {
    async fn user(&self, _login: &str) -> Result<User> {
        self.user.clone().ok_or(Error::NotFound)
    }

    async fn repos(&self, _login: &str, per_page: u32) -> Result<Vec<Repo>> {
        Ok(self.repos.iter().take(per_page as usize).cloned().collect())
    }

    async fn events(&self, _login: &str, page: u32, _per_page: u32) -> Result<Vec<Event>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if self.malformed_events {
            return Err(Error::Parse("expected an array".to_string()));
        }
        self.event_pages
            .get(page as usize - 1)
            .cloned()
            .ok_or(Error::Status(422))
    }

    async fn commits(&self, _login: &str, repo: &str, _per_page: u32) -> Result<Vec<Commit>> {
        self.commits.get(repo).cloned().ok_or(Error::Status(409))
    }

    async fn languages(&self, repo: &Repo) -> Result<LanguageBreakdown> {
        self.language_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.languages.get(&repo.name).cloned().unwrap_or_default())
    }

    async fn readme(&self, _login: &str, branch: &str) -> Result<String> {
        self.readme.get(branch).cloned().ok_or(Error::NotFound)
    }
}
