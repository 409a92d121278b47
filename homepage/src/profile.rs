//! Everything the homepage shows, gathered from GitHub in one pass.

use crate::activity::{monthly_activity, Histogram, FALLBACK_ACTIVITY};
use crate::api::{Client, Error, Repo, Result, MAX_PAGE_SIZE};
use crate::clock::{Clock, SystemClock};
use crate::readme::{local_readme, profile_readme};
use crate::settings::ProfileSettings;
use crate::tech_stack::{fallback_tech_stack, TechStack, TechStackAnalyzer};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_AVATAR_URL: &str = "https://avatars.githubusercontent.com/u/142971357?v=4";

const RECENT_REPOS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoSummary {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stars: u32,
    pub pushed_at: Option<DateTime<Utc>>,
}

impl From<&Repo> for RepoSummary {
    fn from(repo: &Repo) -> Self {
        RepoSummary {
            name: repo.name.clone(),
            description: repo.description.clone(),
            html_url: repo.html_url.clone(),
            language: repo.language.clone(),
            stars: repo.stars,
            pushed_at: repo.pushed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub avatar_url: String,
    pub name: String,
    pub bio: String,
    pub total_repos: usize,
    pub total_stars: u64,
    /// Rendered HTML.
    pub readme_content: String,
    pub recent_repos: Vec<RepoSummary>,
    pub activity_data: Histogram,
    pub tech_stack: TechStack,
}

pub struct ProfileAssembler<CLIENT: Client> {
    client: CLIENT,
    settings: ProfileSettings,
    clock: Arc<dyn Clock>,
    tech_stack: TechStackAnalyzer,
}

impl<CLIENT: Client> ProfileAssembler<CLIENT> {
    pub fn new(client: CLIENT, settings: ProfileSettings) -> Self {
        Self::with_clock(client, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(client: CLIENT, settings: ProfileSettings, clock: Arc<dyn Clock>) -> Self {
        let tech_stack = TechStackAnalyzer::new(clock.clone());
        ProfileAssembler {
            client,
            settings,
            clock,
            tech_stack,
        }
    }

    /// Always returns a complete profile: live data when GitHub answers, the configured defaults otherwise.
    pub async fn assemble(&self) -> Profile {
        match self.fetch_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("Failed to get GitHub profile, using defaults: {}", err);
                self.default_profile().await
            }
        }
    }

    pub async fn default_profile(&self) -> Profile {
        Profile {
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            name: self.settings.name.clone(),
            bio: self.settings.bio.clone(),
            total_repos: 0,
            total_stars: 0,
            readme_content: local_readme(&self.settings.introduction_file).await,
            recent_repos: Vec::new(),
            activity_data: FALLBACK_ACTIVITY,
            tech_stack: fallback_tech_stack(),
        }
    }

    async fn fetch_profile(&self) -> Result<Profile> {
        let login = self
            .settings
            .username()
            .ok_or_else(|| Error::Other(anyhow!("no username in {:?}", self.settings.profile_url)))?;
        info!("Getting GitHub profile of {}", login);

        let user = self.client.user(login).await?;
        let repos = self.client.repos(login, MAX_PAGE_SIZE).await?;
        let total_stars = repos.iter().map(|repo| u64::from(repo.stars)).sum();

        let readme_content = match profile_readme(&self.client, login).await {
            Ok(readme) => readme,
            Err(err) => {
                info!("Using local introduction, GitHub README unavailable: {}", err);
                local_readme(&self.settings.introduction_file).await
            }
        };

        let mut recent: Vec<&Repo> = repos.iter().collect();
        recent.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
        let recent_repos = recent.into_iter().take(RECENT_REPOS).map(RepoSummary::from).collect();

        let activity_data = monthly_activity(&self.client, self.clock.as_ref(), login, &repos)
            .await
            .unwrap_or_else(|err| {
                warn!("Failed to get activity of {}, using defaults: {}", login, err);
                FALLBACK_ACTIVITY
            });

        let tech_stack = self
            .tech_stack
            .analyze(&self.client, &repos, &self.settings.theme, self.settings.dark_mode.is_dark())
            .await
            .unwrap_or_else(|err| {
                warn!("Failed to analyze tech stack of {}, using defaults: {}", login, err);
                fallback_tech_stack()
            });

        Ok(Profile {
            avatar_url: user.avatar_url.clone(),
            name: user.display_name().to_string(),
            bio: self.settings.bio.clone(),
            total_repos: repos.len(),
            total_stars,
            readme_content,
            recent_repos,
            activity_data,
            tech_stack,
        })
    }
}

#[cfg(test)]
use crate::api::{Event, EventKind, User};
#[cfg(test)]
use crate::clock::ManualClock;
#[cfg(test)]
use crate::readme::DEFAULT_INTRODUCTION;
#[cfg(test)]
use crate::settings::{DarkMode, Theme};
#[cfg(test)]
use crate::testing::{at, repo, FakeClient};
#[cfg(test)]
use std::path::PathBuf;

#[cfg(test)]
const NOW: &str = "2026-10-19T12:00:00Z";

#[cfg(test)]
fn settings() -> ProfileSettings {
    ProfileSettings {
        profile_url: "https://github.com/octocat/".to_string(),
        name: "Configured Name".to_string(),
        bio: "Configured bio".to_string(),
        introduction_file: PathBuf::from("does/not/exist.md"),
        theme: Theme::default(),
        dark_mode: DarkMode::Light,
    }
}

#[cfg(test)]
fn assembler(client: FakeClient) -> ProfileAssembler<FakeClient> {
    ProfileAssembler::with_clock(client, settings(), Arc::new(ManualClock::new(at(NOW))))
}

#[tokio::test]
async fn missing_user_test() {
    let profile = assembler(FakeClient::default()).assemble().await;

    assert_eq!(profile.avatar_url, DEFAULT_AVATAR_URL);
    assert_eq!(profile.name, "Configured Name");
    assert_eq!(profile.total_repos, 0);
    assert_eq!(profile.total_stars, 0);
    assert_eq!(profile.readme_content, DEFAULT_INTRODUCTION);
    assert!(profile.recent_repos.is_empty());
    assert_eq!(profile.activity_data, FALLBACK_ACTIVITY);
    assert_eq!(profile.tech_stack, fallback_tech_stack());
}

#[tokio::test]
async fn assemble_test() {
    let mut client = FakeClient {
        user: Some(User::new("octocat".to_string(), None, "https://avatars/octocat".to_string())),
        event_pages: vec![vec![Event::new(EventKind::Push, at(NOW)); 4]],
        ..FakeClient::default()
    };
    client.readme.insert("main".to_string(), "Hi".to_string());
    for (i, (name, pushed)) in [
        ("old", "2024-01-01T00:00:00Z"),
        ("newest", "2026-10-18T00:00:00Z"),
        ("a", "2026-05-01T00:00:00Z"),
        ("b", "2026-04-01T00:00:00Z"),
        ("c", "2026-03-01T00:00:00Z"),
        ("d", "2026-02-01T00:00:00Z"),
    ]
    .into_iter()
    .enumerate()
    {
        let mut repo = repo(name, Some("Python"));
        repo.stars = i as u32;
        repo.pushed_at = Some(at(pushed));
        client.repos.push(repo);
    }

    let profile = assembler(client).assemble().await;

    assert_eq!(profile.name, "octocat");
    assert_eq!(profile.bio, "Configured bio");
    assert_eq!(profile.total_repos, 6);
    assert_eq!(profile.total_stars, 15);
    assert_eq!(profile.readme_content, "<p>Hi</p>\n");
    let recent: Vec<&str> = profile.recent_repos.iter().map(|repo| repo.name.as_str()).collect();
    assert_eq!(recent, vec!["newest", "a", "b", "c", "d"]);
    assert_eq!(profile.activity_data, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
    assert_eq!(profile.tech_stack.len(), 1);
    assert_eq!(profile.tech_stack[0].name, "Python");
}

#[tokio::test]
async fn broken_theme_falls_back_test() {
    let client = FakeClient {
        user: Some(User::new("octocat".to_string(), None, String::new())),
        repos: vec![repo("a", Some("Rust"))],
        ..FakeClient::default()
    };
    let mut settings = settings();
    settings.theme.primary_color = "blue-ish".to_string();
    let assembler = ProfileAssembler::with_clock(client, settings, Arc::new(ManualClock::new(at(NOW))));

    let profile = assembler.assemble().await;

    assert_eq!(profile.total_repos, 1, "Only the tech stack falls back");
    assert_eq!(profile.tech_stack, fallback_tech_stack());
    assert_eq!(profile.activity_data, FALLBACK_ACTIVITY);
}
