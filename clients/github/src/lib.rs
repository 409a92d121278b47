//! GitHub REST implementation of [`homepage::api::Client`].

mod builder;
mod payload;
mod rate_limit;

use async_trait::async_trait;
use homepage::api::{Client, Commit, Error, Event, LanguageBreakdown, Repo, Result, User};
use log::{debug, warn};
use rate_limit::RateLimit;
use serde::de::DeserializeOwned;

pub use builder::{GithubClientBuilder, DEFAULT_GITHUB_URL, DEFAULT_RAW_URL, DEFAULT_TIMEOUT};

/// Status given to responses that never arrived.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

pub struct GithubClient {
    client: reqwest::Client,
    github_url: String,
    raw_url: String,
}

/// Status and body of a GitHub response, or of a request that failed on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    transport_failure: bool,
}

impl ApiResponse {
    pub fn new(status: u16, body: String) -> Self {
        ApiResponse {
            status,
            body,
            transport_failure: false,
        }
    }

    pub fn transport_failure(reason: String) -> Self {
        ApiResponse {
            status: TRANSPORT_FAILURE_STATUS,
            body: reason,
            transport_failure: true,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        rate_limit::is_rate_limited(self.status, &self.body)
    }

    pub fn into_body(self) -> Result<String> {
        match self.status {
            _ if self.transport_failure => Err(Error::Transport(self.body)),
            200..=299 => Ok(self.body),
            403 if self.is_rate_limited() => Err(Error::RateLimited),
            404 => Err(Error::NotFound),
            status => Err(Error::Status(status)),
        }
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.into_body()?;
        serde_json::from_str(&body).map_err(|err| Error::Parse(err.to_string()))
    }
}

impl GithubClient {
    /// GETs `url`. Never fails: transport errors come back as a synthetic 500 response.
    pub async fn request(&self, url: &str) -> ApiResponse {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("GitHub request {} failed: {}", url, err);
                return ApiResponse::transport_failure(err.to_string());
            }
        };
        let status = response.status().as_u16();
        if let Ok(limit) = RateLimit::from_headers(response.headers()) {
            limit.log();
        }
        let response = match response.text().await {
            Ok(body) => ApiResponse::new(status, body),
            Err(err) => {
                warn!("Reading GitHub response {} failed: {}", url, err);
                return ApiResponse::transport_failure(err.to_string());
            }
        };
        debug!("GitHub request {}, status {}", url, status);
        if response.is_rate_limited() {
            warn!("GitHub API rate limit reached, configure a GitHub token to raise it");
        }
        response
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request(url).await.json()
    }
}

#[async_trait]
impl Client for GithubClient {
    async fn user(&self, login: &str) -> Result<User> {
        let url = format!("{}/users/{}", self.github_url, login);
        self.get_json::<payload::UserBody>(&url).await.map(User::from)
    }

    async fn repos(&self, login: &str, per_page: u32) -> Result<Vec<Repo>> {
        let url = format!("{}/users/{}/repos?sort=pushed&per_page={}", self.github_url, login, per_page);
        let repos = self.get_json::<Vec<payload::RepoBody>>(&url).await?;
        Ok(repos.into_iter().map(Repo::from).collect())
    }

    async fn events(&self, login: &str, page: u32, per_page: u32) -> Result<Vec<Event>> {
        let url = format!(
            "{}/users/{}/events?page={}&per_page={}",
            self.github_url, login, page, per_page
        );
        let events = self.get_json::<Vec<payload::EventBody>>(&url).await?;
        Ok(events.into_iter().map(Event::from).collect())
    }

    async fn commits(&self, login: &str, repo: &str, per_page: u32) -> Result<Vec<Commit>> {
        let url = format!(
            "{}/repos/{}/{}/commits?author={}&per_page={}",
            self.github_url, login, repo, login, per_page
        );
        let commits = self.get_json::<Vec<payload::CommitBody>>(&url).await?;
        Ok(commits.into_iter().map(Commit::from).collect())
    }

    async fn languages(&self, repo: &Repo) -> Result<LanguageBreakdown> {
        let breakdown = self
            .get_json::<serde_json::Map<String, serde_json::Value>>(&repo.languages_url)
            .await?;
        breakdown
            .into_iter()
            .map(|(language, bytes)| match bytes.as_u64() {
                Some(bytes) => Ok((language, bytes)),
                None => Err(Error::Parse(format!("byte count of {} is {}", language, bytes))),
            })
            .collect()
    }

    async fn readme(&self, login: &str, branch: &str) -> Result<String> {
        let url = format!("{}/{}/{}/{}/README.md", self.raw_url, login, login, branch);
        self.request(&url).await.into_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> GithubClient {
        GithubClientBuilder::default()
            .with_github_url(server.uri())
            .with_raw_url(server.uri())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn rate_limited_test() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                r#"{"message": "API rate limit exceeded for 10.0.0.1."}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let response = client.request(&format!("{}/users/octocat", server.uri())).await;
        assert_eq!(response.status, 403);
        assert!(response.is_rate_limited());
        assert!(matches!(client.user("octocat").await, Err(Error::RateLimited)));
    }

    #[tokio::test]
    async fn status_mapping_test() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/forbidden"))
            .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = client(&server).await;
        assert!(matches!(client.user("missing").await, Err(Error::NotFound)));
        assert!(matches!(client.user("forbidden").await, Err(Error::Status(403))));
        assert!(matches!(client.user("garbled").await, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn transport_failure_test() {
        let client = GithubClientBuilder::default()
            .with_github_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let response = client.request("http://127.0.0.1:9/users/octocat").await;
        assert_eq!(response.status, TRANSPORT_FAILURE_STATUS);
        assert!(matches!(response.into_body(), Err(Error::Transport(_))));
        assert!(matches!(client.user("octocat").await, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn token_header_test() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .and(header("Authorization", "token secret-token"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"login": "octocat", "name": null, "avatar_url": "https://avatars/1"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = GithubClientBuilder::default()
            .with_github_url(server.uri())
            .try_with_token(SecretString::new("secret-token".to_string()))
            .unwrap()
            .build()
            .unwrap();
        let user = client.user("octocat").await.unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.display_name(), "octocat");
    }

    #[tokio::test]
    async fn languages_keep_order_test() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"TypeScript": 900, "CSS": 300, "HTML": 1200}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let repo = Repo::new(
            "site".to_string(),
            None,
            String::new(),
            None,
            0,
            None,
            format!("{}/repos/octocat/site/languages", server.uri()),
        );
        let breakdown = client.languages(&repo).await.unwrap();
        assert_eq!(
            breakdown,
            vec![
                ("TypeScript".to_string(), 900),
                ("CSS".to_string(), 300),
                ("HTML".to_string(), 1200)
            ]
        );
    }

    #[tokio::test]
    async fn commits_and_readme_test() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/commits"))
            .and(query_param("author", "octocat"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"sha": "abc", "commit": {"author": {"name": "Octo", "date": "2026-09-01T10:00:00Z"}}}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/octocat/octocat/master/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let commits = client.commits("octocat", "site", 100).await.unwrap();
        assert_eq!(commits.len(), 1);
        assert!(matches!(client.readme("octocat", "main").await, Err(Error::NotFound)));
        assert_eq!(client.readme("octocat", "master").await.unwrap(), "# Hello");
    }
}
