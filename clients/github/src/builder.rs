use crate::GithubClient;
use homepage::api::{Error, Result};
use log::warn;
use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use std::time::Duration;

pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    github_url: String,
    raw_url: String,
    headers: HeaderMap,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("homepage"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        Self {
            client_builder: ClientBuilder::default(),
            github_url: DEFAULT_GITHUB_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            headers,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl GithubClientBuilder {
    pub fn try_with_token(self, token: secrecy::SecretString) -> Result<GithubClientBuilder> {
        let mut value = HeaderValue::from_str(&format!("token {}", token.expose_secret()))
            .map_err(|err| Error::Other(err.into()))?;
        value.set_sensitive(true);
        Ok(self.with_header_value(header::AUTHORIZATION, value))
    }

    pub fn with_github_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.github_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Host serving raw repository files, used for the profile README.
    pub fn with_raw_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.raw_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> GithubClientBuilder {
        self.timeout = timeout;
        self
    }

    /// Skips TLS certificate verification. Only for hosts behind an intercepting proxy.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> GithubClientBuilder {
        self.accept_invalid_certs = accept;
        self
    }

    fn with_header_value(mut self, key: HeaderName, val: HeaderValue) -> GithubClientBuilder {
        self.headers.insert(key, val);
        self
    }

    pub fn build(self) -> Result<GithubClient> {
        if self.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for GitHub requests");
        }
        let client = self
            .client_builder
            .default_headers(self.headers)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|err| Error::Transport(err.to_string()))?;
        Ok(GithubClient {
            client,
            github_url: self.github_url,
            raw_url: self.raw_url,
        })
    }
}

#[test]
fn invalid_token_test() {
    let token = secrecy::SecretString::new("line\nbreak".to_string());
    assert!(GithubClientBuilder::default().try_with_token(token).is_err());
}

#[test]
fn urls_test() {
    let builder = GithubClientBuilder::default()
        .with_github_url("http://localhost:1234/")
        .with_raw_url("http://localhost:4321");
    assert_eq!(builder.github_url, "http://localhost:1234");
    assert_eq!(builder.raw_url, "http://localhost:4321");
    assert_eq!(builder.timeout, DEFAULT_TIMEOUT);
}

#[test]
fn timeout_and_certs_test() {
    let builder = GithubClientBuilder::default()
        .with_timeout(Duration::from_secs(2))
        .danger_accept_invalid_certs(true);
    assert_eq!(builder.timeout, Duration::from_secs(2));
    assert!(builder.accept_invalid_certs);
    assert!(builder.build().is_ok());
}
