use chrono::Utc;
use derive_more::Constructor;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use std::str::FromStr;

/// Quota GitHub reports in the `x-ratelimit-*` response headers.
#[derive(Constructor, Debug, PartialEq)]
pub struct RateLimit {
    limit: u32,
    remaining: u32,
    reset: i64,
}

impl RateLimit {
    pub(crate) fn from_headers(headers: &HeaderMap<HeaderValue>) -> anyhow::Result<RateLimit> {
        Ok(RateLimit::new(
            read_header::<u32>(headers, "x-ratelimit-limit")?,
            read_header::<u32>(headers, "x-ratelimit-remaining")?,
            read_header::<i64>(headers, "x-ratelimit-reset")?,
        ))
    }

    pub(crate) fn log(&self) {
        let reset_in = std::cmp::max(self.reset - Utc::now().timestamp(), 0);
        debug!(
            "Rate limit: {} of {} requests remaining, resets in {} sec",
            self.remaining, self.limit, reset_in
        );
    }
}

/// GitHub answers an exhausted quota with 403 and a message mentioning the rate limit.
pub(crate) fn is_rate_limited(status: u16, body: &str) -> bool {
    status == 403 && body.to_lowercase().contains("rate limit")
}

fn read_header<T>(headers: &HeaderMap<HeaderValue>, header: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let header = headers
        .get(header)
        .ok_or_else(|| anyhow::anyhow!("Header {} not found", header))?
        .to_str()?;
    Ok(header.parse::<T>()?)
}

#[test]
fn from_headers_test() -> anyhow::Result<()> {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from_str("60")?);
    headers.insert("x-ratelimit-remaining", HeaderValue::from_str("0")?);
    headers.insert("x-ratelimit-reset", HeaderValue::from_str("1760000000")?);
    assert_eq!(RateLimit::from_headers(&headers)?, RateLimit::new(60, 0, 1760000000));

    headers.remove("x-ratelimit-reset");
    assert!(RateLimit::from_headers(&headers).is_err());
    Ok(())
}

#[test]
fn is_rate_limited_test() {
    let body = r#"{"message":"API rate limit exceeded for 127.0.0.1."}"#;
    assert!(is_rate_limited(403, body));
    assert!(!is_rate_limited(403, r#"{"message":"Resource not accessible"}"#));
    assert!(!is_rate_limited(200, body));
}
