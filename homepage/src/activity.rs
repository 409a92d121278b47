//! Twelve-month push activity histogram.
//!
//! Push events from the public event stream under-count activity, so commits of the most recently pushed
//! repositories are bucketed as well. The raw counts are then smoothed and capped so a single busy month does
//! not flatten the rest of the chart.

use crate::api::{Client, Error, EventKind, Repo, Result, FIRST_PAGE_NUMBER, MAX_PAGE_SIZE};
use crate::clock::Clock;
use chrono::{DateTime, Datelike, Duration, Utc};
use log::{debug, info, warn};

pub const MONTHS: usize = 12;

/// Monthly counts, oldest month first.
pub type Histogram = [u32; MONTHS];

/// Shown whenever no activity could be observed.
pub const FALLBACK_ACTIVITY: Histogram = [65, 59, 80, 81, 56, 55, 70, 65, 85, 75, 60, 75];

const MAX_EVENT_PAGES: u32 = 5;
const COMMIT_REPOS: usize = 5;
const WINDOW_DAYS: i64 = 365;
const MAX_BUCKET: u32 = 200;

/// Builds the activity histogram of `login` for the twelve months ending at `clock.now()`.
///
/// # Arguments
/// * `repos` - Repositories of `login`, most recently pushed first; commits of the first few are counted too
///
/// Event pages stop at the first empty page or failed request. Only a malformed event stream is an error.
pub async fn monthly_activity<CLIENT>(client: &CLIENT, clock: &dyn Clock, login: &str, repos: &[Repo]) -> Result<Histogram>
where
    CLIENT: Client + ?Sized,
{
    let mut buckets = MonthlyBuckets::new(clock.now());

    for page in FIRST_PAGE_NUMBER..FIRST_PAGE_NUMBER + MAX_EVENT_PAGES {
        let events = match client.events(login, page, MAX_PAGE_SIZE).await {
            Ok(events) => events,
            Err(Error::Parse(reason)) => return Err(Error::Parse(reason)),
            Err(err) => {
                debug!("Event stream of {} ended at page {}: {}", login, page, err);
                break;
            }
        };
        if events.is_empty() {
            break;
        }
        events
            .iter()
            .filter(|event| event.kind == EventKind::Push)
            .for_each(|event| buckets.record(event.created_at));
    }

    for repo in repos.iter().take(COMMIT_REPOS) {
        match client.commits(login, &repo.name, MAX_PAGE_SIZE).await {
            Ok(commits) => commits.iter().for_each(|commit| buckets.record(commit.date)),
            Err(err) => warn!("Failed to get commits of {}: {}", repo.name, err),
        }
    }

    let raw = buckets.oldest_first();
    debug!("Raw monthly activity of {}: {:?}", login, raw);
    Ok(shape(raw))
}

/// Counts indexed by month offset, 0 being the current month.
struct MonthlyBuckets {
    now: DateTime<Utc>,
    earliest: DateTime<Utc>,
    counts: [u32; MONTHS],
}

impl MonthlyBuckets {
    fn new(now: DateTime<Utc>) -> Self {
        MonthlyBuckets {
            now,
            earliest: now - Duration::days(WINDOW_DAYS),
            counts: [0; MONTHS],
        }
    }

    fn record(&mut self, at: DateTime<Utc>) {
        if at < self.earliest {
            return;
        }
        if let Some(count) = month_offset(self.now, at).and_then(|offset| self.counts.get_mut(offset)) {
            *count += 1;
        }
    }

    fn oldest_first(&self) -> Histogram {
        let mut histogram = [0; MONTHS];
        for (position, count) in histogram.iter_mut().enumerate() {
            *count = self.counts[MONTHS - 1 - position];
        }
        histogram
    }
}

/// Whole calendar months from `at` to `now`; a month only counts once its day of month is reached.
fn month_offset(now: DateTime<Utc>, at: DateTime<Utc>) -> Option<usize> {
    let mut months = (now.year() - at.year()) * 12 + now.month() as i32 - at.month() as i32;
    if now.day() < at.day() {
        months -= 1;
    }
    usize::try_from(months).ok()
}

fn shape(raw: Histogram) -> Histogram {
    if raw.iter().all(|&count| count == 0) {
        info!("No activity found, using default activity data");
        return FALLBACK_ACTIVITY;
    }
    cap(smooth(raw))
}

/// Averages every month with its neighbours, never going below 80% of the smallest of them.
fn smooth(raw: Histogram) -> Histogram {
    let mut smoothed = [0; MONTHS];
    for (position, value) in smoothed.iter_mut().enumerate() {
        let window = &raw[position.saturating_sub(1)..=(position + 1).min(MONTHS - 1)];
        let sum: u64 = window.iter().map(|&count| u64::from(count)).sum();
        let average = sum / window.len() as u64;
        let min = window.iter().copied().min().map(u64::from).unwrap_or(0);
        *value = u32::try_from(average.max(min * 4 / 5)).unwrap_or(u32::MAX);
    }
    smoothed
}

/// Scales months above the ceiling down in proportion to the busiest month.
fn cap(smoothed: Histogram) -> Histogram {
    let max = smoothed.iter().copied().max().unwrap_or(0);
    if max <= MAX_BUCKET {
        return smoothed;
    }
    smoothed.map(|value| {
        if value > MAX_BUCKET {
            (u64::from(value) * u64::from(MAX_BUCKET) / u64::from(max)) as u32
        } else {
            value
        }
    })
}

#[cfg(test)]
use crate::api::{Commit, Event};
#[cfg(test)]
use crate::clock::ManualClock;
#[cfg(test)]
use crate::testing::{at, repo, FakeClient};

#[cfg(test)]
const NOW: &str = "2026-10-19T12:00:00Z";

#[cfg(test)]
fn push(timestamp: &str) -> Event {
    Event::new(EventKind::Push, at(timestamp))
}

#[test]
fn month_offset_test() {
    let now = at(NOW);
    assert_eq!(month_offset(now, now), Some(0));
    assert_eq!(month_offset(now, at("2026-10-01T00:00:00Z")), Some(0));
    assert_eq!(month_offset(now, at("2026-09-20T00:00:00Z")), Some(0), "Partial month rounds down");
    assert_eq!(month_offset(now, at("2026-09-19T00:00:00Z")), Some(1));
    assert_eq!(month_offset(now, at("2026-01-05T00:00:00Z")), Some(9));
    assert_eq!(month_offset(now, at("2025-11-20T00:00:00Z")), Some(10));
    assert_eq!(month_offset(now, at("2026-10-20T00:00:00Z")), None, "Future timestamps have no offset");
}

#[test]
fn month_offset_across_year_test() {
    let now = at("2026-01-05T08:00:00Z");
    assert_eq!(month_offset(now, at("2025-12-31T23:00:00Z")), Some(0));
    assert_eq!(month_offset(now, at("2025-02-10T00:00:00Z")), Some(10));
    assert_eq!(month_offset(now, at("2025-02-01T00:00:00Z")), Some(11));
}

#[test]
fn buckets_order_test() {
    let now = at(NOW);
    let mut buckets = MonthlyBuckets::new(now);
    buckets.record(now);
    buckets.record(at("2025-11-01T00:00:00Z"));
    buckets.record(at("2025-11-01T00:00:00Z"));
    buckets.record(at("2025-10-10T00:00:00Z"));

    let histogram = buckets.oldest_first();
    assert_eq!(histogram[MONTHS - 1], 1, "Push at now lands in the newest month");
    assert_eq!(histogram[0], 2, "Eleven months back is the oldest month");
    assert_eq!(histogram.iter().sum::<u32>(), 3, "Timestamps older than a year are dropped");
}

#[test]
fn fallback_when_all_zero_test() {
    assert_eq!(shape([0; MONTHS]), FALLBACK_ACTIVITY);
}

#[test]
fn smooth_constant_test() {
    for value in [0, 1, 37, 200] {
        assert_eq!(smooth([value; MONTHS]), [value; MONTHS]);
    }
}

#[test]
fn smooth_spike_test() {
    let mut raw = [3; MONTHS];
    raw[3] = 30;
    assert_eq!(smooth(raw), [3, 3, 12, 12, 12, 3, 3, 3, 3, 3, 3, 3]);

    let mut raw = [0; MONTHS];
    raw[MONTHS - 1] = 12;
    assert_eq!(smooth(raw), [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 6]);
}

#[test]
fn cap_test() {
    let mut smoothed = [150; MONTHS];
    smoothed[10] = 250;
    smoothed[11] = 400;
    let capped = cap(smoothed);
    assert_eq!(capped[0], 150, "Values under the ceiling are untouched");
    assert_eq!(capped[10], 125);
    assert_eq!(capped[11], 200);
    assert_eq!(cap([200; MONTHS]), [200; MONTHS]);
}

#[test]
fn shape_bounds_test() {
    let raw = [0, 5000, 1, 0, 999, 3, 0, 0, 70000, 2, 0, 1];
    let shaped = shape(raw);
    assert_eq!(shaped.len(), MONTHS);
    assert!(shaped.iter().all(|&value| value <= MAX_BUCKET), "{:?}", shaped);
}

#[tokio::test]
async fn events_and_commits_test() -> anyhow::Result<()> {
    let clock = ManualClock::new(at(NOW));
    let mut client = FakeClient::default();
    let mut first_page: Vec<Event> = (0..10).map(|_| push(NOW)).collect();
    first_page.push(Event::new(EventKind::Other("WatchEvent".to_string()), at(NOW)));
    client.event_pages = vec![first_page, vec![]];
    client.commits.insert(
        "first".to_string(),
        vec![Commit::new(at("2025-11-02T10:00:00Z")), Commit::new(at("2025-11-03T10:00:00Z"))],
    );
    let repos = vec![repo("first", None), repo("second", None)];

    let histogram = monthly_activity(&client, &clock, "octocat", &repos).await?;

    assert_eq!(histogram, [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 5]);
    assert_eq!(client.event_calls(), 2, "Empty page stops paging");
    Ok(())
}

#[tokio::test]
async fn event_pages_capped_test() -> anyhow::Result<()> {
    let clock = ManualClock::new(at(NOW));
    let client = FakeClient {
        event_pages: (0..8).map(|_| vec![push("2026-06-01T00:00:00Z")]).collect(),
        ..FakeClient::default()
    };

    let histogram = monthly_activity(&client, &clock, "octocat", &[]).await?;

    assert_eq!(client.event_calls(), 5);
    assert_eq!(histogram[7], 1, "Five pushes in June average with two empty neighbours");
    Ok(())
}

#[tokio::test]
async fn failing_stream_is_not_an_error_test() -> anyhow::Result<()> {
    let clock = ManualClock::new(at(NOW));
    let client = FakeClient::default();
    let histogram = monthly_activity(&client, &clock, "octocat", &[repo("missing", None)]).await?;
    assert_eq!(histogram, FALLBACK_ACTIVITY);
    Ok(())
}

#[tokio::test]
async fn malformed_stream_is_an_error_test() {
    let clock = ManualClock::new(at(NOW));
    let client = FakeClient {
        malformed_events: true,
        ..FakeClient::default()
    };
    let result = monthly_activity(&client, &clock, "octocat", &[]).await;
    assert!(matches!(result, Err(Error::Parse(_))));
}
