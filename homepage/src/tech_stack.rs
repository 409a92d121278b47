//! Ranked, colorized list of the languages a user works with.

use crate::api::{Client, Error, Repo, Result};
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::settings::Theme;
use chrono::Duration;
use derive_more::Constructor;
use log::{debug, info, warn};
use palette::Srgb;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CACHE_TTL_SECS: i64 = 3600;

const ANALYZED_REPOS: usize = 10;
/// Language breakdowns are fetched until this many languages are known.
const BREAKDOWN_LANGUAGE_TARGET: usize = 5;
const MAX_ENTRIES: usize = 10;
const UNKNOWN_COLOR: &str = "#444444";
const HTML_CSS: &str = "HTML/CSS";

/// Known languages with the theme base color (0 primary, 1 secondary) and shade rank they are drawn from.
const PALETTE_SLOTS: [(&str, usize, u8); 8] = [
    ("Python", 0, 0),
    ("JavaScript", 1, 0),
    ("Java", 0, 1),
    ("TypeScript", 1, 1),
    ("HTML", 0, 2),
    ("CSS", 1, 2),
    ("Flask", 0, 3),
    ("Django", 1, 3),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Constructor)]
pub struct TechEntry {
    pub name: String,
    pub color: String,
}

pub type TechStack = Vec<TechEntry>;

/// Shown when no language could be determined.
pub fn fallback_tech_stack() -> TechStack {
    [
        ("Python", "#333333"),
        ("数学建模", "#555555"),
        (HTML_CSS, "#222222"),
        ("Flask", "#444444"),
    ]
    .into_iter()
    .map(|(name, color)| TechEntry::new(name.to_string(), color.to_string()))
    .collect()
}

pub struct TechStackAnalyzer {
    cache: Mutex<TtlCache<TechStack>>,
}

impl TechStackAnalyzer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::seconds(CACHE_TTL_SECS))
    }

    fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        TechStackAnalyzer {
            cache: Mutex::new(TtlCache::new(clock, ttl)),
        }
    }

    /// Ranks the languages of the first repositories and colors them from `theme`.
    ///
    /// A fresh cached result is returned without touching `client`. The cache lock is held for the whole
    /// analysis, so concurrent callers wait for one analysis instead of running their own.
    pub async fn analyze<CLIENT>(&self, client: &CLIENT, repos: &[Repo], theme: &Theme, dark: bool) -> Result<TechStack>
    where
        CLIENT: Client + ?Sized,
    {
        let mut cache = self.cache.lock().await;
        if let Some(stack) = cache.get() {
            debug!("Using cached tech stack");
            return Ok(stack);
        }

        let tally = tally_languages(client, repos).await;
        let stack = if tally.is_empty() {
            info!("No language data found, using default tech stack");
            fallback_tech_stack()
        } else {
            let palette = Palette::new(theme, dark)?;
            build_stack(tally.ranked(), &palette)
        };
        info!(
            "Tech stack: {:?}",
            stack.iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>()
        );

        cache.set(stack.clone());
        Ok(stack)
    }

    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }
}

/// Occurrences per language, in discovery order.
#[derive(Default, Debug)]
struct LanguageTally(Vec<(String, u32)>);

impl LanguageTally {
    fn add(&mut self, language: &str) {
        match self.0.iter_mut().find(|(name, _)| name == language) {
            Some((_, count)) => *count += 1,
            None => self.0.push((language.to_string(), 1)),
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most frequent first, earlier discovery winning ties.
    fn ranked(mut self) -> Vec<String> {
        self.0.sort_by(|(_, a), (_, b)| b.cmp(a));
        self.0.into_iter().take(MAX_ENTRIES).map(|(name, _)| name).collect()
    }
}

async fn tally_languages<CLIENT>(client: &CLIENT, repos: &[Repo]) -> LanguageTally
where
    CLIENT: Client + ?Sized,
{
    let mut tally = LanguageTally::default();
    for repo in repos.iter().take(ANALYZED_REPOS) {
        if let Some(language) = &repo.language {
            tally.add(language);
        }
        if tally.len() < BREAKDOWN_LANGUAGE_TARGET {
            match client.languages(repo).await {
                Ok(breakdown) => breakdown
                    .iter()
                    .filter(|(_, bytes)| *bytes > 0)
                    .for_each(|(language, _)| tally.add(language)),
                Err(err) => warn!("Failed to get languages of {}: {}", repo.name, err),
            }
        }
    }
    tally
}

fn build_stack(ranked: Vec<String>, palette: &Palette) -> TechStack {
    let mut stack = Vec::with_capacity(ranked.len());
    let mut html_css_added = false;
    for name in ranked {
        if name == "HTML" || name == "CSS" {
            if !html_css_added {
                stack.push(TechEntry::new(HTML_CSS.to_string(), palette.color_of("HTML")));
                html_css_added = true;
            }
        } else {
            let color = palette.color_of(&name);
            stack.push(TechEntry::new(name, color));
        }
    }
    stack.truncate(MAX_ENTRIES);
    stack
}

struct Palette {
    colors: Vec<(&'static str, String)>,
}

impl Palette {
    fn new(theme: &Theme, dark: bool) -> Result<Self> {
        let bases = if dark {
            [parse_color(&theme.dark_primary_color)?, parse_color(&theme.dark_secondary_color)?]
        } else {
            [parse_color(&theme.primary_color)?, parse_color(&theme.secondary_color)?]
        };
        let colors = PALETTE_SLOTS
            .iter()
            .map(|&(name, base, rank)| (name, harmonious_color(bases[base], rank, dark)))
            .collect();
        Ok(Palette { colors })
    }

    fn color_of(&self, language: &str) -> String {
        self.colors
            .iter()
            .find(|(name, _)| *name == language)
            .map(|(_, color)| color.clone())
            .unwrap_or_else(|| UNKNOWN_COLOR.to_string())
    }
}

fn parse_color(hex: &str) -> Result<Srgb<u8>> {
    hex.trim()
        .parse::<Srgb<u8>>()
        .map_err(|err| Error::Color(format!("{}: {}", hex, err)))
}

/// Shades `base` by rank: darker with every rank in light mode, lighter in dark mode.
fn harmonious_color(base: Srgb<u8>, rank: u8, dark: bool) -> String {
    let rank = f64::from(rank);
    let factor = if dark {
        (0.6 + rank * 0.1).min(0.9)
    } else {
        (1.0 - rank * 0.15).max(0.4)
    };
    let shade = |channel: u8| (f64::from(channel) * factor) as u8;
    format!("#{:02x}{:02x}{:02x}", shade(base.red), shade(base.green), shade(base.blue))
}

#[cfg(test)]
use crate::clock::ManualClock;
#[cfg(test)]
use crate::testing::{repo, FakeClient};
#[cfg(test)]
use chrono::Utc;

#[cfg(test)]
fn analyzer() -> (Arc<ManualClock>, TechStackAnalyzer) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let analyzer = TechStackAnalyzer::new(clock.clone());
    (clock, analyzer)
}

#[cfg(test)]
fn names(stack: &TechStack) -> Vec<&str> {
    stack.iter().map(|entry| entry.name.as_str()).collect()
}

#[cfg(test)]
fn is_hex_color(color: &str) -> bool {
    color.len() == 7 && color.starts_with('#') && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[test]
fn harmonious_color_test() {
    let base = Srgb::new(0x33, 0x33, 0x33);
    assert_eq!(harmonious_color(base, 0, false), "#333333");
    assert_eq!(harmonious_color(base, 2, false), "#232323");
    assert_eq!(harmonious_color(base, 9, false), "#141414", "Light factor bottoms out at 0.4");
    assert_eq!(harmonious_color(base, 0, true), "#1e1e1e");
    assert_eq!(harmonious_color(base, 9, true), "#2d2d2d", "Dark factor tops out at 0.9");
}

#[test]
fn palette_test() -> Result<()> {
    let palette = Palette::new(&Theme::default(), false)?;
    assert_eq!(palette.color_of("Python"), "#333333");
    assert_eq!(palette.color_of("JavaScript"), "#555555");
    assert_eq!(palette.color_of("Rust"), UNKNOWN_COLOR);
    Ok(())
}

#[test]
fn invalid_theme_test() {
    let theme = Theme {
        primary_color: "not a color".to_string(),
        ..Theme::default()
    };
    assert!(matches!(Palette::new(&theme, false), Err(Error::Color(_))));
    assert!(Palette::new(&theme, true).is_ok(), "Dark mode reads the dark colors only");
}

#[test]
fn html_css_merge_test() -> Result<()> {
    let palette = Palette::new(&Theme::default(), false)?;
    let ranked = ["Rust", "CSS", "Python", "HTML"].map(str::to_string).to_vec();
    let stack = build_stack(ranked, &palette);
    assert_eq!(names(&stack), vec!["Rust", "HTML/CSS", "Python"]);
    assert_eq!(stack[1].color, palette.color_of("HTML"));
    Ok(())
}

#[test]
fn tally_ranking_test() {
    let mut tally = LanguageTally::default();
    for language in ["Go", "Rust", "C", "Rust", "C"] {
        tally.add(language);
    }
    assert_eq!(tally.ranked(), vec!["Rust", "C", "Go"]);
}

#[tokio::test]
async fn primary_languages_test() -> Result<()> {
    let (_, analyzer) = analyzer();
    let client = FakeClient::default();
    let repos = vec![
        repo("a", Some("Python")),
        repo("b", Some("HTML")),
        repo("c", Some("CSS")),
    ];

    let stack = analyzer.analyze(&client, &repos, &Theme::default(), false).await?;

    assert_eq!(names(&stack), vec!["Python", "HTML/CSS"]);
    assert!(stack.iter().all(|entry| is_hex_color(&entry.color)));
    Ok(())
}

#[tokio::test]
async fn breakdown_until_five_languages_test() -> Result<()> {
    let (_, analyzer) = analyzer();
    let mut client = FakeClient::default();
    client.languages.insert(
        "a".to_string(),
        vec![
            ("Rust".to_string(), 9000),
            ("Shell".to_string(), 10),
            ("Dockerfile".to_string(), 0),
        ],
    );
    client.languages.insert(
        "b".to_string(),
        vec![("C".to_string(), 5), ("Makefile".to_string(), 3), ("Nix".to_string(), 1)],
    );
    let repos = vec![repo("a", Some("Rust")), repo("b", Some("C")), repo("c", Some("Go"))];

    let stack = analyzer.analyze(&client, &repos, &Theme::default(), false).await?;

    assert_eq!(client.language_calls(), 2, "Third repo already has five languages known");
    assert_eq!(names(&stack), vec!["Rust", "C", "Shell", "Makefile", "Nix", "Go"]);
    Ok(())
}

#[tokio::test]
async fn caps_entries_test() -> Result<()> {
    let (_, analyzer) = analyzer();
    let client = FakeClient::default();
    let languages = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];
    let repos: Vec<Repo> = languages
        .iter()
        .enumerate()
        .map(|(i, language)| repo(&i.to_string(), Some(language)))
        .collect();

    let stack = analyzer.analyze(&client, &repos, &Theme::default(), true).await?;

    assert_eq!(stack.len(), 10);
    assert_eq!(names(&stack)[9], "J", "Only the first ten repositories are analyzed");
    assert!(stack.iter().all(|entry| entry.color == UNKNOWN_COLOR));
    Ok(())
}

#[tokio::test]
async fn cache_hit_test() -> Result<()> {
    let (clock, analyzer) = analyzer();
    let client = FakeClient::default();
    let repos = vec![repo("a", Some("Python")), repo("b", Some("Java"))];

    let first = analyzer.analyze(&client, &repos, &Theme::default(), false).await?;
    let calls = client.language_calls();
    clock.advance(Duration::seconds(CACHE_TTL_SECS - 1));
    let second = analyzer.analyze(&client, &[], &Theme::default(), false).await?;

    assert_eq!(first, second);
    assert_eq!(client.language_calls(), calls, "Cache hit makes no requests");

    clock.advance(Duration::seconds(1));
    let third = analyzer.analyze(&client, &[], &Theme::default(), false).await?;
    assert_eq!(third, fallback_tech_stack(), "Expired entry is recomputed");
    Ok(())
}

#[tokio::test]
async fn fallback_is_cached_test() -> Result<()> {
    let (_, analyzer) = analyzer();
    let client = FakeClient::default();

    let stack = analyzer.analyze(&client, &[repo("a", None)], &Theme::default(), false).await?;
    assert_eq!(stack, fallback_tech_stack());

    let cached = analyzer.analyze(&client, &[repo("b", Some("Rust"))], &Theme::default(), false).await?;
    assert_eq!(cached, fallback_tech_stack());

    analyzer.invalidate().await;
    let fresh = analyzer.analyze(&client, &[repo("b", Some("Rust"))], &Theme::default(), false).await?;
    assert_eq!(names(&fresh), vec!["Rust"]);
    Ok(())
}

#[tokio::test]
async fn error_is_not_cached_test() -> Result<()> {
    let (_, analyzer) = analyzer();
    let client = FakeClient::default();
    let broken = Theme {
        primary_color: "#zzzzzz".to_string(),
        ..Theme::default()
    };
    let repos = vec![repo("a", Some("Python"))];

    assert!(analyzer.analyze(&client, &repos, &broken, false).await.is_err());
    let stack = analyzer.analyze(&client, &repos, &Theme::default(), false).await?;
    assert_eq!(names(&stack), vec!["Python"]);
    Ok(())
}
