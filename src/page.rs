//! Renders the homepage document.

use crate::config::Config;
use chrono::{DateTime, Datelike, Utc};
use homepage::activity::MONTHS;
use homepage::{Profile, RepoSummary};
use std::fmt::{self, Write};
use std::path::Path;

/// Public URL of the configured background image, if the file exists next to the site or under `static/`.
pub fn locate_background(root: &Path, config: &Config) -> Option<String> {
    let image = &config.background.image;
    if image.is_empty() {
        return None;
    }
    if root.join(image).is_file() {
        Some(format!("/{}", image))
    } else if root.join("static").join(image).is_file() {
        Some(format!("/static/{}", image))
    } else {
        None
    }
}

pub fn render(
    profile: &Profile,
    config: &Config,
    now: DateTime<Utc>,
    background: Option<&str>,
) -> Result<String, fmt::Error> {
    let mut page = String::with_capacity(16 * 1024);
    write_head(&mut page, profile, config, background)?;
    write_profile(&mut page, profile)?;
    write_recent_repos(&mut page, &profile.recent_repos)?;
    write_activity(&mut page, &profile.activity_data, now)?;
    write_tech_stack(&mut page, profile)?;
    write_footer(&mut page, config, now)?;
    Ok(page)
}

fn write_head(page: &mut String, profile: &Profile, config: &Config, background: Option<&str>) -> fmt::Result {
    write!(
        page,
        r#"<!DOCTYPE html>
<html lang="zh-CN" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{name}</title>
<style>
:root {{ --primary: {primary}; --secondary: {secondary}; }}
[data-theme="dark"] {{ --primary: {dark_primary}; --secondary: {dark_secondary}; }}
"#,
        theme = config.dark_mode,
        name = escape(&profile.name),
        primary = escape(&config.theme.primary_color),
        secondary = escape(&config.theme.secondary_color),
        dark_primary = escape(&config.theme.dark_primary_color),
        dark_secondary = escape(&config.theme.dark_secondary_color),
    )?;
    if let Some(url) = background {
        writeln!(page, "body {{ background: url(\"{}\") center / cover fixed; }}", escape(url))?;
        writeln!(
            page,
            "main {{ backdrop-filter: blur({}px); background-color: {}; opacity: {}; }}",
            config.background.blur,
            escape(&config.background.overlay_color),
            config.background.overlay_opacity
        )?;
    }
    page.push_str("</style>\n</head>\n<body>\n");
    Ok(())
}

fn write_profile(page: &mut String, profile: &Profile) -> fmt::Result {
    write!(
        page,
        r#"<header class="profile">
<img class="avatar" src="{avatar}" alt="{name}">
<h1>{name}</h1>
<p class="bio">{bio}</p>
<ul class="totals"><li>{repos} repositories</li><li>{stars} stars</li></ul>
</header>
<main>
<section class="readme">
{readme}
</section>
"#,
        avatar = escape(&profile.avatar_url),
        name = escape(&profile.name),
        bio = escape(&profile.bio),
        repos = profile.total_repos,
        stars = profile.total_stars,
        readme = profile.readme_content,
    )
}

fn write_recent_repos(page: &mut String, repos: &[RepoSummary]) -> fmt::Result {
    if repos.is_empty() {
        return Ok(());
    }
    page.push_str("<section class=\"recent-repos\">\n<h2>Recently pushed</h2>\n<ul>\n");
    for repo in repos {
        write!(page, r#"<li><a href="{}">{}</a>"#, escape(&repo.html_url), escape(&repo.name))?;
        if let Some(description) = &repo.description {
            write!(page, " <span class=\"description\">{}</span>", escape(description))?;
        }
        if let Some(language) = &repo.language {
            write!(page, " <span class=\"language\">{}</span>", escape(language))?;
        }
        write!(page, " <span class=\"stars\">&#9733; {}</span>", repo.stars)?;
        if let Some(pushed_at) = repo.pushed_at {
            write!(page, " <time>{}</time>", pushed_at.format("%Y-%m-%d"))?;
        }
        page.push_str("</li>\n");
    }
    page.push_str("</ul>\n</section>\n");
    Ok(())
}

fn write_activity(page: &mut String, activity: &[u32; MONTHS], now: DateTime<Utc>) -> fmt::Result {
    let max = activity.iter().copied().max().unwrap_or(0).max(1);
    page.push_str("<section class=\"activity\">\n<h2>Activity</h2>\n<ol class=\"chart\">\n");
    for (label, count) in month_labels(now).iter().zip(activity) {
        writeln!(
            page,
            r#"<li title="{label}: {count}"><span class="bar" style="height: {height}%"></span><span class="month">{label}</span></li>"#,
            label = label,
            count = count,
            height = u64::from(*count) * 100 / u64::from(max),
        )?;
    }
    page.push_str("</ol>\n</section>\n");
    Ok(())
}

fn write_tech_stack(page: &mut String, profile: &Profile) -> fmt::Result {
    page.push_str("<section class=\"tech-stack\">\n<h2>Tech stack</h2>\n<ul>\n");
    for entry in &profile.tech_stack {
        writeln!(
            page,
            r#"<li style="background-color: {}">{}</li>"#,
            escape(&entry.color),
            escape(&entry.name)
        )?;
    }
    page.push_str("</ul>\n</section>\n</main>\n");
    Ok(())
}

fn write_footer(page: &mut String, config: &Config, now: DateTime<Utc>) -> fmt::Result {
    writeln!(page, "<footer>&copy; {} {}</footer>", now.year(), escape(&config.name))?;
    page.push_str("</body>\n</html>\n");
    Ok(())
}

/// `YYYY-MM` of the twelve months ending with the current one, oldest first.
fn month_labels(now: DateTime<Utc>) -> Vec<String> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..MONTHS as i32)
        .rev()
        .map(|offset| {
            let month = current - offset;
            format!("{:04}-{:02}", month.div_euclid(12), month.rem_euclid(12) + 1)
        })
        .collect()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
use homepage::activity::FALLBACK_ACTIVITY;
#[cfg(test)]
use homepage::tech_stack::fallback_tech_stack;

#[cfg(test)]
fn profile() -> Profile {
    Profile {
        avatar_url: "https://avatars/1".to_string(),
        name: "<Octo & Cat>".to_string(),
        bio: "bio".to_string(),
        total_repos: 3,
        total_stars: 42,
        readme_content: "<p>Hello</p>".to_string(),
        recent_repos: Vec::new(),
        activity_data: FALLBACK_ACTIVITY,
        tech_stack: fallback_tech_stack(),
    }
}

#[cfg(test)]
fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-10T00:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap()
}

#[test]
fn month_labels_test() {
    let labels = month_labels(now());
    assert_eq!(labels.len(), MONTHS);
    assert_eq!(labels[0], "2025-03");
    assert_eq!(labels[10], "2026-01");
    assert_eq!(labels[11], "2026-02");
}

#[test]
fn render_test() {
    let page = render(&profile(), &Config::default(), now(), None).unwrap();

    assert!(page.contains("<h1>&lt;Octo &amp; Cat&gt;</h1>"), "Names are escaped");
    assert!(page.contains("<p>Hello</p>"), "README HTML is embedded as is");
    assert!(page.contains("42 stars"));
    assert!(page.contains(r#"data-theme="auto""#));
    assert!(page.contains("HTML/CSS"));
    assert_eq!(page.matches("class=\"bar\"").count(), MONTHS);
    assert!(page.contains("&copy; 2026"));
    assert!(!page.contains("recent-repos"));
    assert!(!page.contains("backdrop-filter"));
}

#[test]
fn background_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::default();
    assert_eq!(locate_background(dir.path(), &config), None);

    std::fs::create_dir(dir.path().join("static"))?;
    std::fs::write(dir.path().join("static").join("background.jpg"), b"jpg")?;
    assert_eq!(locate_background(dir.path(), &config).as_deref(), Some("/static/background.jpg"));

    std::fs::write(dir.path().join("background.jpg"), b"jpg")?;
    let background = locate_background(dir.path(), &config);
    assert_eq!(background.as_deref(), Some("/background.jpg"));

    let page = render(&profile(), &config, now(), background.as_deref())?;
    assert!(page.contains(r#"url("/background.jpg")"#));
    assert!(page.contains("blur(8px)"));
    Ok(())
}
