use crate::api::{Client, Error, Result};
use log::{debug, info};
use pulldown_cmark::{html, Options, Parser};
use std::path::Path;

/// Branches of the profile repository tried in order.
const README_BRANCHES: [&str; 2] = ["main", "master"];

pub const DEFAULT_INTRODUCTION: &str =
    "<p>欢迎访问我的个人主页！我是一名数学建模爱好者、Python编程爱好者和AI技术爱好者～</p>";

pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}

/// README of the `login/login` profile repository, rendered to HTML.
pub async fn profile_readme<CLIENT>(client: &CLIENT, login: &str) -> Result<String>
where
    CLIENT: Client + ?Sized,
{
    let mut last_error = Error::NotFound;
    for branch in README_BRANCHES {
        match client.readme(login, branch).await {
            Ok(markdown) => {
                info!("Using README of {}/{} from branch {}", login, login, branch);
                return Ok(render_markdown(&markdown));
            }
            Err(err) => {
                debug!("No README of {}/{} on branch {}: {}", login, login, branch, err);
                last_error = err;
            }
        }
    }
    Err(last_error)
}

/// The local introduction file rendered to HTML, or a built-in greeting when it cannot be read.
pub async fn local_readme(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(markdown) => render_markdown(&markdown),
        Err(err) => {
            debug!("Introduction file {} unavailable: {}", path.display(), err);
            DEFAULT_INTRODUCTION.to_string()
        }
    }
}

#[cfg(test)]
use crate::testing::FakeClient;
#[cfg(test)]
use std::io::Write;

#[test]
fn render_markdown_test() {
    assert_eq!(render_markdown("# Hi\n\nI *like* maths."), "<h1>Hi</h1>\n<p>I <em>like</em> maths.</p>\n");
}

#[tokio::test]
async fn master_after_main_test() -> Result<()> {
    let mut client = FakeClient::default();
    client.readme.insert("master".to_string(), "## From master".to_string());
    assert_eq!(profile_readme(&client, "octocat").await?, "<h2>From master</h2>\n");

    client.readme.insert("main".to_string(), "## From main".to_string());
    assert_eq!(profile_readme(&client, "octocat").await?, "<h2>From main</h2>\n");
    Ok(())
}

#[tokio::test]
async fn no_readme_test() {
    let client = FakeClient::default();
    assert!(matches!(profile_readme(&client, "octocat").await, Err(Error::NotFound)));
}

#[tokio::test]
async fn local_readme_test() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "Hello **there**")?;
    assert_eq!(local_readme(file.path()).await, "<p>Hello <strong>there</strong></p>\n");

    let missing = file.path().with_extension("missing");
    assert_eq!(local_readme(&missing).await, DEFAULT_INTRODUCTION);
    Ok(())
}
