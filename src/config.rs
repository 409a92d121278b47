use anyhow::Context;
use homepage::settings::{DarkMode, ProfileSettings, Theme};
use log::{debug, info, warn};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory next to the configuration file holding the shipped defaults.
const DEFAULTS_DIR: &str = "default";
const DEFAULT_CONFIG_FILE: &str = "default_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "github_url", alias = "profile_url")]
    pub profile_url: String,
    pub dark_mode: DarkMode,
    pub name: String,
    pub bio: String,
    pub introduction_file: PathBuf,
    pub github_token: String,
    pub theme: Theme,
    pub background: Background,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Background {
    pub image: String,
    pub blur: u32,
    pub overlay_opacity: f32,
    pub overlay_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            profile_url: "https://github.com/cicadaas-design".to_string(),
            dark_mode: DarkMode::Auto,
            name: "cicadaas".to_string(),
            bio: "数学建模爱好者，Python编程爱好者，AI技术爱好者".to_string(),
            introduction_file: PathBuf::from("Introduction.md"),
            github_token: String::new(),
            theme: Theme::default(),
            background: Background::default(),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background {
            image: "background.jpg".to_string(),
            blur: 8,
            overlay_opacity: 0.9,
            overlay_color: "#ffffff".to_string(),
        }
    }
}

impl Config {
    /// Settings of the profile pipeline; relative paths are resolved against `root`.
    pub fn profile_settings(&self, root: &Path) -> ProfileSettings {
        ProfileSettings {
            profile_url: self.profile_url.clone(),
            name: self.name.clone(),
            bio: self.bio.clone(),
            introduction_file: root.join(&self.introduction_file),
            theme: self.theme.clone(),
            dark_mode: self.dark_mode,
        }
    }

    /// Copy safe to hand out over HTTP.
    pub fn redacted(&self) -> Config {
        Config {
            github_token: String::new(),
            ..self.clone()
        }
    }
}

/// Directory the configuration file lives in; site files are looked up relative to it.
pub fn config_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Loads the configuration, creating it first when missing.
///
/// A missing file is copied from `default/default_config.json` (with the background image, if that is missing
/// too); without shipped defaults the built-in configuration is written instead.
pub fn load_or_bootstrap(config_path: &Path) -> anyhow::Result<Config> {
    if !config_path.exists() {
        bootstrap(config_path)?;
    }
    let text = fs::read_to_string(config_path)
        .with_context(|| format!("reading configuration from {}", config_path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing configuration from {}", config_path.display()))?;
    debug!("Loaded configuration from {}", config_path.display());
    Ok(config)
}

fn bootstrap(config_path: &Path) -> anyhow::Result<()> {
    let root = config_root(config_path);
    let defaults = root.join(DEFAULTS_DIR);
    let default_config = defaults.join(DEFAULT_CONFIG_FILE);

    if default_config.exists() {
        info!(
            "{} not found, copying {}",
            config_path.display(),
            default_config.display()
        );
        fs::copy(&default_config, config_path)
            .with_context(|| format!("copying {} to {}", default_config.display(), config_path.display()))?;

        let text = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing configuration from {}", default_config.display()))?;
        let image = root.join(&config.background.image);
        let default_image = defaults.join(&config.background.image);
        if !image.exists() && default_image.exists() {
            info!("{} not found, copying it from {}", image.display(), defaults.display());
            fs::copy(&default_image, &image)
                .with_context(|| format!("copying {} to {}", default_image.display(), image.display()))?;
        }
        return Ok(());
    }

    info!(
        "{} not found, writing the built-in default configuration",
        default_config.display()
    );
    let text = serde_json::to_string_pretty(&Config::default())?;
    fs::write(config_path, text).with_context(|| format!("writing {}", config_path.display()))?;
    Ok(())
}

/// GitHub token from `token_file`, falling back to the one in the configuration. Empty tokens count as missing.
pub fn resolve_token(token_file: &Path, config: &Config) -> Option<SecretString> {
    match fs::read_to_string(token_file) {
        Ok(text) => match clean_token(&text) {
            Some(token) => {
                info!("Using GitHub token from {}", token_file.display());
                return Some(SecretString::new(token));
            }
            None => warn!("{} is empty", token_file.display()),
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("{} not found, using the configured token", token_file.display())
        }
        Err(err) => warn!("Failed to read {}: {}", token_file.display(), err),
    }

    let token = clean_token(&config.github_token).map(SecretString::new);
    if token.is_none() {
        info!("No GitHub token configured, requests are anonymous");
    }
    token
}

fn clean_token(raw: &str) -> Option<String> {
    let token: String = raw.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
    Some(token).filter(|token| !token.is_empty())
}

#[cfg(test)]
use secrecy::ExposeSecret;

#[test]
fn partial_config_test() -> anyhow::Result<()> {
    let config: Config = serde_json::from_str(
        r##"{"profile_url": "https://github.com/octocat", "dark_mode": "dark", "theme": {"primary_color": "#101010"}}"##,
    )?;
    assert_eq!(config.profile_url, "https://github.com/octocat");
    assert!(config.dark_mode.is_dark());
    assert_eq!(config.theme.primary_color, "#101010");
    assert_eq!(config.theme.secondary_color, "#555555");
    assert_eq!(config.background, Background::default());
    Ok(())
}

#[test]
fn github_url_key_test() -> anyhow::Result<()> {
    let config: Config = serde_json::from_str(r#"{"github_url": "https://github.com/octocat"}"#)?;
    assert_eq!(config.profile_url, "https://github.com/octocat");
    assert!(serde_json::to_string(&config)?.contains("\"github_url\""));
    Ok(())
}

#[test]
fn bootstrap_builtin_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");

    let config = load_or_bootstrap(&path)?;

    assert_eq!(config, Config::default());
    assert!(path.exists());
    Ok(())
}

#[test]
fn bootstrap_from_defaults_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let defaults = dir.path().join(DEFAULTS_DIR);
    fs::create_dir(&defaults)?;
    fs::write(
        defaults.join(DEFAULT_CONFIG_FILE),
        r#"{"github_url": "https://github.com/octocat", "background": {"image": "bg.png"}}"#,
    )?;
    fs::write(defaults.join("bg.png"), b"png")?;
    let path = dir.path().join("config.json");

    let config = load_or_bootstrap(&path)?;

    assert_eq!(config.profile_url, "https://github.com/octocat");
    assert_eq!(fs::read(dir.path().join("bg.png"))?, b"png");
    Ok(())
}

#[test]
fn existing_config_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"name": "Octo"}"#)?;
    assert_eq!(load_or_bootstrap(&path)?.name, "Octo");

    fs::write(&path, "{")?;
    assert!(load_or_bootstrap(&path).is_err());
    Ok(())
}

#[test]
fn token_priority_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let token_file = dir.path().join("github_token.txt");
    let config = Config {
        github_token: "from-config".to_string(),
        ..Config::default()
    };

    let token = resolve_token(&token_file, &config).map(|t| t.expose_secret().clone());
    assert_eq!(token.as_deref(), Some("from-config"));

    fs::write(&token_file, " \"from-file\"\n")?;
    let token = resolve_token(&token_file, &config).map(|t| t.expose_secret().clone());
    assert_eq!(token.as_deref(), Some("from-file"));

    assert!(resolve_token(&dir.path().join("none"), &Config::default()).is_none());
    Ok(())
}

#[test]
fn redacted_test() {
    let config = Config {
        github_token: "ghp_secret".to_string(),
        ..Config::default()
    };
    assert!(config.redacted().github_token.is_empty());
}
