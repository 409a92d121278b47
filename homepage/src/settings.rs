use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

/// Base colors the tech stack palette is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub dark_primary_color: String,
    pub dark_secondary_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            primary_color: "#333333".to_string(),
            secondary_color: "#555555".to_string(),
            dark_primary_color: "#222222".to_string(),
            dark_secondary_color: "#444444".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DarkMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl DarkMode {
    /// Only an explicit `dark` switches to the dark palette; `auto` is left to the browser.
    pub fn is_dark(self) -> bool {
        self == DarkMode::Dark
    }
}

/// The part of the site configuration the profile pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub profile_url: String,
    pub name: String,
    pub bio: String,
    pub introduction_file: PathBuf,
    pub theme: Theme,
    pub dark_mode: DarkMode,
}

impl ProfileSettings {
    /// Last non-empty path segment of the profile URL.
    pub fn username(&self) -> Option<&str> {
        self.profile_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty() && !segment.contains(':'))
    }
}

#[cfg(test)]
fn settings(profile_url: &str) -> ProfileSettings {
    ProfileSettings {
        profile_url: profile_url.to_string(),
        name: "name".to_string(),
        bio: "bio".to_string(),
        introduction_file: PathBuf::from("Introduction.md"),
        theme: Theme::default(),
        dark_mode: DarkMode::Auto,
    }
}

#[test]
fn username_test() {
    assert_eq!(settings("https://github.com/octocat").username(), Some("octocat"));
    assert_eq!(settings("https://github.com/octocat/").username(), Some("octocat"));
    assert_eq!(settings("octocat").username(), Some("octocat"));
    assert_eq!(settings("").username(), None);
    assert_eq!(settings("https://").username(), None);
}

#[test]
fn dark_mode_test() {
    use std::str::FromStr;
    assert!(DarkMode::from_str("dark").map(DarkMode::is_dark).unwrap_or(false));
    assert!(!DarkMode::Auto.is_dark());
    assert_eq!(DarkMode::Light.to_string(), "light");
}
