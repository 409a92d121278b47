use clap::{Parser, Subcommand};
#[cfg(test)]
use clap::CommandFactory;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Site configuration file, created on first run when missing
    #[clap(short, long, env, default_value = "config.json")]
    pub config: PathBuf,

    /// File holding a GitHub access token; takes priority over `github_token` in the configuration
    #[clap(long, env, default_value = "github_token.txt")]
    pub token_file: PathBuf,

    /// GitHub API URL
    #[clap(long, env, default_value = github_client::DEFAULT_GITHUB_URL)]
    pub api_url: String,

    /// Raw repository content URL, used for the profile README
    #[clap(long, env, default_value = github_client::DEFAULT_RAW_URL)]
    pub raw_url: String,

    /// Disable TLS certificate verification for GitHub requests
    #[clap(long, env = "HOMEPAGE_INSECURE")]
    pub insecure: bool,

    /// Timeout of a single GitHub request, in seconds
    #[clap(long, env = "HOMEPAGE_TIMEOUT", default_value_t = 5)]
    pub timeout: u64,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve the homepage over HTTP (default)
    Serve {
        /// Address to listen on
        #[clap(short, long, env, default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Render the homepage once into a directory of static files
    Export {
        /// Output directory
        #[clap(short, long, env = "EXPORT_DIR", default_value = "static_build")]
        out: PathBuf,
    },
}

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

#[test]
fn defaults_test() {
    let args = Args::parse_from(["homepage"]);
    assert_eq!(args.config, PathBuf::from("config.json"));
    assert!(!args.insecure);
    assert_eq!(args.timeout, 5);
    assert_eq!(args.command.unwrap_or_default(), Command::default());
}

#[test]
fn export_test() {
    let args = Args::parse_from(["homepage", "--insecure", "export", "--out", "site"]);
    assert!(args.insecure);
    assert_eq!(args.command, Some(Command::Export { out: PathBuf::from("site") }));
}

#[test]
fn env_names_test() {
    let command = Args::command();
    let env_of = |long: &str| {
        command
            .get_arguments()
            .find(|arg| arg.get_long() == Some(long))
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    };
    assert_eq!(env_of("insecure").as_deref(), Some("HOMEPAGE_INSECURE"));
    assert_eq!(env_of("timeout").as_deref(), Some("HOMEPAGE_TIMEOUT"));
    assert_eq!(env_of("token-file").as_deref(), Some("TOKEN_FILE"));
}
