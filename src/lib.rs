pub mod args;
pub mod config;
pub mod export;
pub mod page;
pub mod server;

use crate::args::{Args, Command};
use crate::config::Config;
use crate::server::AppState;
use github_client::{GithubClient, GithubClientBuilder};
use homepage::ProfileAssembler;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn client_builder(args: &Args, config: &Config) -> homepage::api::Result<GithubClientBuilder> {
    let mut builder = GithubClientBuilder::default()
        .with_github_url(&args.api_url)
        .with_raw_url(&args.raw_url)
        .with_timeout(Duration::from_secs(args.timeout))
        .danger_accept_invalid_certs(args.insecure);
    if let Some(token) = config::resolve_token(&args.token_file, config) {
        builder = builder.try_with_token(token)?;
    }
    Ok(builder)
}

pub fn build_client(args: &Args, config: &Config) -> homepage::api::Result<GithubClient> {
    client_builder(args, config)?.build()
}

pub fn build_assembler(args: &Args, config: &Config, root: &Path) -> anyhow::Result<ProfileAssembler<GithubClient>> {
    let client = build_client(args, config)?;
    Ok(ProfileAssembler::new(client, config.profile_settings(root)))
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = config::load_or_bootstrap(&args.config)?;
    let root = config::config_root(&args.config);
    let assembler = build_assembler(&args, &config, &root)?;

    match args.command.unwrap_or_default() {
        Command::Serve { bind } => {
            let state = AppState { assembler, config, root };
            server::start_server(bind, Arc::new(state)).await
        }
        Command::Export { out } => match export::export_static(&assembler, &config, &root, &out).await {
            Ok(index) => {
                info!("Export finished: {}", index.display());
                Ok(())
            }
            Err(err) => {
                error!("Export to {} failed: {:#}", out.display(), err);
                Err(err)
            }
        },
    }
}

#[cfg(test)]
use clap::Parser;

#[test]
fn insecure_reaches_client_builder_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let token_file = dir.path().join("github_token.txt");
    let token_file = token_file.to_string_lossy();

    let args = Args::parse_from(["homepage", "--token-file", &*token_file, "--timeout", "9"]);
    let builder = format!("{:?}", client_builder(&args, &Config::default())?);
    assert!(builder.contains("accept_invalid_certs: false"));
    assert!(builder.contains("timeout: 9s"));

    let args = Args::parse_from(["homepage", "--token-file", &*token_file, "--insecure"]);
    let builder = format!("{:?}", client_builder(&args, &Config::default())?);
    assert!(builder.contains("accept_invalid_certs: true"));
    assert!(build_client(&args, &Config::default()).is_ok());
    Ok(())
}

#[tokio::test]
async fn failed_export_is_an_error_test() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("taken");
    std::fs::write(&out, "a file, not a directory")?;
    let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();

    let args = Args::parse_from([
        "homepage".to_string(),
        "--config".to_string(),
        path("config.json"),
        "--token-file".to_string(),
        path("github_token.txt"),
        "export".to_string(),
        "--out".to_string(),
        path("taken"),
    ]);

    assert!(run(args).await.is_err());
    assert_eq!(std::fs::read_to_string(&out)?, "a file, not a directory");
    Ok(())
}
