use crate::config::Config;
use crate::page;
use anyhow::Context;
use chrono::Utc;
use homepage::api::Client;
use homepage::ProfileAssembler;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Files copied next to `index.html` when present in the site directory.
const EXTRA_RESOURCES: [&str; 2] = ["background.jpg", "favicon.ico"];

/// Renders the homepage once into `out_dir` for a static file host.
///
/// Files already in `out_dir` are removed first; subdirectories are left alone. Returns the path of the
/// written `index.html`.
pub async fn export_static<CLIENT: Client>(
    assembler: &ProfileAssembler<CLIENT>,
    config: &Config,
    root: &Path,
    out_dir: &Path,
) -> anyhow::Result<PathBuf> {
    info!("Exporting static homepage to {}", out_dir.display());
    prepare_dir(out_dir).await?;

    let profile = assembler.assemble().await;
    let background = root.join(&config.background.image);
    let background_url = background.is_file().then(|| config.background.image.clone());
    let html =
        page::render(&profile, config, Utc::now(), background_url.as_deref()).context("rendering homepage")?;
    let index = out_dir.join("index.html");
    tokio::fs::write(&index, html)
        .await
        .with_context(|| format!("writing {}", index.display()))?;
    info!("Static homepage written to {}", index.display());

    let mut resources = vec![config.background.image.as_str()];
    resources.extend(EXTRA_RESOURCES.iter().filter(|name| **name != config.background.image));
    for resource in resources {
        let source = root.join(resource);
        if !source.is_file() {
            continue;
        }
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = out_dir.join(file_name);
        match tokio::fs::copy(&source, &target).await {
            Ok(_) => info!("Copied {}", source.display()),
            Err(err) => warn!("Failed to copy {}: {}", source.display(), err),
        }
    }

    info!(
        "Deploy with: cd {} && git init && git add . && git commit -m 'Deploy' && git push -f <remote> master:gh-pages",
        out_dir.display()
    );
    Ok(index)
}

async fn prepare_dir(out_dir: &Path) -> anyhow::Result<()> {
    if !out_dir.exists() {
        tokio::fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("creating {}", out_dir.display()))?;
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(out_dir)
        .await
        .with_context(|| format!("listing {}", out_dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path())
                .await
                .with_context(|| format!("removing {}", entry.path().display()))?;
        }
    }
    Ok(())
}
