use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::info;

use crate::cli::interactive;
use crate::clipboard::CommandClipboard;
use crate::config::Config;
use crate::extract::Extractor;
use crate::issue::GitHubIssues;
use crate::pipeline::{self, report};
use crate::registry::PyPiClient;
use crate::render::{render_document, Palette};
use crate::selector::Selector;
use crate::template::{TemplateCompiler, TemplateDocument};

/// Compile the configured template. Runs before any network call so a
/// broken template never costs an API request.
pub fn load_template(config: &Config) -> Result<TemplateDocument> {
    let text = config.template_text()?;
    let document = TemplateCompiler::new(config.template.heading_marker.as_str())
        .compile(&text)
        .context("Invalid reply template")?;
    info!("Loaded {} template sections", document.len());
    Ok(document)
}

/// Fill in the reply template for one support issue.
pub async fn run(issue_number: u64, config: &Config, print_only: bool) -> Result<()> {
    let document = load_template(config)?;
    let extractor = Extractor::new(&config.registry.base_url)?;
    let issues = GitHubIssues::new(
        &config.issues.api_url,
        &config.issues.repo,
        &config.http.user_agent,
        config.http.timeout_secs,
    )?;
    let registry = PyPiClient::new(
        &config.registry.base_url,
        &config.registry.stats_url,
        &config.http.user_agent,
        config.http.timeout_secs,
    )?;

    let resolution = pipeline::resolve_issue(issue_number, &issues, &extractor, &registry).await?;
    let palette = Palette::default();

    if print_only {
        let output = render_document(&document, &resolution.environment);
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", output.styled(&palette))?;
        writeln!(stdout)?;
        report::write_download_stats(&mut stdout, &registry, &resolution, &palette).await?;
        report::write_summary(&mut stdout, &resolution)?;
        return Ok(());
    }

    let mut stdout = io::stdout();
    report::write_summary(&mut stdout, &resolution)?;
    report::write_download_stats(&mut stdout, &registry, &resolution, &palette).await?;
    stdout.flush()?;

    let clipboard = CommandClipboard::new(config.clipboard.command.clone());
    let mut selector = Selector::new(&document, &resolution.environment);
    interactive::run(&mut selector, &clipboard, &palette)
}
