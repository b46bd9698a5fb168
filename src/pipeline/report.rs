//! Reviewer-facing notes printed around the rendered reply.

use anyhow::Result;
use std::io::Write;
use tracing::warn;

use super::{format_upload_time, Resolution};
use crate::fields::Field;
use crate::registry::RegistryClient;
use crate::render::Palette;

/// Fetch recent download stats and print them, or the failure, inline.
/// Never fails the run for a stats problem; only write errors propagate.
pub async fn write_download_stats<W: Write>(
    out: &mut W,
    registry: &dyn RegistryClient,
    resolution: &Resolution,
    palette: &Palette,
) -> Result<()> {
    let Some(project) = resolution.project() else {
        return Ok(());
    };

    let url = registry.stats_url(project);
    writeln!(out, "{}", palette.heading.apply_to(&url))?;
    match registry.fetch_recent_downloads(project).await {
        Ok(stats) => writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?,
        Err(e) => {
            warn!("Download stats unavailable: {:#}", e);
            writeln!(out, "{:#}", e)?;
        }
    }
    Ok(())
}

/// Registry facts that are useful while reviewing but not templated.
pub fn write_summary<W: Write>(out: &mut W, resolution: &Resolution) -> Result<()> {
    let env = &resolution.environment;
    writeln!(out, "Project: {}", env.get(Field::Project).unwrap_or("-"))?;
    writeln!(out, "Candidate: {}", env.get(Field::Candidate).unwrap_or("-"))?;

    if let Some(record) = &resolution.metadata {
        if record.is_empty() {
            writeln!(out, "Registry: no such project")?;
        }
        writeln!(
            out,
            "Home page: {}",
            record.home_page.as_deref().unwrap_or("-")
        )?;
        if let Some(last) = record.last_upload() {
            writeln!(out, "Last upload: {}", format_upload_time(last))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{ExtractionEnvironment, FieldRule, Provenance};
    use crate::registry::MetadataRecord;
    use chrono::{TimeZone, Utc};

    fn resolution(metadata: Option<MetadataRecord>) -> Resolution {
        Resolution {
            issue_number: 7,
            environment: ExtractionEnvironment::builder()
                .with(Field::Project, "foo", Provenance::Rule(FieldRule::LabeledBare))
                .build(),
            metadata,
        }
    }

    #[test]
    fn test_summary_with_metadata() {
        let record = MetadataRecord {
            home_page: Some("https://foo.dev".to_string()),
            release_uploads: vec![Utc.with_ymd_and_hms(2020, 4, 5, 6, 7, 0).unwrap()],
            ..Default::default()
        };
        let mut out = Vec::new();
        write_summary(&mut out, &resolution(Some(record))).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Project: foo"));
        assert!(text.contains("Candidate: -"));
        assert!(text.contains("Home page: https://foo.dev"));
        assert!(text.contains("Last upload: 2020-04-05T06:07:00Z"));
        assert!(!text.contains("no such project"));
    }

    #[test]
    fn test_summary_unknown_project() {
        let mut out = Vec::new();
        write_summary(&mut out, &resolution(Some(MetadataRecord::default()))).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Registry: no such project"));
        assert!(!text.contains("Last upload"));
    }
}
