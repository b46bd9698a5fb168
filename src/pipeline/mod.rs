//! Run orchestration: request text → validated fields → registry facts →
//! the frozen environment templates are rendered against.

pub mod report;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::extract::Extractor;
use crate::fields::{ExtractionEnvironment, Field, Provenance};
use crate::issue::IssueSource;
use crate::registry::{MetadataRecord, RegistryClient};

/// RFC 3339 rendering used for `LAST_UPLOAD`, e.g. `2017-07-04T18:45:00Z`
pub fn format_upload_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Everything known about one support request
#[derive(Debug, Clone)]
pub struct Resolution {
    pub issue_number: u64,
    pub environment: ExtractionEnvironment,
    /// `None` when no package name was extracted and the registry was not asked
    pub metadata: Option<MetadataRecord>,
}

impl Resolution {
    pub fn project(&self) -> Option<&str> {
        self.environment.get(Field::Project)
    }
}

/// Fetch the issue body and resolve it.
pub async fn resolve_issue(
    issue_number: u64,
    issues: &dyn IssueSource,
    extractor: &Extractor,
    registry: &dyn RegistryClient,
) -> Result<Resolution> {
    let text = issues.fetch_body(issue_number).await?;
    info!("Fetched issue #{} ({} chars)", issue_number, text.len());
    resolve_text(
        issue_number,
        &issues.issue_url(issue_number),
        &text,
        extractor,
        registry,
    )
    .await
}

/// Extract fields from `text` and enrich them from the registry.
///
/// An invalid package name fails before the registry is contacted. A
/// registry failure is logged and treated as an unknown package.
pub async fn resolve_text(
    issue_number: u64,
    issue_url: &str,
    text: &str,
    extractor: &Extractor,
    registry: &dyn RegistryClient,
) -> Result<Resolution> {
    let extracted = extractor.extract_all(text)?;

    let mut builder = ExtractionEnvironment::builder();
    builder.set(Field::IssueNumber, issue_number.to_string(), Provenance::Issue);
    builder.set(Field::IssueUrl, issue_url, Provenance::Issue);
    for resolved in extracted {
        builder.insert(resolved);
    }

    let metadata = match builder.get(Field::Project).map(str::to_string) {
        Some(project) => {
            builder.set(
                Field::ProjectUrl,
                registry.project_url(&project),
                Provenance::Derived,
            );

            let record = match registry.fetch_project(&project).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Registry lookup for {} failed: {:#}", project, e);
                    MetadataRecord::default()
                }
            };

            builder.set_opt(
                Field::AuthorAddress,
                record.author_email.clone(),
                Provenance::Registry,
            );
            builder.set_opt(Field::HomePage, record.home_page.clone(), Provenance::Registry);
            builder.set_opt(
                Field::LastUpload,
                record.last_upload().map(format_upload_time),
                Provenance::Derived,
            );
            Some(record)
        }
        None => {
            info!("No package name in issue #{}", issue_number);
            None
        }
    };

    let environment = builder.build();
    for resolved in environment.iter() {
        debug!("{} = {:?} ({:?})", resolved.field, resolved.value, resolved.provenance);
    }

    Ok(Resolution {
        issue_number,
        environment,
        metadata,
    })
}
