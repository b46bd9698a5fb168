//! Field extraction from free-text support requests.
//!
//! Each field has a fixed chain of three rules, evaluated in order:
//!
//! 1. self-referential: `` `name`: https://pypi.org/project/name `` (tentative)
//! 2. labeled URL: `` `PROJECT_NAME`: https://pypi.org/project/name ``
//! 3. labeled bare: `` `PROJECT_NAME`: name ``, only tried when rule 2 misses
//!
//! Rules 2 and 3 overwrite a tentative value from rule 1. A field with no
//! matching rule is simply absent.

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::error::ExtractError;
use crate::fields::{Field, FieldRule, Provenance, ResolvedField};

/// Registry page a field's URLs point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Project,
    User,
}

impl PageKind {
    pub fn path(&self) -> &'static str {
        match self {
            PageKind::Project => "project",
            PageKind::User => "user",
        }
    }
}

/// Static description of one field's rule chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    /// Label written inside backticks, e.g. `PROJECT_NAME`
    pub label: &'static str,
    pub page: PageKind,
}

impl FieldSpec {
    pub const PROJECT: FieldSpec = FieldSpec {
        field: Field::Project,
        label: "PROJECT_NAME",
        page: PageKind::Project,
    };

    pub const CANDIDATE: FieldSpec = FieldSpec {
        field: Field::Candidate,
        label: "USER_NAME",
        page: PageKind::User,
    };
}

/// A field spec with its three patterns compiled against one registry.
#[derive(Debug, Clone)]
pub struct RuleChain {
    spec: FieldSpec,
    self_referential: Regex,
    labeled_url: Regex,
    labeled_bare: Regex,
}

impl RuleChain {
    pub fn new(spec: FieldSpec, registry_url: &str) -> Result<Self> {
        let page_url = format!(
            "{}/{}/",
            regex::escape(registry_url.trim_end_matches('/')),
            spec.page.path()
        );
        let label = regex::escape(spec.label);

        Ok(Self {
            spec,
            self_referential: Regex::new(&format!(r"`([^`\n]+)`:\s*{page_url}"))
                .context("Failed to compile self-referential rule")?,
            labeled_url: Regex::new(&format!(r"`{label}`:\s*{page_url}(\S+)"))
                .context("Failed to compile labeled URL rule")?,
            labeled_bare: Regex::new(&format!(r"`{label}`:\s*([-_a-zA-Z0-9]+)"))
                .context("Failed to compile labeled bare rule")?,
        })
    }

    pub fn spec(&self) -> FieldSpec {
        self.spec
    }

    /// Run the chain over `text`. The surviving assignment is returned.
    pub fn extract(&self, text: &str) -> Option<ResolvedField> {
        let mut resolved = self
            .match_self_referential(text)
            .map(|value| self.resolve(value, FieldRule::SelfReferential));

        if let Some(value) = self.match_labeled_url(text) {
            resolved = Some(self.resolve(value, FieldRule::LabeledUrl));
        } else if let Some(value) = self.match_labeled_bare(text) {
            resolved = Some(self.resolve(value, FieldRule::LabeledBare));
        }

        if let Some(ref r) = resolved {
            debug!("{} = {:?} via {:?}", r.field, r.value, r.provenance);
        }
        resolved
    }

    fn resolve(&self, value: String, rule: FieldRule) -> ResolvedField {
        ResolvedField {
            field: self.spec.field,
            value,
            provenance: Provenance::Rule(rule),
        }
    }

    /// First backtick-quoted token whose adjacent URL repeats it.
    fn match_self_referential(&self, text: &str) -> Option<String> {
        self.self_referential.captures_iter(text).find_map(|cap| {
            let token = cap.get(1)?.as_str();
            let url_tail = &text[cap.get(0)?.end()..];
            url_repeats_token(url_tail, token).then(|| token.to_string())
        })
    }

    /// First labeled URL with a non-empty name segment right after the
    /// page path. Release URLs like `.../project/foo/1.2.0/` give `foo`.
    fn match_labeled_url(&self, text: &str) -> Option<String> {
        self.labeled_url.captures_iter(text).find_map(|cap| {
            let segment = cap[1].split('/').next()?;
            (!segment.is_empty()).then(|| segment.to_string())
        })
    }

    fn match_labeled_bare(&self, text: &str) -> Option<String> {
        self.labeled_bare.captures(text).map(|cap| cap[1].to_string())
    }
}

/// Whether `url_tail` starts with `token` (ignoring case) and the path
/// segment ends right after it.
fn url_repeats_token(url_tail: &str, token: &str) -> bool {
    let mut tail = url_tail.chars();
    for expected in token.chars() {
        match tail.next() {
            Some(c) if c.to_lowercase().eq(expected.to_lowercase()) => {}
            _ => return false,
        }
    }
    match tail.next() {
        None | Some('/') => true,
        Some(c) => c.is_whitespace(),
    }
}

/// Rule chains for every extracted field.
#[derive(Debug, Clone)]
pub struct Extractor {
    chains: Vec<RuleChain>,
    package_name: Regex,
}

impl Extractor {
    pub fn new(registry_url: &str) -> Result<Self> {
        Ok(Self {
            chains: vec![
                RuleChain::new(FieldSpec::PROJECT, registry_url)?,
                RuleChain::new(FieldSpec::CANDIDATE, registry_url)?,
            ],
            package_name: Regex::new(r"^[A-Za-z0-9_.-]+$")
                .context("Failed to compile package name pattern")?,
        })
    }

    /// Trim and check a package name against the registry charset.
    pub fn validate_package_name(&self, raw: &str) -> Result<String, ExtractError> {
        let name = raw.trim();
        if self.package_name.is_match(name) {
            Ok(name.to_string())
        } else {
            Err(ExtractError::InvalidPackageName(name.to_string()))
        }
    }

    /// Extract a single field, without validation.
    pub fn extract(&self, text: &str, field: Field) -> Option<ResolvedField> {
        self.chains
            .iter()
            .find(|c| c.spec().field == field)
            .and_then(|c| c.extract(text))
    }

    /// Extract every field. The package name is validated here so a bad
    /// value stops the run before any registry call.
    pub fn extract_all(&self, text: &str) -> Result<Vec<ResolvedField>, ExtractError> {
        let mut resolved = Vec::new();
        for chain in &self.chains {
            let Some(mut found) = chain.extract(text) else {
                debug!("{} not found in request text", chain.spec().field);
                continue;
            };
            if found.field == Field::Project {
                found.value = self.validate_package_name(&found.value)?;
            }
            resolved.push(found);
        }
        Ok(resolved)
    }
}
