//! Known template fields and the per-run environment that binds them.
//!
//! Templates can only reference the fields in [`Field`]. Everything else
//! renders as an unresolved placeholder.

use std::collections::BTreeMap;
use std::fmt;

/// The closed set of values a reply template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Package under name-retention review
    Project,
    /// Account proposed to receive the name
    Candidate,
    /// Registry project page for `Project`
    ProjectUrl,
    /// Author contact from registry metadata
    AuthorAddress,
    /// Home page from registry metadata
    HomePage,
    /// Most recent release upload
    LastUpload,
    IssueNumber,
    IssueUrl,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Project,
        Field::Candidate,
        Field::ProjectUrl,
        Field::AuthorAddress,
        Field::HomePage,
        Field::LastUpload,
        Field::IssueNumber,
        Field::IssueUrl,
    ];

    /// Placeholder identifier used in templates (`$PROJECT`, `${PYPI_URL}`)
    pub fn placeholder(&self) -> &'static str {
        match self {
            Field::Project => "PROJECT",
            Field::Candidate => "CANDIDATE",
            Field::ProjectUrl => "PYPI_URL",
            Field::AuthorAddress => "PROJECT_AUTHOR_ADDRESS",
            Field::HomePage => "HOME_PAGE",
            Field::LastUpload => "LAST_UPLOAD",
            Field::IssueNumber => "ISSUE_NUMBER",
            Field::IssueUrl => "SUPPORT_ISSUE_URL",
        }
    }

    /// Map a placeholder identifier back to a field.
    /// Only exact upper-case identifiers are recognised.
    pub fn from_placeholder(name: &str) -> Option<Field> {
        if !is_upper_identifier(name) {
            return None;
        }
        Field::ALL.into_iter().find(|f| f.placeholder() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.placeholder())
    }
}

/// True when `name` has at least one cased character and none are lower-case.
pub fn is_upper_identifier(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase()) && !name.chars().any(|c| c.is_lowercase())
}

/// Which extraction rule produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// `` `name`: https://registry/project/name ``
    SelfReferential,
    /// `` `PROJECT_NAME`: https://registry/project/name ``
    LabeledUrl,
    /// `` `PROJECT_NAME`: name ``
    LabeledBare,
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::SelfReferential => write!(f, "self-referential"),
            FieldRule::LabeledUrl => write!(f, "labeled-url"),
            FieldRule::LabeledBare => write!(f, "labeled-bare"),
        }
    }
}

/// Where a bound value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Rule(FieldRule),
    Registry,
    Issue,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub field: Field,
    pub value: String,
    pub provenance: Provenance,
}

/// Immutable set of resolved fields for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionEnvironment {
    fields: BTreeMap<Field, ResolvedField>,
}

impl ExtractionEnvironment {
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(|r| r.value.as_str())
    }

    pub fn resolved(&self, field: Field) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    /// Resolve a template placeholder. Absent, empty and unknown names all
    /// come back as `None`.
    pub fn lookup(&self, placeholder: &str) -> Option<&str> {
        Field::from_placeholder(placeholder)
            .and_then(|f| self.get(f))
            .filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects bindings before the environment is frozen.
/// A later `set` for the same field replaces the earlier value.
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    fields: BTreeMap<Field, ResolvedField>,
}

impl EnvironmentBuilder {
    pub fn set(&mut self, field: Field, value: impl Into<String>, provenance: Provenance) {
        self.fields.insert(
            field,
            ResolvedField {
                field,
                value: value.into(),
                provenance,
            },
        );
    }

    pub fn insert(&mut self, resolved: ResolvedField) {
        self.fields.insert(resolved.field, resolved);
    }

    /// Bind `value` only when it is present.
    pub fn set_opt(&mut self, field: Field, value: Option<String>, provenance: Provenance) {
        if let Some(value) = value {
            self.set(field, value, provenance);
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>, provenance: Provenance) -> Self {
        self.set(field, value, provenance);
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(|r| r.value.as_str())
    }

    pub fn build(self) -> ExtractionEnvironment {
        ExtractionEnvironment {
            fields: self.fields,
        }
    }
}
