//! Reply template compilation.
//!
//! A template is plain text split into sections by heading lines:
//!
//! ```text
//! ## Initial response
//! Send this when the issue is first triaged.
//!
//!     Hello, thanks for the request for $PROJECT.
//! ```
//!
//! Indented lines are reply text; unindented lines are notes for the
//! reviewer (freeform lines). Placeholders are `$NAME` or `${NAME}` and
//! `$$` is a literal dollar sign.

use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use crate::error::TemplateError;

pub const DEFAULT_HEADING_MARKER: &str = "##";

/// `$$`, `$name` or `${name}`
const PLACEHOLDER_PATTERN: &str = r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\})";

/// One token of a body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    /// `$$`
    Dollar,
    /// `$NAME` or `${NAME}`, with `source` as written
    Placeholder { name: String, source: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLine {
    /// Line text with the section margin removed
    pub text: String,
    /// Non-blank line that had no indentation in the source
    pub freeform: bool,
    pub pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub lines: Vec<BodyLine>,
    /// Distinct placeholder identifiers in first-seen order
    pub placeholders: Vec<String>,
}

impl Section {
    /// Dedented body as a single string.
    pub fn body(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn from_raw(name: String, raw: &[&str], placeholder_re: &Regex) -> Self {
        let mut lines = dedent(raw);
        for line in &mut lines {
            line.pieces = tokenize(placeholder_re, &line.text);
        }
        let placeholders = scan_placeholders(&lines);
        debug!(
            "Compiled section {:?}: {} lines, {} placeholders",
            name,
            lines.len(),
            placeholders.len()
        );
        Self {
            name,
            lines,
            placeholders,
        }
    }
}

/// Compiled template, sections in source order with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDocument {
    sections: Vec<Section>,
}

impl TemplateDocument {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    heading_marker: String,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_MARKER)
    }
}

impl TemplateCompiler {
    pub fn new(heading_marker: impl Into<String>) -> Self {
        let heading_marker = heading_marker.into();
        Self {
            heading_marker: if heading_marker.is_empty() {
                DEFAULT_HEADING_MARKER.to_string()
            } else {
                heading_marker
            },
        }
    }

    pub fn compile(&self, text: &str) -> Result<TemplateDocument, TemplateError> {
        let placeholder_re = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| TemplateError::Pattern(e.to_string()))?;
        let mut sections: Vec<Section> = Vec::new();
        let mut seen = HashSet::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for (idx, line) in text.lines().enumerate() {
            if line.starts_with(&self.heading_marker) {
                let name = line.trim_end().to_string();
                if !seen.insert(name.clone()) {
                    return Err(TemplateError::DuplicateSection { name });
                }
                if let Some((prev, body)) = current.take() {
                    sections.push(Section::from_raw(prev, &body, &placeholder_re));
                }
                current = Some((name, Vec::new()));
                continue;
            }

            match current.as_mut() {
                Some((_, body)) => body.push(line),
                None if line.trim().is_empty() => {}
                None => return Err(TemplateError::BodyBeforeHeading { line: idx + 1 }),
            }
        }

        if let Some((name, body)) = current {
            sections.push(Section::from_raw(name, &body, &placeholder_re));
        }

        Ok(TemplateDocument { sections })
    }
}

/// Compile with the default `##` heading marker.
pub fn compile(text: &str) -> Result<TemplateDocument, TemplateError> {
    TemplateCompiler::default().compile(text)
}

fn leading_whitespace(line: &str) -> &str {
    let end = line.len() - line.trim_start().len();
    &line[..end]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..len]
}

/// Strip the margin shared by all indented lines and mark the rest as
/// freeform. Blank lines at either end are dropped.
fn dedent(raw: &[&str]) -> Vec<BodyLine> {
    let first = raw.iter().position(|l| !l.trim().is_empty());
    let last = raw.iter().rposition(|l| !l.trim().is_empty());
    let raw = match (first, last) {
        (Some(first), Some(last)) => &raw[first..=last],
        _ => return Vec::new(),
    };

    let margin = raw
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .filter(|ws| !ws.is_empty())
        .reduce(common_prefix)
        .unwrap_or("");

    raw.iter()
        .map(|line| {
            if line.trim().is_empty() {
                BodyLine {
                    text: String::new(),
                    freeform: false,
                    pieces: Vec::new(),
                }
            } else if leading_whitespace(line).is_empty() {
                BodyLine {
                    text: line.to_string(),
                    freeform: true,
                    pieces: Vec::new(),
                }
            } else {
                BodyLine {
                    text: line.strip_prefix(margin).unwrap_or(line).to_string(),
                    freeform: false,
                    pieces: Vec::new(),
                }
            }
        })
        .collect()
}

fn tokenize(placeholder_re: &Regex, text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut cursor = 0;
    for cap in placeholder_re.captures_iter(text) {
        let Some(whole) = cap.get(0) else { continue };
        if whole.start() > cursor {
            pieces.push(Piece::Text(text[cursor..whole.start()].to_string()));
        }
        cursor = whole.end();
        match cap.get(2).or_else(|| cap.get(3)) {
            Some(name) => pieces.push(Piece::Placeholder {
                name: name.as_str().to_string(),
                source: whole.as_str().to_string(),
            }),
            None => pieces.push(Piece::Dollar),
        }
    }
    if cursor < text.len() {
        pieces.push(Piece::Text(text[cursor..].to_string()));
    }
    pieces
}

fn scan_placeholders(lines: &[BodyLine]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for piece in lines.iter().flat_map(|l| &l.pieces) {
        if let Piece::Placeholder { name, .. } = piece {
            if !found.contains(name) {
                found.push(name.clone());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
## Initial response

Use when the issue is first triaged.

    Hi $CANDIDATE,

    thanks for the request for ${PROJECT}.
      Indented more.

## Reach out to the owner

    Dear owner of $PROJECT, we got a request ($$0 fee).
";

    #[test]
    fn test_sections_in_source_order() {
        let doc = compile(TEMPLATE).unwrap();
        assert_eq!(
            doc.names(),
            vec!["## Initial response", "## Reach out to the owner"]
        );
    }

    #[test]
    fn test_dedent_keeps_relative_indentation() {
        let doc = compile(TEMPLATE).unwrap();
        let section = doc.get("## Initial response").unwrap();
        assert_eq!(
            section.body(),
            "Use when the issue is first triaged.\n\n\
             Hi $CANDIDATE,\n\n\
             thanks for the request for ${PROJECT}.\n  Indented more."
        );
    }

    #[test]
    fn test_freeform_lines_are_flagged() {
        let doc = compile(TEMPLATE).unwrap();
        let section = &doc.sections()[0];
        let freeform: Vec<_> = section
            .lines
            .iter()
            .filter(|l| l.freeform)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(freeform, vec!["Use when the issue is first triaged."]);
    }

    #[test]
    fn test_placeholders_enumerated_once() {
        let doc = compile(
            "## A\n    $PROJECT and ${PROJECT} for $CANDIDATE, not $$ESCAPED\n    $lower\n",
        )
        .unwrap();
        assert_eq!(
            doc.sections()[0].placeholders,
            vec!["PROJECT", "CANDIDATE", "lower"]
        );
    }

    #[test]
    fn test_duplicate_section_fails() {
        let err = compile("## A\n    one\n## B\n    two\n## A\n    three\n").unwrap_err();
        assert_eq!(
            err,
            TemplateError::DuplicateSection {
                name: "## A".to_string()
            }
        );
    }

    #[test]
    fn test_body_before_heading_fails() {
        let err = compile("\n\nstray text\n## A\n    body\n").unwrap_err();
        assert_eq!(err, TemplateError::BodyBeforeHeading { line: 3 });
    }

    #[test]
    fn test_leading_blank_lines_allowed() {
        let doc = compile("\n   \n## A\n    body\n").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_empty_section() {
        let doc = compile("## A\n\n## B\n    b\n").unwrap();
        assert!(doc.sections()[0].lines.is_empty());
        assert_eq!(doc.sections()[1].body(), "b");
    }

    #[test]
    fn test_custom_heading_marker() {
        let doc = TemplateCompiler::new("###")
            .compile("### One\n    1\n### Two\n    2\n")
            .unwrap();
        assert_eq!(doc.names(), vec!["### One", "### Two"]);
    }

    #[test]
    fn test_tab_margin() {
        let doc = compile("## A\n\tfirst\n\t\tsecond\n").unwrap();
        assert_eq!(doc.sections()[0].body(), "first\n\tsecond");
    }

    #[test]
    fn test_line_pieces() {
        let doc = compile("## A\n    $$5 for ${PROJECT}, $ left\n").unwrap();
        assert_eq!(
            doc.sections()[0].lines[0].pieces,
            vec![
                Piece::Dollar,
                Piece::Text("5 for ".to_string()),
                Piece::Placeholder {
                    name: "PROJECT".to_string(),
                    source: "${PROJECT}".to_string(),
                },
                Piece::Text(", $ left".to_string()),
            ]
        );
    }
}
