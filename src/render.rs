//! Safe substitution of a compiled section into tagged spans.

use console::Style;

use crate::fields::ExtractionEnvironment;
use crate::template::{BodyLine, Piece, Section, TemplateDocument};

/// Characters that carry meaning in the template syntax
pub const STRUCTURAL_CHARS: [char; 3] = ['{', '}', '|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Heading,
    ResolvedValue,
    UnresolvedPlaceholder,
    StructuralCharacter,
    FreeformLine,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedOutput {
    spans: Vec<Span>,
}

impl RenderedOutput {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn count(&self, kind: SpanKind) -> usize {
        self.spans.iter().filter(|s| s.kind == kind).count()
    }

    /// Text with all tags dropped, as it goes into the editable surface.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn styled(&self, palette: &Palette) -> String {
        self.spans
            .iter()
            .map(|s| palette.style(s.kind).apply_to(&s.text).to_string())
            .collect()
    }

    fn push(&mut self, kind: SpanKind, text: &str) {
        if text.is_empty() {
            return;
        }
        // Only plain text is merged so every placeholder keeps its own span.
        if kind == SpanKind::PlainText {
            if let Some(last) = self.spans.last_mut() {
                if last.kind == SpanKind::PlainText {
                    last.text.push_str(text);
                    return;
                }
            }
        }
        self.spans.push(Span {
            kind,
            text: text.to_string(),
        });
    }

    /// Push `text` as `kind`, splitting out structural characters.
    fn push_marked(&mut self, kind: SpanKind, text: &str) {
        let mut rest = text;
        while let Some(pos) = rest.find(STRUCTURAL_CHARS) {
            self.push(kind, &rest[..pos]);
            self.push(SpanKind::StructuralCharacter, &rest[pos..pos + 1]);
            rest = &rest[pos + 1..];
        }
        self.push(kind, rest);
    }

    fn extend(&mut self, other: RenderedOutput) {
        for span in other.spans {
            self.push(span.kind, &span.text);
        }
    }
}

/// Terminal styles for each span kind.
#[derive(Debug, Clone)]
pub struct Palette {
    pub heading: Style,
    pub resolved: Style,
    pub unresolved: Style,
    pub structural: Style,
    pub freeform: Style,
    pub plain: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            heading: Style::new().cyan(),
            resolved: Style::new().green(),
            unresolved: Style::new().red().bold(),
            structural: Style::new().red().bold(),
            freeform: Style::new().yellow(),
            plain: Style::new(),
        }
    }
}

impl Palette {
    pub fn style(&self, kind: SpanKind) -> &Style {
        match kind {
            SpanKind::Heading => &self.heading,
            SpanKind::ResolvedValue => &self.resolved,
            SpanKind::UnresolvedPlaceholder => &self.unresolved,
            SpanKind::StructuralCharacter => &self.structural,
            SpanKind::FreeformLine => &self.freeform,
            SpanKind::PlainText => &self.plain,
        }
    }
}

/// Render one section body. Pure: the same inputs give the same output.
pub fn render(section: &Section, env: &ExtractionEnvironment) -> RenderedOutput {
    let mut out = RenderedOutput::default();
    for (idx, line) in section.lines.iter().enumerate() {
        if idx > 0 {
            out.push(SpanKind::PlainText, "\n");
        }
        render_line(&mut out, line, env);
    }
    out
}

/// Every section, each preceded by its heading.
pub fn render_document(doc: &TemplateDocument, env: &ExtractionEnvironment) -> RenderedOutput {
    let mut out = RenderedOutput::default();
    for (idx, section) in doc.sections().iter().enumerate() {
        if idx > 0 {
            out.push(SpanKind::PlainText, "\n\n");
        }
        out.push(SpanKind::Heading, &section.name);
        out.push(SpanKind::PlainText, "\n");
        out.extend(render(section, env));
    }
    out
}

fn render_line(out: &mut RenderedOutput, line: &BodyLine, env: &ExtractionEnvironment) {
    if line.freeform {
        out.push(SpanKind::FreeformLine, &line.text);
        return;
    }

    for piece in &line.pieces {
        match piece {
            Piece::Text(text) => out.push_marked(SpanKind::PlainText, text),
            Piece::Dollar => out.push(SpanKind::PlainText, "$"),
            Piece::Placeholder { name, source } => match env.lookup(name) {
                Some(value) => out.push(SpanKind::ResolvedValue, value),
                None => out.push_marked(SpanKind::UnresolvedPlaceholder, source),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field, FieldRule, Provenance};
    use crate::template::compile;

    fn env_with_project(value: &str) -> ExtractionEnvironment {
        ExtractionEnvironment::builder()
            .with(Field::Project, value, Provenance::Rule(FieldRule::LabeledUrl))
            .build()
    }

    fn first_section(text: &str) -> Section {
        compile(text).unwrap().sections()[0].clone()
    }

    #[test]
    fn test_resolved_and_unresolved_spans() {
        let section = first_section("## Reply\n    Hello $PROJECT, owned by $CANDIDATE\n");
        let out = render(&section, &env_with_project("foo-pkg"));

        assert_eq!(out.plain_text(), "Hello foo-pkg, owned by $CANDIDATE");
        assert_eq!(
            out.spans(),
            &[
                Span {
                    kind: SpanKind::PlainText,
                    text: "Hello ".to_string()
                },
                Span {
                    kind: SpanKind::ResolvedValue,
                    text: "foo-pkg".to_string()
                },
                Span {
                    kind: SpanKind::PlainText,
                    text: ", owned by ".to_string()
                },
                Span {
                    kind: SpanKind::UnresolvedPlaceholder,
                    text: "$CANDIDATE".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_braced_unresolved_marks_braces() {
        let section = first_section("## Reply\n    to ${CANDIDATE}.\n");
        let out = render(&section, &ExtractionEnvironment::default());

        assert_eq!(out.plain_text(), "to ${CANDIDATE}.");
        let kinds: Vec<_> = out.spans().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::PlainText,
                SpanKind::UnresolvedPlaceholder,
                SpanKind::StructuralCharacter,
                SpanKind::UnresolvedPlaceholder,
                SpanKind::StructuralCharacter,
                SpanKind::PlainText,
            ]
        );
    }

    #[test]
    fn test_braced_resolved() {
        let section = first_section("## Reply\n    ${PROJECT}s\n");
        let out = render(&section, &env_with_project("foo"));
        assert_eq!(out.plain_text(), "foos");
        assert_eq!(out.count(SpanKind::StructuralCharacter), 0);
    }

    #[test]
    fn test_lower_case_never_resolved() {
        let section = first_section("## Reply\n    $project $Project\n");
        let out = render(&section, &env_with_project("foo"));
        assert_eq!(out.plain_text(), "$project $Project");
        assert_eq!(out.count(SpanKind::UnresolvedPlaceholder), 2);
        assert_eq!(out.count(SpanKind::ResolvedValue), 0);
    }

    #[test]
    fn test_empty_value_is_unresolved() {
        let section = first_section("## Reply\n    $PROJECT\n");
        let out = render(&section, &env_with_project(""));
        assert_eq!(out.count(SpanKind::UnresolvedPlaceholder), 1);
    }

    #[test]
    fn test_literal_structural_characters() {
        let section = first_section("## Reply\n    a | b {c}\n");
        let out = render(&section, &ExtractionEnvironment::default());
        assert_eq!(out.count(SpanKind::StructuralCharacter), 3);
        assert_eq!(out.plain_text(), "a | b {c}");
    }

    #[test]
    fn test_freeform_line_not_substituted() {
        let section = first_section("## Reply\nNote: check $PROJECT {first}\n    Hi $PROJECT\n");
        let out = render(&section, &env_with_project("foo"));

        assert_eq!(out.spans()[0].kind, SpanKind::FreeformLine);
        assert_eq!(out.spans()[0].text, "Note: check $PROJECT {first}");
        assert_eq!(out.plain_text(), "Note: check $PROJECT {first}\nHi foo");
        assert_eq!(out.count(SpanKind::StructuralCharacter), 0);
    }

    #[test]
    fn test_dollar_escape() {
        let section = first_section("## Reply\n    costs $$5 or $$PROJECT\n");
        let out = render(&section, &env_with_project("foo"));
        assert_eq!(out.plain_text(), "costs $5 or $PROJECT");
        assert_eq!(out.count(SpanKind::ResolvedValue), 0);
        assert_eq!(out.count(SpanKind::UnresolvedPlaceholder), 0);
    }

    #[test]
    fn test_fully_resolved_has_no_unresolved_spans() {
        let section = first_section("## Reply\n    $PROJECT for ${CANDIDATE} at $PYPI_URL\n");
        let env = ExtractionEnvironment::builder()
            .with(Field::Project, "foo", Provenance::Rule(FieldRule::LabeledBare))
            .with(Field::Candidate, "bob", Provenance::Rule(FieldRule::LabeledBare))
            .with(Field::ProjectUrl, "https://pypi.org/project/foo/", Provenance::Derived)
            .build();
        let out = render(&section, &env);
        assert_eq!(out.count(SpanKind::UnresolvedPlaceholder), 0);
        assert_eq!(out.count(SpanKind::ResolvedValue), 3);
    }

    #[test]
    fn test_render_is_idempotent() {
        let section = first_section("## Reply\nnote\n    $PROJECT | ${CANDIDATE}\n");
        let env = env_with_project("foo");
        assert_eq!(render(&section, &env), render(&section, &env));
    }

    #[test]
    fn test_render_document_headings() {
        let doc = compile("## One\n    1 $PROJECT\n## Two\n    2\n").unwrap();
        let out = render_document(&doc, &env_with_project("foo"));
        assert_eq!(out.plain_text(), "## One\n1 foo\n\n## Two\n2");
        assert_eq!(out.count(SpanKind::Heading), 2);
    }

    #[test]
    fn test_styled_strips_to_plain_text() {
        let section = first_section("## Reply\nnote\n    Hello $PROJECT {x}\n");
        let out = render(&section, &env_with_project("foo"));
        let styled = out.styled(&Palette::default());
        assert_eq!(console::strip_ansi_codes(&styled), out.plain_text());
    }
}
