//! Section picker state: the list of sections, the last render, and the
//! editable surface that gets copied.
//!
//! The surface starts as the flattened render of the selected section and
//! may be edited by hand afterwards. `copy` always takes the surface as it
//! is now, not the last render.

use anyhow::{Context, Result};
use tracing::debug;

use crate::clipboard::Clipboard;
use crate::fields::ExtractionEnvironment;
use crate::render::{render, RenderedOutput};
use crate::template::TemplateDocument;

pub struct Selector<'a> {
    document: &'a TemplateDocument,
    environment: &'a ExtractionEnvironment,
    selected: Option<usize>,
    surface: String,
}

impl<'a> Selector<'a> {
    pub fn new(document: &'a TemplateDocument, environment: &'a ExtractionEnvironment) -> Self {
        Self {
            document,
            environment,
            selected: None,
            surface: String::new(),
        }
    }

    /// Section names in document order
    pub fn names(&self) -> Vec<&'a str> {
        self.document.names()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Render section `index` and load it into the surface.
    pub fn select(&mut self, index: usize) -> Result<RenderedOutput> {
        let section = self
            .document
            .sections()
            .get(index)
            .with_context(|| format!("No template section at index {}", index))?;
        debug!("Rendering section {:?}", section.name);

        let output = render(section, self.environment);
        self.surface = output.plain_text();
        self.selected = Some(index);
        Ok(output)
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Replace the surface with hand-edited text.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.surface = text.into();
    }

    /// Put the current surface on the clipboard.
    pub fn copy(&self, clipboard: &dyn Clipboard) -> Result<()> {
        clipboard.copy(&self.surface)
    }
}
