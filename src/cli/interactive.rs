//! Terminal front-end for [`Selector`]: pick a section, read the render,
//! optionally edit it, copy it.

use anyhow::Result;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Editor, Select};
use tracing::warn;

use crate::clipboard::Clipboard;
use crate::render::Palette;
use crate::selector::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Copy,
    Edit,
    Back,
}

impl Action {
    const ALL: [Action; 3] = [Action::Copy, Action::Edit, Action::Back];

    fn label(&self) -> &'static str {
        match self {
            Action::Copy => "Copy to clipboard",
            Action::Edit => "Edit",
            Action::Back => "Back to sections",
        }
    }
}

/// Run the picker until the user quits. Each action completes before the
/// next prompt is shown.
pub fn run(selector: &mut Selector<'_>, clipboard: &dyn Clipboard, palette: &Palette) -> Result<()> {
    let theme = ColorfulTheme::default();
    let term = Term::stdout();

    loop {
        let names = selector.names();
        let mut items: Vec<&str> = names.clone();
        items.push("Quit");

        let choice = Select::with_theme(&theme)
            .with_prompt("Template section")
            .items(&items)
            .default(selector.selected().unwrap_or(0))
            .interact_opt()?;
        let Some(index) = choice.filter(|&i| i < names.len()) else {
            return Ok(());
        };

        let output = selector.select(index)?;
        term.write_line("")?;
        term.write_line(&palette.heading.apply_to(names[index]).to_string())?;
        term.write_line(&output.styled(palette))?;
        term.write_line("")?;

        loop {
            let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
            let Some(picked) = Select::with_theme(&theme)
                .with_prompt("Action")
                .items(&labels)
                .default(0)
                .interact_opt()?
            else {
                break;
            };

            match Action::ALL[picked] {
                Action::Copy => match selector.copy(clipboard) {
                    Ok(()) => term.write_line("Copied.")?,
                    Err(e) => {
                        warn!("Copy failed: {:#}", e);
                        term.write_line(&format!("Copy failed: {:#}", e))?;
                    }
                },
                Action::Edit => {
                    if let Some(edited) = Editor::new().edit(selector.surface())? {
                        selector.edit(edited.strip_suffix('\n').unwrap_or(&edited));
                        term.write_line(selector.surface())?;
                    }
                }
                Action::Back => break,
            }
        }
    }
}
