use anyhow::{bail, Context, Result};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

use crate::util::{is_not_found, pipe_to_command};

const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Tried in order when no clipboard command is configured
const CANDIDATES: &[&[&str]] = &[
    &["pbcopy"],
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "--clipboard", "--input"],
    &["clip"],
];

pub trait Clipboard {
    fn copy(&self, text: &str) -> Result<()>;
}

/// Clipboard backed by an external program reading from stdin.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    /// `None` means auto-detect from [`CANDIDATES`]
    command: Option<Vec<String>>,
}

impl CommandClipboard {
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self {
            command: command.filter(|c| !c.is_empty()),
        }
    }

    fn run(argv: &[&str], text: &str) -> Result<()> {
        let (program, args) = argv.split_first().context("Empty clipboard command")?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        let status = pipe_to_command(cmd, text, CLIPBOARD_TIMEOUT)?;
        if !status.success() {
            bail!("{} exited with {}", program, status);
        }
        debug!("Copied {} bytes with {}", text.len(), program);
        Ok(())
    }
}

impl Clipboard for CommandClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        if let Some(command) = &self.command {
            let argv: Vec<&str> = command.iter().map(String::as_str).collect();
            return Self::run(&argv, text);
        }

        for argv in CANDIDATES {
            match Self::run(argv, text) {
                Ok(()) => return Ok(()),
                Err(e) if is_not_found(&e) => continue,
                Err(e) => return Err(e),
            }
        }
        bail!(
            "No clipboard program found. Set [clipboard] command in the config, e.g. command = [\"xclip\", \"-selection\", \"clipboard\"]"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_means_autodetect() {
        let clipboard = CommandClipboard::new(Some(Vec::new()));
        assert!(clipboard.command.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_command_runs() {
        let clipboard = CommandClipboard::new(Some(vec!["cat".to_string()]));
        assert!(clipboard.copy("reply text").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_configured_command_failure() {
        let clipboard = CommandClipboard::new(Some(vec!["false".to_string()]));
        let err = clipboard.copy("reply text").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn test_configured_missing_program() {
        let clipboard =
            CommandClipboard::new(Some(vec!["name-retention-missing-clipboard".to_string()]));
        assert!(clipboard.copy("x").is_err());
    }

    /// `xclip` and `wl-copy` keep a background process serving the selection.
    #[cfg(unix)]
    #[test]
    fn test_forking_clipboard_program() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("clip.txt");
        let script = format!("cat > '{}'; sleep 8 & exit 0", target.display());
        let clipboard = CommandClipboard::new(Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            script,
        ]));

        let started = std::time::Instant::now();
        clipboard.copy("reply text").unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "reply text");
    }
}
