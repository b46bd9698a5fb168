//! Shared process helpers

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::Duration;

/// Kill a process by PID. Uses SIGKILL on Unix (Linux, macOS, WSL).
#[cfg(unix)]
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_process(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Spawn `cmd`, write `input` to its stdin, close it, and wait up to
/// `timeout` for the direct child to exit. On timeout the child is killed
/// and an error returned.
///
/// Output is discarded: clipboard helpers such as `xclip` and `wl-copy`
/// fork a daemon that would otherwise hold captured pipes open.
///
/// A spawn failure is returned with its `std::io::Error` as the root cause
/// so callers can tell a missing program apart from a failing one.
pub fn pipe_to_command(mut cmd: Command, input: &str, timeout: Duration) -> Result<ExitStatus> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to spawn command")?;

    if let Some(mut stdin) = child.stdin.take() {
        // A child that exits without reading is reported by its exit status.
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e).context("Failed to write to command stdin");
            }
        }
    }

    let pid = child.id();
    let (sender, receiver) = mpsc::channel();

    std::thread::spawn(move || {
        let result = child.wait();
        let _ = sender.send(result);
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result.context("Failed to wait for command"),
        Err(_) => {
            kill_process(pid);
            bail!("Command timed out after {:?}", timeout)
        }
    }
}

/// True when the error chain bottoms out in "program not found".
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}
