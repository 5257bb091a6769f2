//! Clipboard integration utilities.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;

use crate::domain::errors::ClipboardError;
use crate::domain::model::CopyMethod;

/// Destination for caught widget text.
pub trait ClipboardSink {
    /// Write `text` verbatim. Reports which route accepted it.
    fn copy(&mut self, text: &str) -> Result<CopyMethod, ClipboardError>;
}

/// Cross-platform clipboard helper with fallbacks for headless environments.
pub struct Clipboard {
    primary: Option<arboard::Clipboard>,
    use_fallback_commands: bool,
}

impl Clipboard {
    /// Attempt to initialize the system clipboard. When unavailable we fall back to shell-based
    /// clipboard utilities.
    pub fn new() -> Self {
        let primary = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable");
                None
            }
        };
        Self {
            primary,
            use_fallback_commands: true,
        }
    }

    /// Enable or disable the shell utility fallback.
    pub fn with_fallback_commands(mut self, enabled: bool) -> Self {
        self.use_fallback_commands = enabled;
        self
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardSink for Clipboard {
    fn copy(&mut self, text: &str) -> Result<CopyMethod, ClipboardError> {
        let mut attempts = Vec::new();

        if let Some(primary) = self.primary.as_mut() {
            match primary.set_text(text.to_owned()) {
                Ok(()) => {
                    tracing::debug!("widget copied to clipboard");
                    return Ok(CopyMethod::Primary);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to copy to system clipboard");
                    attempts.push(format!("arboard: {err}"));
                }
            }
        }

        self.primary = None;
        if !self.use_fallback_commands {
            return Err(ClipboardError { attempts });
        }

        if fallback_copy(&fallback_commands(), text, &mut attempts) {
            tracing::info!("widget copied using fallback method");
            Ok(CopyMethod::Fallback)
        } else {
            tracing::error!(?attempts, "fallback copy methods also failed");
            Err(ClipboardError { attempts })
        }
    }
}

/// In-process clipboard that records every write. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    writes: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that rejects every write.
    pub fn failing() -> Self {
        Self {
            writes: Arc::default(),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.writes.lock().last().cloned()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn copy(&mut self, text: &str) -> Result<CopyMethod, ClipboardError> {
        if self.fail {
            return Err(ClipboardError {
                attempts: vec!["memory: rejected".into()],
            });
        }
        self.writes.lock().push(text.to_owned());
        Ok(CopyMethod::Primary)
    }
}

/// Try each command in order. Every failure is appended to `attempts`.
fn fallback_copy(commands: &[&[&str]], text: &str, attempts: &mut Vec<String>) -> bool {
    for command in commands {
        match try_command_copy(command, text) {
            Ok(()) => return true,
            Err(err) => {
                let program = command.first().copied().unwrap_or("<empty>");
                tracing::debug!(program, error = %err, "clipboard command failed");
                attempts.push(format!("{program}: {err:#}"));
            }
        }
    }
    false
}

fn try_command_copy(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    // Close stdin before waiting so the tool sees EOF.
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["xclip", "-selection", "clipboard"], &["wl-copy"]]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}
