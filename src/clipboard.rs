//! Clipboard integration via platform copy tools.
//!
//! The text is piped to the first available tool among `pbcopy` (macOS),
//! `wl-copy` (Wayland), `xclip`/`xsel` (X11) and `clip` (Windows).

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Copy tools in order of preference, with their arguments.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `input` on stdin; returns whether it exited successfully.
    fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<bool>;

    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Default process runner using std::process::Command.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run_with_input(&self, program: &str, args: &[&str], input: &str) -> Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", program))?;

        // Scoped so stdin is closed before waiting.
        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| anyhow!("Failed to open stdin of {}", program))?;
            stdin.write_all(input.as_bytes())?;
        }

        Ok(child.wait()?.success())
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

// =============================================================================
// Clipboard
// =============================================================================

pub struct ClipboardManager {
    runner: Box<dyn ProcessRunner>,
}

impl ClipboardManager {
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemProcessRunner))
    }

    /// Creates a manager with a custom process runner (for testing).
    pub fn with_runner(runner: Box<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Name of the copy tool that would be used, if any is installed.
    pub fn available_tool(&self) -> Option<&'static str> {
        CLIPBOARD_TOOLS
            .iter()
            .find(|(program, _)| self.runner.program_exists(program))
            .map(|(program, _)| *program)
    }

    /// Copies `text` to the clipboard.
    ///
    /// # Errors
    ///
    /// Returns an error if no copy tool is installed or the tool fails.
    pub fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let (program, args) = CLIPBOARD_TOOLS
            .iter()
            .find(|(program, _)| self.runner.program_exists(program))
            .ok_or_else(|| anyhow!("No clipboard tool found (install xclip, xsel or wl-clipboard)"))?;

        debug!("Copying {} bytes with {}", text.len(), program);

        if self.runner.run_with_input(program, args, text)? {
            Ok(())
        } else {
            warn!("{} exited with an error", program);
            Err(anyhow!("{} failed to copy to clipboard", program))
        }
    }
}

impl Default for ClipboardManager {
    fn default() -> Self {
        Self::new()
    }
}
