//! Terminal dialogs for the interactive session.
//!
//! Every dialog takes its input and output streams as parameters so it can be
//! driven from tests with in-memory buffers.

use crate::config::{Config, Provider};
use crate::styles::{Style, StyleKey};
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::info;

/// Provider choice made in the setup wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    Named(Provider),
    Custom,
}

/// Handles user-facing rendering and input collection.
pub struct Ui {
    color: bool,
}

impl Ui {
    /// Creates a new `Ui`.
    ///
    /// # Arguments
    ///
    /// * `color` - If true, style names are rendered with ANSI colors
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.color {
            format!("\x1b[1;{}m{}\x1b[0m", style.ansi_color, text)
        } else {
            text.to_string()
        }
    }

    /// Reads one line, returning `None` at end of input.
    fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    // =========================================================================
    // Prompt input
    // =========================================================================

    /// Reads a multi-line prompt terminated by an empty line.
    ///
    /// Returns `None` when input ends before anything was typed. Leading blank
    /// lines are skipped.
    pub fn read_prompt_with_io<R: BufRead, W: Write>(
        &self,
        style: StyleKey,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<String>> {
        write!(output, "{} | Your prompt: ", self.paint(style.style(), style.style().name))?;
        output.flush()?;

        let mut lines: Vec<String> = Vec::new();
        loop {
            match Self::read_line(input)? {
                None => break,
                Some(line) if line.trim().is_empty() => {
                    if !lines.is_empty() {
                        break;
                    }
                }
                Some(line) => lines.push(line),
            }
        }

        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(lines.join("\n").trim().to_string()))
    }

    // =========================================================================
    // Menus
    // =========================================================================

    /// Shows the style menu. An empty answer keeps the current style.
    pub fn select_style_with_io<R: BufRead, W: Write>(
        &self,
        current: StyleKey,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<StyleKey>> {
        writeln!(output, "\nSelect enhancement style:")?;
        for (i, key) in StyleKey::ALL.iter().enumerate() {
            let style = key.style();
            let marker = if *key == current { "*" } else { " " };
            writeln!(
                output,
                " {} {}. {} - {}",
                marker,
                i + 1,
                self.paint(style, style.name),
                style.description
            )?;
        }

        let choice = self.choose_with_io(StyleKey::ALL.len(), input, output)?;
        Ok(choice.map(|i| StyleKey::ALL[i]))
    }

    /// Shows the provider menu.
    pub fn select_provider_with_io<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<ProviderChoice>> {
        let choices: Vec<ProviderChoice> = Provider::ALL
            .into_iter()
            .map(ProviderChoice::Named)
            .chain(std::iter::once(ProviderChoice::Custom))
            .collect();

        writeln!(output, "\nSelect your AI provider:")?;
        for (i, choice) in choices.iter().enumerate() {
            let label = match choice {
                ProviderChoice::Named(provider) => provider.display_name(),
                ProviderChoice::Custom => "Custom (enter base URL)",
            };
            writeln!(output, "   {}. {}", i + 1, label)?;
        }

        let choice = self.choose_with_io(choices.len(), input, output)?;
        Ok(choice.map(|i| choices[i]))
    }

    /// Asks for a 1-based choice until a valid one is given.
    ///
    /// Returns the 0-based index, or `None` on an empty answer or end of input.
    fn choose_with_io<R: BufRead, W: Write>(
        &self,
        count: usize,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<usize>> {
        loop {
            write!(output, "\nChoose an option (1-{}): ", count)?;
            output.flush()?;

            let Some(line) = Self::read_line(input)? else {
                return Ok(None);
            };
            let choice = line.trim();
            if choice.is_empty() {
                return Ok(None);
            }

            match choice.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(output, "Invalid choice. Please enter a number from 1 to {}.", count)?,
            }
        }
    }

    // =========================================================================
    // Simple questions
    // =========================================================================

    /// Asks a free-form question; the answer is trimmed. `None` at end of input.
    pub fn ask_with_io<R: BufRead, W: Write>(
        &self,
        question: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<String>> {
        write!(output, "{}", question)?;
        output.flush()?;
        Ok(Self::read_line(input)?.map(|line| line.trim().to_string()))
    }

    /// Asks a yes/no question. An empty answer or end of input picks `default`.
    pub fn confirm_with_io<R: BufRead, W: Write>(
        &self,
        question: &str,
        default: bool,
        input: &mut R,
        output: &mut W,
    ) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            write!(output, "{} {} ", question, hint)?;
            output.flush()?;

            let Some(line) = Self::read_line(input)? else {
                return Ok(default);
            };
            match line.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(output, "Please answer y or n.")?,
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn show_welcome_with_io<W: Write>(
        &self,
        config: &Config,
        language: Option<&str>,
        output: &mut W,
    ) -> Result<()> {
        let style = config.current_style.style();
        let model = config.model.as_deref().unwrap_or("not set");
        let mut subtitle = match config.provider {
            Some(provider) => format!("Provider: {} | Model: {} | Style: {}", provider, model, style.name),
            None => format!(
                "Base URL: {} | Model: {} | Style: {}",
                config.get_base_url().unwrap_or("not set"),
                model,
                style.name
            ),
        };
        if let Some(language) = language {
            subtitle.push_str(&format!(" | Language: {}", crate::language_detector::title_case(language)));
        }

        writeln!(output, "{}", "=".repeat(60))?;
        writeln!(output, "🚀 PMPT CLI")?;
        writeln!(output, "{}", subtitle)?;
        writeln!(output, "{}", "-".repeat(60))?;
        writeln!(output, "How to use:")?;
        writeln!(output, "  • Enter your prompt and get an enhanced version")?;
        writeln!(output, "  • Finish the prompt with an empty line")?;
        writeln!(output)?;
        writeln!(output, "Available commands:")?;
        writeln!(output, "  • /config - Settings")?;
        writeln!(output, "  • /style  - Change enhancement style")?;
        writeln!(output, "  • /quit   - Exit application")?;
        writeln!(output, "{}", "=".repeat(60))?;
        writeln!(output)?;
        Ok(())
    }

    pub fn show_initial_setup_with_io<W: Write>(&self, output: &mut W) -> Result<()> {
        writeln!(output, "{}", "=".repeat(60))?;
        writeln!(output, "Welcome to PMPT CLI!")?;
        writeln!(output)?;
        writeln!(output, "This is your first time running the tool.")?;
        writeln!(output, "Let's set up your AI provider configuration.")?;
        writeln!(output)?;
        writeln!(output, "You'll need to provide:")?;
        writeln!(output, "  • API key for your chosen provider")?;
        writeln!(output, "  • Provider name (openai, anthropic, openrouter) or custom base URL")?;
        writeln!(output, "  • Model name (e.g., gpt-4o, claude-3-5-sonnet-20241022)")?;
        writeln!(output, "{}", "=".repeat(60))?;
        Ok(())
    }

    pub fn show_enhanced_with_io<W: Write>(&self, style: StyleKey, enhanced: &str, output: &mut W) -> Result<()> {
        let style = style.style();
        writeln!(output)?;
        writeln!(output, "── Enhanced Prompt ({}) {}", self.paint(style, style.name), "─".repeat(30))?;
        writeln!(output, "{}", enhanced)?;
        writeln!(output, "{}", "─".repeat(50))?;
        info!("Displayed enhanced prompt ({} chars)", enhanced.len());
        Ok(())
    }
}
