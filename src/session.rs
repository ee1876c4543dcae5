//! Interactive prompt-enhancement session.
//!
//! Reads prompts, routes slash commands, runs enhancements and offers to copy
//! results to the clipboard. Configuration changes made here (setup wizard,
//! style menu) are saved and picked up by the next enhancement.

use crate::clipboard::ClipboardManager;
use crate::config::{ConfigSource, SharedConfig};
use crate::enhancer::Enhancer;
use crate::error::Error;
use crate::language_detector::LanguageDetector;
use crate::ui::{ProviderChoice, Ui};
use anyhow::Result;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Routes Ctrl-C presses: one arriving while an enhancement runs cancels it,
/// any other ends the process.
#[derive(Clone, Default)]
pub struct Interrupt {
    notify: Arc<Notify>,
    waiting: Arc<AtomicBool>,
}

impl Interrupt {
    /// An interrupt that only fires through [`Interrupt::trigger`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens for Ctrl-C for the rest of the process.
    ///
    /// Installing the handler replaces the default SIGINT action, so presses
    /// outside an enhancement exit here instead.
    pub fn listen_for_ctrl_c() -> Self {
        let interrupt = Self::new();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !handle.trigger() {
                    println!("\nGoodbye!");
                    std::process::exit(0);
                }
            }
        });
        interrupt
    }

    /// Delivers one press. Returns false when nothing was running to cancel.
    pub fn trigger(&self) -> bool {
        if self.waiting.load(Ordering::SeqCst) {
            self.notify.notify_waiters();
            true
        } else {
            false
        }
    }

    /// Runs `future` to completion unless a press arrives first.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        self.waiting.store(true, Ordering::SeqCst);
        let result = tokio::select! {
            output = future => Some(output),
            _ = notified => None,
        };
        self.waiting.store(false, Ordering::SeqCst);
        result
    }
}

/// What a line of user input asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Quit,
    Config,
    Style,
    Enhance(String),
}

impl SessionCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "/quit" | "quit" => SessionCommand::Quit,
            "/config" | "config" => SessionCommand::Config,
            "/style" => SessionCommand::Style,
            _ => SessionCommand::Enhance(trimmed.to_string()),
        }
    }
}

pub struct Session {
    config: SharedConfig,
    config_path: PathBuf,
    enhancer: Enhancer,
    clipboard: ClipboardManager,
    language_detector: LanguageDetector,
    ui: Ui,
    interrupt: Interrupt,
    offer_copy: bool,
}

impl Session {
    pub fn new(
        config: SharedConfig,
        config_path: PathBuf,
        enhancer: Enhancer,
        clipboard: ClipboardManager,
        language_detector: LanguageDetector,
        ui: Ui,
    ) -> Self {
        Self {
            config,
            config_path,
            enhancer,
            clipboard,
            language_detector,
            ui,
            interrupt: Interrupt::new(),
            offer_copy: true,
        }
    }

    /// Uses `interrupt` to cancel running enhancements.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Disables the "copy to clipboard" question after each enhancement.
    pub fn without_copy(mut self) -> Self {
        self.offer_copy = false;
        self
    }

    /// Runs the session on stdin/stdout.
    pub async fn run(&self, first_run: bool) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        self.run_with_io(first_run, &mut input, &mut output).await
    }

    /// Runs the session until `/quit` or end of input.
    ///
    /// On `first_run` the setup wizard is shown before anything else.
    pub async fn run_with_io<R: BufRead, W: Write>(&self, first_run: bool, input: &mut R, output: &mut W) -> Result<()> {
        if first_run {
            self.ui.show_initial_setup_with_io(output)?;
            if !self.configure_with_io(input, output)? {
                return Ok(());
            }
        }

        let language = self.language_detector.detect_language();
        self.ui.show_welcome_with_io(&self.config.snapshot(), language, output)?;

        loop {
            if !self.config.snapshot().is_configured() {
                writeln!(output, "⚠ Configuration incomplete")?;
                if !self.configure_with_io(input, output)? {
                    break;
                }
            }

            let style = self.config.snapshot().current_style;
            let Some(text) = self.ui.read_prompt_with_io(style, input, output)? else {
                break;
            };

            match SessionCommand::parse(&text) {
                SessionCommand::Quit => break,
                SessionCommand::Config => {
                    self.configure_with_io(input, output)?;
                }
                SessionCommand::Style => self.select_style_with_io(input, output)?,
                SessionCommand::Enhance(prompt) => self.enhance_with_io(&prompt, input, output).await?,
            }
        }

        writeln!(output, "\nGoodbye!")?;
        Ok(())
    }

    async fn enhance_with_io<R: BufRead, W: Write>(&self, prompt: &str, input: &mut R, output: &mut W) -> Result<()> {
        let style = self.config.snapshot().current_style;
        writeln!(output, "Enhancing prompt ({})...", style.style().name)?;
        output.flush()?;

        let enhanced = match self.enhance_cancellable(prompt).await {
            Some(Ok(enhanced)) => enhanced,
            Some(Err(err)) => {
                warn!("Enhancement failed: {}", err);
                writeln!(output, "✗ Enhancement failed: {}", err)?;
                if err.is_configuration() {
                    writeln!(output, "  Run /config to update your settings.")?;
                }
                return Ok(());
            }
            None => {
                writeln!(output, "Enhancement cancelled")?;
                return Ok(());
            }
        };

        self.ui.show_enhanced_with_io(style, &enhanced, output)?;

        if self.offer_copy && self.ui.confirm_with_io("Copy enhanced prompt to clipboard?", true, input, output)? {
            match self.clipboard.copy_to_clipboard(&enhanced) {
                Ok(()) => writeln!(output, "✓ Copied to clipboard!")?,
                Err(err) => writeln!(output, "✗ Failed to copy to clipboard: {}", err)?,
            }
        }

        writeln!(output, "\n{}\n", "─".repeat(50))?;
        Ok(())
    }

    /// Runs one enhancement; `None` if the user pressed Ctrl-C meanwhile.
    async fn enhance_cancellable(&self, prompt: &str) -> Option<Result<String, Error>> {
        let language_context = self.language_detector.get_language_context();
        let result = self
            .interrupt
            .run(self.enhancer.enhance(prompt, language_context.as_deref()))
            .await;
        if result.is_none() {
            info!("Enhancement interrupted by user");
        }
        result
    }

    fn select_style_with_io<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<()> {
        let current = self.config.snapshot().current_style;
        let Some(style) = self.ui.select_style_with_io(current, input, output)? else {
            return Ok(());
        };

        self.config.update(|c| c.current_style = style);
        self.config.update_overrides(|o| o.style = None);
        self.config.persisted().save_to(&self.config_path)?;
        writeln!(output, "✓ Style changed to: {}", style.style().name)?;
        Ok(())
    }

    /// Runs the setup wizard. Returns whether a new configuration was saved.
    pub fn configure_with_io<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<bool> {
        writeln!(output, "\nConfiguration:")?;
        writeln!(output, "\nStep 1: Choose Provider")?;

        let Some(choice) = self.ui.select_provider_with_io(input, output)? else {
            writeln!(output, "Configuration cancelled")?;
            return Ok(false);
        };

        let mut draft = self.config.persisted();
        match choice {
            ProviderChoice::Named(provider) => {
                draft.use_provider(provider);
                writeln!(output, "✓ Using {} provider", provider)?;
            }
            ProviderChoice::Custom => {
                writeln!(output, "\nCustom Provider Configuration")?;
                let Some(base_url) = self.required_answer("Enter base URL: ", "Base URL", input, output)? else {
                    return Ok(false);
                };
                writeln!(output, "✓ Using custom URL: {}", base_url)?;
                draft.use_base_url(base_url);
            }
        }

        writeln!(output, "\nStep 2: API Key")?;
        let Some(api_key) = self.required_answer("Enter your API key: ", "API key", input, output)? else {
            return Ok(false);
        };

        writeln!(output, "\nStep 3: Model Name")?;
        let Some(model) = self.required_answer("Enter model name: ", "Model", input, output)? else {
            return Ok(false);
        };

        draft.api_key = Some(api_key);
        draft.model = Some(model);
        draft.save_to(&self.config_path)?;
        self.config.update(|c| *c = draft.clone());
        // Answers typed here win over environment values for this session.
        self.config.update_overrides(|o| {
            o.api_key = None;
            o.model = None;
            o.base_url = None;
        });

        writeln!(output, "\n✓ Configuration saved successfully!")?;
        writeln!(
            output,
            "Provider: {}",
            draft.provider.map_or("Custom".to_string(), |p| p.to_string())
        )?;
        writeln!(output, "Base URL: {}", draft.get_base_url().unwrap_or_default())?;
        writeln!(output, "Model: {}", draft.model.as_deref().unwrap_or_default())?;
        Ok(true)
    }

    fn required_answer<R: BufRead, W: Write>(
        &self,
        question: &str,
        label: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<String>> {
        match self.ui.ask_with_io(question, input, output)? {
            Some(answer) if !answer.is_empty() => Ok(Some(answer)),
            _ => {
                writeln!(output, "✗ {} is required", label)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ProcessRunner;
    use crate::config::{Config, Provider, RuntimeOverrides};
    use crate::dispatcher::Dispatcher;
    use crate::http_client::{HttpClient, HttpResponse};
    use crate::styles::StyleKey;
    use async_trait::async_trait;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, TempDir};

    struct CannedHttpClient {
        status: u16,
        body: serde_json::Value,
    }

    #[async_trait]
    impl HttpClient for CannedHttpClient {
        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _body: &serde_json::Value,
        ) -> anyhow::Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }

    /// Never answers, like a provider that hangs.
    struct HangingHttpClient;

    #[async_trait]
    impl HttpClient for HangingHttpClient {
        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _body: &serde_json::Value,
        ) -> anyhow::Result<HttpResponse> {
            std::future::pending().await
        }
    }

    struct RecordingRunner {
        copied: Arc<Mutex<Vec<String>>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run_with_input(&self, _program: &str, _args: &[&str], input: &str) -> anyhow::Result<bool> {
            self.copied.lock().unwrap().push(input.to_string());
            Ok(true)
        }

        fn program_exists(&self, program: &str) -> bool {
            program == "xclip"
        }
    }

    struct Fixture {
        session: Session,
        config: SharedConfig,
        copied: Arc<Mutex<Vec<String>>>,
        dir: TempDir,
    }

    fn fixture(config: Config, status: u16, body: serde_json::Value) -> Fixture {
        fixture_with(SharedConfig::new(config), Arc::new(CannedHttpClient { status, body }))
    }

    fn fixture_with(shared: SharedConfig, http: Arc<dyn HttpClient>) -> Fixture {
        let dir = tempdir().unwrap();
        let copied = Arc::new(Mutex::new(Vec::new()));

        let enhancer = Enhancer::new(Arc::new(shared.clone()), Dispatcher::new(http));
        let clipboard = ClipboardManager::with_runner(Box::new(RecordingRunner { copied: copied.clone() }));

        let session = Session::new(
            shared.clone(),
            dir.path().join("config.toml"),
            enhancer,
            clipboard,
            LanguageDetector::for_dir(dir.path()),
            Ui::new(false),
        );

        Fixture {
            session,
            config: shared,
            copied,
            dir,
        }
    }

    fn configured() -> Config {
        Config {
            provider: Some(Provider::OpenAI),
            api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o".to_string()),
            ..Config::default()
        }
    }

    fn ok_body(text: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"content": text}}]})
    }

    async fn run(fixture: &Fixture, first_run: bool, script: &str) -> String {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        fixture
            .session
            .run_with_io(first_run, &mut input, &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(SessionCommand::parse("/quit"), SessionCommand::Quit);
        assert_eq!(SessionCommand::parse(" QUIT "), SessionCommand::Quit);
        assert_eq!(SessionCommand::parse("/config"), SessionCommand::Config);
        assert_eq!(SessionCommand::parse("config"), SessionCommand::Config);
        assert_eq!(SessionCommand::parse("/style"), SessionCommand::Style);
        assert_eq!(
            SessionCommand::parse("  style my essay  "),
            SessionCommand::Enhance("style my essay".to_string())
        );
    }

    #[tokio::test]
    async fn test_enhance_and_copy() {
        let fixture = fixture(configured(), 200, ok_body("  Write a sonnet about Rust.  "));

        let output = run(&fixture, false, "write poem\n\ny\n/quit\n\n").await;

        assert!(output.contains("Enhanced Prompt (Gentle)"));
        assert!(output.contains("Write a sonnet about Rust."));
        assert!(output.contains("✓ Copied to clipboard!"));
        assert!(output.contains("Goodbye!"));
        assert_eq!(*fixture.copied.lock().unwrap(), vec!["Write a sonnet about Rust.".to_string()]);
    }

    #[tokio::test]
    async fn test_declining_copy_leaves_clipboard_untouched() {
        let fixture = fixture(configured(), 200, ok_body("better"));

        run(&fixture, false, "prompt\n\nn\n").await;

        assert!(fixture.copied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_without_copy_skips_question() {
        let mut fixture = fixture(configured(), 200, ok_body("better"));
        fixture.session = fixture.session.without_copy();

        let output = run(&fixture, false, "prompt\n\n").await;

        assert!(!output.contains("Copy enhanced prompt"));
        assert!(output.contains("better"));
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_session_continues() {
        let fixture = fixture(configured(), 401, json!({"error": {"message": "Incorrect API key provided"}}));

        let output = run(&fixture, false, "prompt\n\n/quit\n\n").await;

        assert!(output.contains("✗ Enhancement failed"));
        assert!(output.contains("Incorrect API key provided"));
        assert!(output.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_style_command_changes_and_saves_style() {
        let fixture = fixture(configured(), 200, ok_body("ok"));

        let output = run(&fixture, false, "/style\n\n5\n/quit\n\n").await;

        assert!(output.contains("✓ Style changed to: Concise"));
        assert_eq!(fixture.config.snapshot().current_style, StyleKey::Concise);

        let saved = Config::load_from(&fixture.dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.current_style, StyleKey::Concise);
    }

    #[tokio::test]
    async fn test_first_run_setup_with_custom_url() {
        let fixture = fixture(Config::default(), 200, ok_body("ok"));

        let output = run(&fixture, true, "4\nhttp://localhost:11434/v1\nollama-key\nllama3\n/quit\n\n").await;

        assert!(output.contains("Welcome to PMPT CLI!"));
        assert!(output.contains("✓ Configuration saved successfully!"));
        assert!(output.contains("Provider: Custom"));

        let snapshot = fixture.config.snapshot();
        assert_eq!(snapshot.provider, None);
        assert_eq!(snapshot.get_base_url(), Some("http://localhost:11434/v1"));
        assert_eq!(snapshot.model.as_deref(), Some("llama3"));

        let saved = Config::load_from(&fixture.dir.path().join("config.toml")).unwrap();
        assert_eq!(saved, snapshot);
    }

    #[tokio::test]
    async fn test_first_run_cancelled_setup_exits() {
        let fixture = fixture(Config::default(), 200, ok_body("ok"));

        let output = run(&fixture, true, "\n").await;

        assert!(output.contains("Configuration cancelled"));
        assert!(!output.contains("Goodbye!"));
        assert!(!fixture.dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_missing_answer_aborts_setup() {
        let fixture = fixture(Config::default(), 200, ok_body("ok"));
        let mut input = Cursor::new(b"1\n\n".to_vec());
        let mut output = Vec::new();

        let saved = fixture.session.configure_with_io(&mut input, &mut output).unwrap();

        assert!(!saved);
        assert!(String::from_utf8(output).unwrap().contains("✗ API key is required"));
        assert_eq!(fixture.config.snapshot(), Config::default());
    }

    #[tokio::test]
    async fn test_incomplete_config_prompts_setup() {
        let fixture = fixture(Config::default(), 200, ok_body("ok"));

        let output = run(&fixture, false, "2\nsk-ant\nclaude-3-5-sonnet-20241022\n/quit\n\n").await;

        assert!(output.contains("⚠ Configuration incomplete"));
        assert_eq!(fixture.config.snapshot().provider, Some(Provider::Anthropic));
    }

    fn env_overrides() -> RuntimeOverrides {
        RuntimeOverrides {
            style: Some(StyleKey::Technical),
            ..RuntimeOverrides::from_lookup(|name| match name {
                "PMPT_API_KEY" => Some("sk-ENV-SECRET".to_string()),
                "PMPT_BASE_URL" => Some("http://localhost:8080/v1".to_string()),
                _ => None,
            })
        }
    }

    #[tokio::test]
    async fn test_style_change_saves_file_values_only() {
        let mut file = configured();
        file.api_key = Some("file-key".to_string());
        let shared = SharedConfig::with_overrides(file, env_overrides());
        let fixture = fixture_with(shared, Arc::new(CannedHttpClient { status: 200, body: ok_body("ok") }));

        run(&fixture, false, "/style\n\n5\n/quit\n\n").await;

        let path = fixture.dir.path().join("config.toml");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("sk-ENV-SECRET"));
        assert!(!content.contains("localhost:8080"));

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("file-key"));
        assert_eq!(saved.provider, Some(Provider::OpenAI));
        assert_eq!(saved.current_style, StyleKey::Concise);

        let snapshot = fixture.config.snapshot();
        assert_eq!(snapshot.current_style, StyleKey::Concise);
        assert_eq!(snapshot.api_key.as_deref(), Some("sk-ENV-SECRET"));
    }

    #[tokio::test]
    async fn test_style_flag_is_not_saved_by_setup() {
        let shared = SharedConfig::with_overrides(configured(), env_overrides());
        let fixture = fixture_with(shared, Arc::new(CannedHttpClient { status: 200, body: ok_body("ok") }));

        run(&fixture, false, "/config\n\n3\nsk-or\nmeta-llama/llama-3-70b\n/quit\n\n").await;

        let saved = Config::load_from(&fixture.dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.current_style, StyleKey::Gentle);
        assert_eq!(saved.api_key.as_deref(), Some("sk-or"));

        let snapshot = fixture.config.snapshot();
        assert_eq!(snapshot.provider, Some(Provider::OpenRouter));
        assert_eq!(snapshot.api_key.as_deref(), Some("sk-or"));
        assert_eq!(snapshot.current_style, StyleKey::Technical);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_enhancement_and_session_continues() {
        let interrupt = Interrupt::new();
        let mut fixture = fixture_with(SharedConfig::new(configured()), Arc::new(HangingHttpClient));
        fixture.session = fixture.session.with_interrupt(interrupt.clone());

        tokio::spawn(async move {
            while !interrupt.trigger() {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        });

        let output = run(&fixture, false, "prompt\n\n/quit\n\n").await;

        assert!(output.contains("Enhancement cancelled"));
        assert!(output.contains("Goodbye!"));
        assert!(fixture.copied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_outside_enhancement_is_not_consumed() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.trigger());

        let output = interrupt.run(async { "done" }).await;
        assert_eq!(output, Some("done"));
        assert!(!interrupt.trigger());
    }
}
