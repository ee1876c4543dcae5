use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use pmpt::clipboard::ClipboardManager;
use pmpt::config::{Config, ConfigSource, RuntimeOverrides, SharedConfig};
use pmpt::enhancer::Enhancer;
use pmpt::language_detector::LanguageDetector;
use pmpt::session::{Interrupt, Session};
use pmpt::styles::StyleKey;
use pmpt::ui::Ui;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with the enhanced prompt.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("PMPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("pmpt")
        .about("Enhance prompts with your favourite AI provider")
        .long_about("pmpt sends your prompt to an OpenAI-compatible or Anthropic-compatible API together with a style instruction and returns an improved version of it")
        .arg(Arg::new("prompt")
            .help("Prompt to enhance once; starts an interactive session when omitted")
            .num_args(1..))
        .arg(Arg::new("style")
            .long("style")
            .short('s')
            .help("Enhancement style to use for this run")
            .value_name("STYLE")
            .value_parser(StyleKey::ALL.map(|s| s.key())))
        .arg(Arg::new("no-copy")
            .long("no-copy")
            .help("Never copy the enhanced prompt to the clipboard")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("setup")
            .long("setup")
            .help("Run the provider setup wizard")
            .action(ArgAction::SetTrue))
        .get_matches();

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(());
    }

    let first_run = !Config::config_file_exists();
    let mut overrides = RuntimeOverrides::from_env();
    overrides.style = matches.get_one::<String>("style").and_then(|s| StyleKey::from_key(s));

    let shared = SharedConfig::with_overrides(Config::load_file()?, overrides);
    let enhancer = Enhancer::with_default_transport(Arc::new(shared.clone()))?;
    let language_detector = LanguageDetector::new();
    let no_copy = matches.get_flag("no-copy");

    let prompt_args: Vec<String> = matches
        .get_many::<String>("prompt")
        .unwrap_or_default()
        .map(|s| s.to_string())
        .collect();

    if !prompt_args.is_empty() {
        let prompt = prompt_args.join(" ");
        return enhance_once(&enhancer, &shared, &language_detector, &prompt, no_copy).await;
    }

    let session = Session::new(
        shared,
        Config::get_config_path()?,
        enhancer,
        ClipboardManager::new(),
        language_detector,
        Ui::new(io::stdout().is_terminal()),
    );
    let session = if no_copy { session.without_copy() } else { session };
    let session = session.with_interrupt(Interrupt::listen_for_ctrl_c());

    if matches.get_flag("setup") {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        session.configure_with_io(&mut input, &mut io::stdout())?;
        return Ok(());
    }

    info!("Starting interactive session");
    session.run(first_run).await
}

/// Enhances a single prompt and prints it to stdout.
async fn enhance_once(
    enhancer: &Enhancer,
    config: &SharedConfig,
    language_detector: &LanguageDetector,
    prompt: &str,
    no_copy: bool,
) -> Result<()> {
    if !config.snapshot().is_configured() {
        return Err(anyhow!("pmpt is not configured. Run 'pmpt --setup' first."));
    }

    let language_context = language_detector.get_language_context();
    let enhanced = enhancer.enhance(prompt, language_context.as_deref()).await?;
    println!("{}", enhanced);

    if !no_copy {
        if let Err(err) = ClipboardManager::new().copy_to_clipboard(&enhanced) {
            eprintln!("✗ Failed to copy to clipboard: {}", err);
        }
    }
    Ok(())
}
