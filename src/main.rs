use askshell::config::load_dotenv;
use askshell::llm::{GeminiClient, Translator};
use askshell::session::{SessionEvent, TranslationWorker};
use askshell::ui::{App, Console};
use askshell::{
    AppError, AppResult, AuditLogger, Config, SafetyEvaluator, Session, SessionOptions,
    ShellExecutor,
};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Ask for a PowerShell command in plain language, review it, then run it
#[derive(Parser, Debug)]
#[command(name = "askshell", version, about)]
struct Args {
    /// Request to translate; omit it for an interactive prompt
    prompt: Option<String>,

    /// Refuse commands the safety policy blocks (overrides the config)
    #[arg(long, conflicts_with = "unsafe_mode")]
    safe: bool,

    /// Run commands even when the safety policy would block them
    #[arg(long = "unsafe")]
    unsafe_mode: bool,

    /// Show what would run without executing or logging anything
    #[arg(long)]
    dry_run: bool,

    /// Full-screen terminal interface
    #[arg(long, conflicts_with = "prompt")]
    tui: bool,

    /// Configuration file (default: <config dir>/askshell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command log file (overrides the config)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.tui);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(tui: bool) {
    // Keep log lines off the alternate screen unless asked for
    let default_directive = if tui { "askshell=error" } else { "askshell=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> AppResult<()> {
    if let Some(path) = load_dotenv() {
        debug!(path = %path.display(), "loaded environment file");
    }

    let config = Config::load_or_default(args.config.as_deref())?;

    let api_key = config
        .get_api_key()
        .ok_or_else(|| AppError::MissingCredential(config.llm.api_key_env.clone()))?;

    let session = build_session(&config, &args);

    let client = GeminiClient::with_model(api_key, config.llm.model.clone())?;
    let translator = Arc::new(Translator::new(Box::new(client)).with_timeout(config.llm_timeout()));
    let (worker, events) = TranslationWorker::new(translator);

    if args.tui {
        return run_tui(session, worker, events).await;
    }

    let mut console = Console::new(session, worker, events, io::stdin().lock(), io::stdout());
    match args.prompt {
        Some(prompt) => console.handle_request(&prompt).await?,
        None => console.run_interactive().await?,
    }

    Ok(())
}

fn build_session(config: &Config, args: &Args) -> Session {
    let options = SessionOptions {
        safe_mode: if args.safe {
            true
        } else if args.unsafe_mode {
            false
        } else {
            config.behavior.safe_mode
        },
        dry_run: args.dry_run || config.behavior.dry_run,
    };
    if !options.safe_mode {
        warn!("safe mode is off; blocked commands will still run");
    }

    let interpreter = config.interpreter();
    if let Err(e) = interpreter.resolve() {
        warn!(error = %e, "commands will fail until the interpreter is installed");
    }
    let executor = ShellExecutor::new(interpreter).with_timeout(config.shell_timeout());

    let audit = if config.behavior.log_commands {
        let path = args.log_file.clone().or_else(|| config.audit_log_path());
        if path.is_none() {
            warn!("no location for the command log; logging disabled");
        }
        path.map(AuditLogger::with_path)
    } else {
        None
    };

    let evaluator = SafetyEvaluator::new(Arc::new(config.safety_policy()));
    Session::new(evaluator, executor, audit, options)
}

async fn run_tui(
    session: Session,
    worker: TranslationWorker,
    events: UnboundedReceiver<SessionEvent>,
) -> AppResult<()> {
    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, worker, events);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(result?)
}
