mod command;
mod terminal_sink;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, MouseEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use crossterm::{execute, terminal};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use command::{COMMANDS, Command};
use mira_application::{Backends, ChatController, SendOutcome, VoiceOutcome};
use mira_core::audio::AudioDevice;
use mira_core::config::ClientConfig;
use mira_core::session::SelectOutcome;
use mira_infrastructure::{ConfigService, FileAudioDevice, MiraPaths, TabStateStore};
use mira_interaction::{Affordance, StartOutcome};
use terminal_sink::TerminalSink;

/// Terminal client for the MIRA portal guide assistant.
#[derive(Parser, Debug)]
#[command(name = "mira", version, about)]
struct Args {
    /// Config file (defaults to ~/.config/mira/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend origin, e.g. http://127.0.0.1:5000
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    user_id: Option<String>,

    #[arg(long)]
    license_id: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Audio clip used as the recording input instead of the microphone
    #[arg(long)]
    audio_clip: Option<PathBuf>,

    /// Log filter, e.g. "mira=debug" (RUST_LOG takes precedence)
    #[arg(long, default_value = "mira=info")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(user_id) = &self.user_id {
            config.user_id = user_id.clone();
        }
        if let Some(license_id) = &self.license_id {
            config.license_id = license_id.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.request_timeout_secs = timeout_secs;
        }
        if let Some(clip) = &self.audio_clip {
            config.audio.clip_path = Some(clip.clone());
        }
    }
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Installs a daily-rotated file logger so log lines never mix with the REPL.
fn init_logging(config: &ClientConfig, default_filter: &str) -> Result<WorkerGuard> {
    let log_dir = MiraPaths::logs_dir(config)?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, "mira.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let service = match &args.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let mut config = service
        .load()
        .with_context(|| format!("Failed to load {}", service.path().display()))?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// A configured clip wins over the microphone.
fn audio_device(config: &ClientConfig) -> Arc<dyn AudioDevice> {
    match &config.audio.clip_path {
        Some(clip) => Arc::new(FileAudioDevice::new(Some(clip.clone()))),
        None => microphone(),
    }
}

#[cfg(feature = "microphone")]
fn microphone() -> Arc<dyn AudioDevice> {
    Arc::new(mira_infrastructure::MicrophoneDevice::new())
}

#[cfg(not(feature = "microphone"))]
fn microphone() -> Arc<dyn AudioDevice> {
    Arc::new(FileAudioDevice::new(None))
}

fn notice(text: &str) {
    println!("{}", text.bright_black());
}

fn alert(text: &str) {
    println!("{}", text.red().bold());
}

fn print_help() {
    notice("Type a question to chat. Commands:");
    notice("  /new                 start a new chat");
    notice("  /sessions            list sessions");
    notice("  /open <n|id>         open a session");
    notice("  /rename <n|id> <t>   rename a session");
    notice("  /delete <n|id>       delete a session");
    notice("  /history             show the conversation again");
    notice("  /do <n>              use a suggestion or clarify shortcut");
    notice("  /view <n>            view a step image (Esc or click to close)");
    notice("  /record, /stop       record a voice message");
    notice("  /quit                exit");
}

fn print_sessions(controller: &ChatController) {
    let state = controller.state();
    if state.sessions.is_empty() {
        notice("No sessions yet.");
        return;
    }
    for (index, session) in state.sessions.iter().enumerate() {
        let marker = if state.is_active(&session.session_id) { "*" } else { " " };
        let updated = session.updated_at.as_deref().unwrap_or("");
        println!(
            "{} {} {}  {}",
            marker.bright_green(),
            format!("{:>2}.", index + 1).bold(),
            session.title,
            updated.bright_black()
        );
    }
}

/// Resolves a list position or id to a session id.
fn resolve_session(controller: &ChatController, key: &str) -> Option<String> {
    controller
        .state()
        .find_session(key)
        .map(|s| s.session_id.clone())
}

async fn wait_for_reply(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Replied { reveal, .. } => {
            reveal.finished().await;
        }
        SendOutcome::Failed { .. } | SendOutcome::Empty => {}
    }
}

/// Shows the image viewer until Escape or a click closes it.
fn run_viewer(controller: &mut ChatController) -> io::Result<()> {
    let Some(url) = controller.viewer().image().map(str::to_string) else {
        return Ok(());
    };

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(
        stdout,
        EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
        MoveTo(0, 0)
    )?;
    write!(
        stdout,
        "{}\r\n\r\n{}\r\n",
        url.bright_white().bold(),
        "Esc or click anywhere to close".bright_black()
    )?;
    stdout.flush()?;

    let restored = loop {
        let closed = match event::read()? {
            Event::Key(key) => controller.viewer_mut().handle_key(key.code),
            Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
                controller.viewer_mut().click_background()
            }
            _ => None,
        };
        if let Some(row) = closed {
            break row;
        }
    };

    execute!(
        stdout,
        crossterm::event::DisableMouseCapture,
        LeaveAlternateScreen,
        MoveTo(0, restored)
    )?;
    terminal::disable_raw_mode()?;
    tracing::debug!("[Viewer] Closed, restored row {}", restored);
    Ok(())
}

fn open_image(controller: &mut ChatController, sink: &TerminalSink, url: String) {
    if sink.is_hidden(&url) {
        notice("That image is unavailable.");
        return;
    }
    let row = crossterm::cursor::position().map(|(_, row)| row).unwrap_or(0);
    controller.activate(&Affordance::ViewImage(url), row);
    if let Err(e) = run_viewer(controller) {
        let _ = terminal::disable_raw_mode();
        controller.viewer_mut().close();
        alert(&format!("Image viewer failed: {}", e));
    }
}

/// Handles one REPL line. Returns `false` to exit.
async fn handle_line(controller: &mut ChatController, sink: &TerminalSink, line: &str) -> bool {
    match command::parse(line) {
        Command::Message(text) => {
            let outcome = controller.send(&text).await;
            wait_for_reply(outcome).await;
        }
        Command::NewChat => match controller.new_chat().await {
            Ok(()) => notice("Started a new chat."),
            Err(e) => alert(&format!("Failed to start a new chat: {}", e)),
        },
        Command::Sessions => {
            if let Err(e) = controller.refresh_sessions().await {
                alert(&format!("Failed to load sessions: {}", e));
            }
            print_sessions(controller);
        }
        Command::Open(key) => match resolve_session(controller, &key) {
            Some(session_id) => match controller.select_session(&session_id).await {
                Ok(SelectOutcome::Unchanged) => notice("Already open."),
                Ok(SelectOutcome::Selected { .. }) => {}
                Ok(SelectOutcome::NotFound) => notice("That session no longer exists."),
                Err(e) => alert(&format!("Failed to load session: {}", e)),
            },
            None => notice(&format!("No session '{}'. Try /sessions.", key)),
        },
        Command::Rename { key, title } => match resolve_session(controller, &key) {
            Some(session_id) => match controller.rename_session(&session_id, &title).await {
                Ok(()) => notice(&format!("Renamed to '{}'.", title)),
                Err(e) => alert(&format!("Failed to rename: {}", e)),
            },
            None => notice(&format!("No session '{}'. Try /sessions.", key)),
        },
        Command::Delete(key) => match resolve_session(controller, &key) {
            Some(session_id) => match controller.delete_session(&session_id).await {
                Ok(true) => notice("Deleted. Started a new chat."),
                Ok(false) => notice("Deleted."),
                Err(e) => alert(&format!("Failed to delete: {}", e)),
            },
            None => notice(&format!("No session '{}'. Try /sessions.", key)),
        },
        Command::History => {
            if controller.state().conversation.is_empty() {
                notice("Nothing here yet.");
            } else {
                controller.replay_history().await;
            }
        }
        Command::Do(position) => match controller.affordance(position).cloned() {
            Some(Affordance::ViewImage(url)) => open_image(controller, sink, url),
            Some(affordance) => {
                if let Some(text) = controller.activate(&affordance, 0) {
                    println!("{}", format!("> {}", text).green());
                    let outcome = controller.send(&text).await;
                    wait_for_reply(outcome).await;
                }
            }
            None => notice("No such action."),
        },
        Command::View(position) => {
            let url = controller
                .images()
                .get(position - 1)
                .map(|url| url.to_string());
            match url {
                Some(url) => open_image(controller, sink, url),
                None => notice("No such image."),
            }
        }
        Command::Close => {
            if controller.viewer_mut().close().is_none() {
                notice("The image viewer is not open.");
            }
        }
        Command::Record => match controller.start_recording() {
            Ok(StartOutcome::Started) => notice("Recording... type /stop to send."),
            Ok(StartOutcome::AlreadyRecording) => notice("Already recording."),
            Err(e) => alert(&format!("Microphone unavailable: {}", e)),
        },
        Command::Stop => {
            let outcome = controller.stop_recording_and_send().await;
            let _ = execute!(io::stdout(), SetTitle("mira"));
            match outcome {
                VoiceOutcome::NotRecording => notice("Not recording."),
                VoiceOutcome::NoTranscript => {}
                VoiceOutcome::Sent { outcome, .. } => wait_for_reply(outcome).await,
            }
        }
        Command::Help => print_help(),
        Command::Quit => return false,
        Command::Invalid(message) => notice(&message),
    }
    true
}

/// The main entry point for the MIRA readline REPL.
///
/// One process is one tab: it owns its own active-session pointer while
/// sharing the backend's session store with every other client.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config, &args.log_level)?;
    tracing::info!("[Main] Starting against {}", config.base_url);

    // ===== Backend Initialization =====
    let backends = Backends::http(&config)?;
    let tabs = TabStateStore::new();
    let tab = Arc::new(tabs.open_tab());
    let sink = Arc::new(TerminalSink::new());
    let audio = audio_device(&config);

    let mut controller = ChatController::new(backends, tab.clone(), audio, sink.clone(), &config)
        .with_recording_ticker(Arc::new(|elapsed: &str| {
            let _ = execute!(io::stdout(), SetTitle(format!("mira - recording {}", elapsed)));
        }));

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== MIRA ===".bright_magenta().bold());
    notice("Ask how to do something in the portal, or type /help.");
    println!();

    if let Err(e) = controller.restore_on_load().await {
        alert(&format!("Could not reach the assistant: {}", e));
    }

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if !handle_line(&mut controller, &sink, &line).await {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                alert(&format!("Error: {:?}", err));
                break;
            }
        }
    }

    tab.close().await;
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
