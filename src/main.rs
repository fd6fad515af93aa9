use rtw::app;
use rtw::cli;
use rtw::diff;
use rtw::events;
use rtw::exec;
use rtw::input;
use rtw::poller;
use rtw::tui;

use app::{AppConfig, AppState};
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use events::{AppEvent, EventHandler};
use input::{Action, InputContext, OverlayMode};
use poller::Poller;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::time::{Duration, Instant};

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "rtw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("rtw")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("rtw")
    } else {
        std::path::PathBuf::from("/tmp/rtw")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    // Fail fast on an unreadable or malformed report
    let report = match poller::load_report(&args.report).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut state = AppState::new(AppConfig {
        report_path: args.report.clone(),
        commits: args.commits,
        commit_url: args.commit_url,
    });
    state.poll_interval = args.interval;
    state.desktop_notify = !args.no_notify;

    // Seed the snapshot so the first reload only notifies actual changes
    diff::detect_changes(&mut state, &report);
    state.apply_report(report);
    state.last_poll = Some(Instant::now());

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Event handler
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    // Start the reload loop
    let poller_tx = tx.clone();
    let poller_path = args.report.clone();
    let poller_interval = args.interval;
    tokio::spawn(async move {
        let poller = Poller::new(poller_path, poller_interval, poller_tx);
        poller.run().await;
    });

    let result = run_app(&mut terminal, &mut state, events, &tx).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    tx: &tokio::sync::mpsc::UnboundedSender<AppEvent>,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut poll_start = Instant::now();

    loop {
        // Render
        terminal.draw(|f| tui::render::render(f, state))?;

        // Update countdown
        let elapsed = poll_start.elapsed().as_secs();
        state.next_poll_in = state.poll_interval.saturating_sub(elapsed);

        // Prune old notifications and stale errors
        state.prune_notifications();
        state.prune_error();

        // Process events
        if let Some(event) = events.next().await {
            match event {
                AppEvent::Key(key) => {
                    let ctx = InputContext {
                        has_error: state.error.is_some(),
                        is_loading: state.is_loading,
                        overlay: if state.has_tool_args_overlay() {
                            OverlayMode::ToolArgs
                        } else {
                            OverlayMode::None
                        },
                    };
                    match input::map_key(key, &ctx) {
                        Action::Quit => state.should_quit = true,
                        Action::DismissError => state.clear_error(),
                        Action::MoveUp => state.move_cursor_up(),
                        Action::MoveDown => state.move_cursor_down(),
                        Action::Toggle => state.toggle_current(),
                        Action::Collapse => state.collapse_current(),
                        Action::Refresh => {
                            state.is_loading = true;
                            poller::reload_in_background(
                                state.config.report_path.clone(),
                                tx.clone(),
                            );
                            poll_start = Instant::now();
                        }
                        Action::OpenBrowser => {
                            if let Some(url) = state.current_commit_url() {
                                tokio::spawn(async move {
                                    let _ = exec::open_in_browser(&url).await;
                                });
                            }
                        }
                        Action::ShowToolArgs => state.show_tool_args_for_current(),
                        Action::CycleFilter => state.cycle_filter(),
                        Action::QuickSelect(n) => state.quick_select(n),
                        Action::CloseOverlay => state.close_tool_args(),
                        Action::None => {}
                    }
                }
                AppEvent::Tick => {
                    if last_tick.elapsed() >= Duration::from_millis(100) {
                        state.advance_spinner();
                        last_tick = Instant::now();
                    }
                }
                AppEvent::PollResult(report) => {
                    state.is_loading = false;
                    state.clear_error();

                    let changes = diff::detect_changes(state, &report);
                    #[cfg(feature = "desktop-notify")]
                    if state.desktop_notify {
                        for change in &changes {
                            if change.is_regression() || change.is_fix() {
                                rtw::notify::send_desktop(change);
                            }
                        }
                    }
                    #[cfg(not(feature = "desktop-notify"))]
                    let _ = &changes;

                    state.apply_report(*report);
                    state.last_poll = Some(Instant::now());
                    poll_start = Instant::now();
                }
                AppEvent::Error(e) => {
                    state.is_loading = false;
                    state.set_error(e);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}
