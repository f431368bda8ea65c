// File: ./src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod network;
pub mod state;
pub mod view;

use crate::client::ApiClient;
use crate::config::Config;
use crate::context::SharedContext;
use crate::logging;
use crate::model::Role;
use crate::session::{Session, SessionStore};
use crate::tui::action::{Action, Screen};
use crate::tui::state::AppState;
use crate::tui::view::draw;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rpassword::prompt_password;
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::sync::mpsc;

const LOGIN_ATTEMPTS: usize = 3;

fn ask(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Interactive first-run setup. Writes the new config before returning it.
pub fn onboarding(ctx: &SharedContext) -> Result<Config> {
    println!("Welcome to Tablero. No configuration file found.");
    println!("Let's connect to your course server.\n");

    let mut config = Config::default();

    let url = ask(&format!("API URL [{}]: ", config.api_url))?;
    if !url.is_empty() {
        config.api_url = url;
    }
    config.username = ask("Username: ")?;

    let role = ask("Are you a [s]tudent or a [t]eacher? [s]: ")?;
    config.role = if role.eq_ignore_ascii_case("t") || role.eq_ignore_ascii_case("teacher") {
        Role::Teacher
    } else {
        Role::Student
    };

    let insecure = ask("Allow insecure SSL certificates? (y/N): ")?;
    config.allow_insecure_certs = insecure.eq_ignore_ascii_case("y");

    if let Err(e) = config.save(ctx.as_ref()) {
        eprintln!("Warning: Could not save config file: {}", e);
    } else if let Ok(path) = Config::get_path_string(ctx.as_ref()) {
        println!("Configuration saved to: {}", path);
    }
    Ok(config)
}

/// Loads the config, running onboarding when there is none. A broken config
/// is an error, not a reason to start over.
pub fn load_or_onboard(ctx: &SharedContext) -> Result<Config> {
    match Config::load(ctx.as_ref()) {
        Ok(c) => Ok(c),
        Err(e) if Config::is_missing_config_error(&e) => onboarding(ctx),
        Err(e) => Err(e.context("Error loading configuration")),
    }
}

pub fn open_session(ctx: &SharedContext, config: &Config) -> Result<SessionStore> {
    if config.remember_session {
        SessionStore::persistent(ctx.as_ref())
    } else {
        Ok(SessionStore::in_memory())
    }
}

/// Asks for a password (and the username when the config has none) and logs in.
pub async fn prompt_login(client: &ApiClient, config: &Config) -> Result<Session> {
    println!("Logging in to {} as a {}.", client.base_url(), config.role);
    let username = if config.username.is_empty() {
        ask("Username: ")?
    } else {
        config.username.clone()
    };

    let mut last_error = None;
    for _ in 0..LOGIN_ATTEMPTS {
        let password = prompt_password(format!("Password for {}: ", username))?;
        match client.login(Some(config.role), &username, &password).await {
            Ok(session) => return Ok(session),
            Err(e) => {
                eprintln!("Login failed: {}", e.user_message());
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => Err(anyhow::Error::new(e)
            .context(format!("Giving up after {} attempts", LOGIN_ATTEMPTS))),
        None => anyhow::bail!("No login attempt made"),
    }
}

pub async fn run(ctx: SharedContext) -> Result<()> {
    // --- 1. PREAMBLE & CONFIG ---
    let panic_log = ctx.get_data_dir()?.join("panic.log");
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&panic_log)
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    let cfg = load_or_onboard(&ctx)?;
    if let Err(e) = logging::init(ctx.as_ref(), &cfg.log_level) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let session = open_session(&ctx, &cfg)?;
    let client = ApiClient::from_config(&cfg, session.clone())
        .with_context(|| format!("Cannot use API URL '{}'", cfg.api_url))?;
    if !session.is_authenticated() {
        prompt_login(&client, &cfg).await?;
    }
    let default_board = cfg.default_board;

    // --- 2. TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- 3. STATE INIT ---
    let mut app_state = AppState::new(ctx.clone(), cfg, session);

    let (action_tx, action_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(32);

    // --- 4. NETWORK TASK ---
    tokio::spawn(network::run_network_actor(client, action_rx, event_tx));

    let _ = action_tx.send(Action::LoadBoards).await;
    if let Some(id) = default_board {
        app_state.board.begin_load(id);
        app_state.screen = Screen::Board;
        let _ = action_tx.send(Action::LoadBoard(id)).await;
    }

    // --- 5. UI LOOP ---
    loop {
        terminal.draw(|f| draw(f, &mut app_state))?;

        // A. Network Events
        while let Ok(event) = event_rx.try_recv() {
            if let Some(follow_up) = handlers::handle_app_event(&mut app_state, event) {
                let _ = action_tx.send(follow_up).await;
            }
        }

        // B. Input Events
        if crossterm::event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => app_state.next(),
                    MouseEventKind::ScrollUp => app_state.previous(),
                    _ => {}
                },
                Event::Key(key) => {
                    // Filter out KeyRelease events to prevent double input on Windows
                    if key.kind == event::KeyEventKind::Release {
                        continue;
                    }
                    if let Some(action) = handlers::handle_key_event(key, &mut app_state) {
                        if matches!(action, Action::Quit) {
                            let _ = action_tx.send(Action::Quit).await;
                            break;
                        }
                        let _ = action_tx.send(action).await;
                    }
                }
                _ => {}
            }
        }
    }

    // --- 6. CLEANUP ---
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    log::info!("Bye");
    Ok(())
}
