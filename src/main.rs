mod app;
mod editor;
mod model;
mod msg;
mod people;
mod vault;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use app::App;
use model::config::{AppConfig, ConfigFile};
use msg::Msg;
use people::AtPeople;
use vault::{FsVault, Vault};

fn main() -> Result<()> {
    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "at-people")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("at-people"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "at-people.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("at_people=info")),
        )
        .init();

    tracing::info!("at-people starting");

    let config_path =
        AppConfig::user_config_path().unwrap_or_else(|| PathBuf::from("at-people.toml"));
    let config = AppConfig::load_from(&config_path)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, config_path);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("fatal: {e:?}");
        eprintln!("at-people error: {e:?}");
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    config_path: PathBuf,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();
    let vault_path = config.vault_path();
    std::fs::create_dir_all(&vault_path)?;

    let vault: Arc<dyn Vault> = Arc::new(FsVault::new(vault_path.clone()));
    let store = ConfigFile::new(config_path, &config);
    let mut people = AtPeople::new(
        config.people.clone(),
        Box::new(store),
        Arc::clone(&vault),
        tx.clone(),
    );

    // Watch before the initial scan so no change falls between the two.
    let watching = spawn_file_watcher(vault_path, tx.clone());
    if watching.recv().is_err() {
        tracing::warn!("vault changes will not reach the people index");
    }
    people.initialize()?;

    let mut app = App::new(config, people, vault)?;

    // Input thread: reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) if k.kind != KeyEventKind::Release => Msg::Key(k),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: 50ms periodic tick for auto-save debounce
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_millis(50));
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            app.update(msg)?;
        }

        if app.should_quit {
            break;
        }

        terminal.draw(|f| app.view(f))?;
    }

    Ok(())
}

/// Forward vault changes to the event loop as `Msg::Vault`.
///
/// The returned receiver yields once the watch is active, and disconnects
/// without a value if it could not be set up.
fn spawn_file_watcher(vault_path: PathBuf, tx: mpsc::Sender<Msg>) -> mpsc::Receiver<()> {
    let (ready_tx, ready_rx) = mpsc::sync_channel(0);
    thread::spawn(move || {
        let root = vault_path.clone();
        let canonical_root = std::fs::canonicalize(&vault_path).unwrap_or_else(|_| root.clone());
        let tx_watch = tx.clone();
        let mut watcher: RecommendedWatcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let mut events = vault::vault_events_from_notify(&root, &event);
                    if events.is_empty() && canonical_root != root {
                        events = vault::vault_events_from_notify(&canonical_root, &event);
                    }
                    for vault_event in events {
                        if tx_watch.send(Msg::Vault(vault_event)).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("file watcher error: {err}");
                }
            }) {
                Ok(w) => w,
                Err(err) => {
                    tracing::warn!("failed to initialize file watcher: {err}");
                    return;
                }
            };

        if let Err(err) = watcher.watch(&vault_path, RecursiveMode::Recursive) {
            tracing::warn!("failed to watch vault path {}: {err}", vault_path.display());
            return;
        }
        if ready_tx.send(()).is_err() {
            return;
        }

        loop {
            thread::park();
        }
    });
    ready_rx
}
