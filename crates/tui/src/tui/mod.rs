use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::logging;
use crate::remote::{HttpBackend, MemoryBackend};

mod app;
mod buffer;
mod constants;
mod dispatch;
mod helpers;

use app::App;
use constants::TICK_RATE;
use dispatch::Dispatcher;

type Backend = CrosstermBackend<Stdout>;

pub fn run(config: AppConfig, offline: bool) -> Result<()> {
    let _guard = logging::init_file(&config)?;

    // Build the backend before touching the terminal so errors print cleanly.
    let dispatcher = connect(&config, offline)?;

    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
    terminal.hide_cursor().context("failed to hide cursor")?;

    let mut app = App::new(config, offline, dispatcher);
    if offline {
        app.set_status_info("Modo sin conexión: datos de ejemplo en memoria");
    }
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("form closed");
    result
}

fn connect(config: &AppConfig, offline: bool) -> Result<Dispatcher> {
    if offline {
        tracing::info!("using in-process sample backend");
        let backend = Arc::new(MemoryBackend::seeded());
        return Dispatcher::new(backend.clone(), backend);
    }
    tracing::info!(api_url = %config.api_url(), "using REST backend");
    let backend = Arc::new(HttpBackend::from_config(config)?);
    Dispatcher::new(backend.clone(), backend)
}

fn run_app(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| app.draw(f))?;
        if app.should_quit() {
            break;
        }

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| std::time::Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key)?,
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}
