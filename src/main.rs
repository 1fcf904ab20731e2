//! console-rules - saved JavaScript snippets you can edit, organize and run.
//!
//! Without arguments a terminal user interface opens on the snippet list and a
//! highlighted editor pane. With arguments a single command runs against the same
//! storage and exits.

use std::error::Error;
use std::io::{self};
use std::time::Duration;

use console_rules::Session;
use console_rules::config::{self, Config};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event},
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::app::App;

mod app;
mod cli;
mod handlers;
mod ui;

/// Application entry point and initialization
fn main() -> Result<(), Box<dyn Error>> {
    color_eyre::install()?;

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let ephemeral = cli::take_flag(&mut args, "--ephemeral");
    let config = Config::load()?;

    if !args.is_empty() {
        config::init_stderr_logging(&config);
        let runtime = Runtime::new()?;
        let mut session = runtime.block_on(Session::open(config, ephemeral))?;
        return runtime.block_on(cli::execute_cli(&args, &mut session));
    }

    run_tui(config, ephemeral)
}

/// Initializes the terminal and runs the main loop, restoring the terminal on the
/// way out even when the loop fails.
fn run_tui(config: Config, ephemeral: bool) -> Result<(), Box<dyn Error>> {
    let data_dir = config.data_dir()?;
    config::init_file_logging(&config, &data_dir)?;

    let runtime = Runtime::new()?;
    let session = runtime.block_on(Session::open(config, ephemeral))?;
    let mut app = App::new(session, runtime);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("terminal loop failed: {e}");
    }
    info!("session closed");
    result
}

fn main_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut should_quit = false;

    while !should_quit {
        if app.needs_redraw {
            force_redraw(terminal, app)?;
            app.needs_redraw = false;
        } else {
            terminal.draw(|frame| app.render(frame))?;
        }
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                should_quit = handlers::keys::handle_key_events(key, app);
                if app.needs_redraw {
                    force_redraw(terminal, app)?;
                    app.needs_redraw = false;
                }
            }
        }
        handlers::run::poll_run_results(app);
        app.tick();
    }

    Ok(())
}

/// Forces a complete redraw of the terminal UI
/// Used after suspending for editor to ensure a clean UI state
fn force_redraw<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    terminal.clear()?;
    terminal.draw(|frame| app.render(frame))?;

    Ok(())
}
