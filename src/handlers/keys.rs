//! Keyboard Input Handler Module
//!
//! Translates key events into changes of the application state. Normal mode drives
//! the snippet list and editor; the other input modes capture text for a filter, a
//! name, an import path or a delete confirmation.

use std::fs;
use std::path::Path;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{info, warn};

use crate::app::{App, InputMode};
use crate::handlers::run;

const DRAFTS_DIR: &str = "drafts";
const PAGE_LINES: isize = 10;

/// Main keyboard event handler. Returns true when the application should quit.
pub fn handle_key_events(key: KeyEvent, app: &mut App) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_keys(key, app),
        InputMode::Filter => {
            handle_filter_keys(key, app);
            false
        }
        InputMode::Rename | InputMode::ImportPath => {
            handle_input_keys(key, app);
            false
        }
        InputMode::ConfirmDelete => {
            handle_confirm_keys(key, app);
            false
        }
    }
}

fn handle_normal_keys(key: KeyEvent, app: &mut App) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('q') if !ctrl => return true,
        KeyCode::Char('c') if ctrl => return true,
        KeyCode::Esc => {
            if !app.filter.is_empty() {
                app.filter.clear();
            } else if !app.run_output.is_empty() {
                app.run_output.clear();
            } else {
                app.clear_messages();
            }
        }

        KeyCode::Char('s') if ctrl => app.save_active(),
        KeyCode::Char('r') if ctrl => run::run_active_snippet(app),
        KeyCode::Enter if ctrl => run::run_active_snippet(app),

        // Reordering
        KeyCode::Up if shift => app.move_active(-1),
        KeyCode::Down if shift => app.move_active(1),
        KeyCode::Char('K') => app.move_active(-1),
        KeyCode::Char('J') => app.move_active(1),

        KeyCode::Up | KeyCode::Char('k') => app.previous_snippet(),
        KeyCode::Down | KeyCode::Char('j') => app.next_snippet(),
        KeyCode::PageDown => app.scroll_content(PAGE_LINES),
        KeyCode::PageUp => app.scroll_content(-PAGE_LINES),

        KeyCode::Char('n') => app.new_snippet(),
        KeyCode::Enter | KeyCode::Char('e') => edit_active_in_editor(app),
        KeyCode::Char('r') => {
            if app.active_id.is_some() {
                app.input_buffer = app.draft_name.clone();
                app.input_mode = InputMode::Rename;
            } else {
                app.set_error_message(app.t("noActiveSnippet"));
            }
        }
        KeyCode::Char('d') => app.duplicate_active(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('/') => app.input_mode = InputMode::Filter,
        KeyCode::Char('E') => app.export_all(),
        KeyCode::Char('i') => {
            app.input_buffer.clear();
            app.input_mode = InputMode::ImportPath;
        }
        KeyCode::Char('L') => app.toggle_language(),
        _ => {}
    }

    false
}

/// The filter applies while typing; Enter keeps it, Esc clears it.
fn handle_filter_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.filter.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.filter.pop();
        }
        KeyCode::Up => app.previous_snippet(),
        KeyCode::Down => app.next_snippet(),
        KeyCode::Char(c) => app.filter.push(c),
        _ => {}
    }
}

fn handle_input_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.input_buffer);
            let mode = std::mem::replace(&mut app.input_mode, InputMode::Normal);
            match mode {
                // The new name is a draft like the code; it is stored on save or run.
                InputMode::Rename => app.draft_name = input,
                InputMode::ImportPath => app.import_file(&input),
                _ => {}
            }
        }
        KeyCode::Esc => {
            app.input_buffer.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}

fn handle_confirm_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        _ => {}
    }
}

/// Opens the draft code of the active snippet in an external editor and reads it back.
fn edit_active_in_editor(app: &mut App) {
    let Some(id) = app.active_id.clone() else {
        app.set_error_message(app.t("noActiveSnippet"));
        return;
    };

    let draft_path = app
        .session
        .data_dir
        .join(DRAFTS_DIR)
        .join(format!("{id}.js"));

    if let Err(e) = write_draft(&draft_path, &app.draft_code) {
        app.set_error_message(app.session.translator.error_status(&e.to_string()));
        return;
    }

    let editors = app.session.config.editor_candidates();
    let edited = suspend_tui_for_editor(&draft_path, &editors);
    app.needs_redraw = true;

    match edited.and_then(|_| fs::read_to_string(&draft_path).map_err(Into::into)) {
        Ok(code) => {
            if code != app.draft_code {
                info!("draft of {id} changed in editor");
                app.draft_code = code;
            }
        }
        Err(e) => {
            warn!("editing {id} failed: {e}");
            app.set_error_message(app.session.translator.error_status(&e.to_string()));
        }
    }

    if let Err(e) = fs::remove_file(&draft_path) {
        warn!("could not remove draft {}: {e}", draft_path.display());
    }
}

fn write_draft(path: &Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, code)
}

/// Properly suspend TUI and launch external editor
fn suspend_tui_for_editor(
    file_path: &Path,
    editors: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    use ratatui::crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use std::io::{Write, stdout};
    use std::process::Command;

    // First completely exit the terminal UI
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    print!("\x1B[2J"); // Clear entire screen
    print!("\x1B[H"); // Move cursor to home position
    print!("\x1B[?25h"); // Show cursor
    stdout().flush()?;

    // Try to launch editors in order of preference
    let mut editor_launched = false;

    for editor in editors {
        let mut parts = editor.split_whitespace();
        let Some(program) = parts.next() else {
            continue;
        };

        if let Ok(mut child) = Command::new(program).args(parts).arg(file_path).spawn() {
            // Wait for editor to close
            if child.wait().is_ok() {
                editor_launched = true;
                break;
            }
        }
    }

    if !editor_launched {
        println!("Could not launch any editor ({})", editors.join(", "));
        println!("Press Enter to continue...");
        let mut buffer = String::new();
        std::io::stdin().read_line(&mut buffer)?;
    }

    print!("\x1Bc"); // Full terminal reset
    print!("\x1B[2J"); // Clear entire screen
    print!("\x1B[H"); // Move cursor to home position
    stdout().flush()?;

    // Restore the terminal UI state
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    print!("\x1B[?25l"); // Hide cursor
    stdout().flush()?;

    if editor_launched {
        Ok(())
    } else {
        Err("Could not launch any editor".into())
    }
}
