use std::path::Path;
use std::time::{Duration, Instant};

use console_rules::search;
use console_rules::{Session, Snippet, StoreError};
use ratatui::Frame;
use tokio::runtime::Runtime;

use crate::ui::snippets;

/// How long a status line stays on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Rename,
    ImportPath,
    ConfirmDelete,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// Main Application State Container
///
/// Holds the open session plus the editing state of the active snippet. The draft
/// fields are what the user is typing; they reach the store only on save or run.
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub runtime: Runtime,
    pub active_id: Option<String>,
    pub draft_name: String,
    pub draft_code: String,
    pub filter: String,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub status: Option<StatusMessage>,
    pub needs_redraw: bool,
    pub content_scroll_position: usize,
    /// Rows of code the editor pane showed on the last draw.
    pub content_height: usize,
    /// What the last successful run printed, shown under the editor.
    pub run_output: Vec<String>,
}

impl App {
    pub fn new(session: Session, runtime: Runtime) -> Self {
        let mut app = Self {
            session,
            runtime,
            active_id: None,
            draft_name: String::new(),
            draft_code: String::new(),
            filter: String::new(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            status: None,
            needs_redraw: true,
            content_scroll_position: 0,
            content_height: 0,
            run_output: Vec::new(),
        };

        let first = app.session.store.first_id().map(str::to_string);
        app.select_snippet(first);
        app
    }

    pub fn t(&self, key: &str) -> String {
        self.session.translator.t(key)
    }

    /// Snippets shown in the list, narrowed by the filter.
    pub fn visible_snippets(&self) -> Vec<&Snippet> {
        search::filter_by_name(self.session.store.snippets(), &self.filter)
    }

    pub fn active_snippet(&self) -> Option<&Snippet> {
        self.active_id
            .as_deref()
            .and_then(|id| self.session.store.get(id))
    }

    /// Index of the active snippet in the visible list.
    pub fn active_visible_index(&self) -> Option<usize> {
        let id = self.active_id.as_deref()?;
        self.visible_snippets().iter().position(|s| s.id == id)
    }

    /// Whether the drafts differ from what is stored.
    pub fn is_modified(&self) -> bool {
        self.active_snippet()
            .is_some_and(|s| s.name != self.draft_name || s.code != self.draft_code)
    }

    /// Makes `id` active and loads its drafts. Unknown ids fall back to the first
    /// snippet, an empty store clears the editor.
    pub fn select_snippet(&mut self, id: Option<String>) {
        let snippet = self.session.store.fallback_active(id.as_deref()).cloned();

        match snippet {
            Some(snippet) => {
                self.active_id = Some(snippet.id);
                self.draft_name = snippet.name;
                self.draft_code = snippet.code;
            }
            None => {
                self.active_id = None;
                self.draft_name.clear();
                self.draft_code.clear();
            }
        }
        self.content_scroll_position = 0;
    }

    /// Scrolls the code by `delta` lines, stopping where the last line reaches the
    /// bottom of the pane.
    pub fn scroll_content(&mut self, delta: isize) {
        let line_count = self.draft_code.split('\n').count();
        let max_scroll = line_count.saturating_sub(self.content_height.max(1));
        let position = self.content_scroll_position as isize + delta;
        self.content_scroll_position = position.clamp(0, max_scroll as isize) as usize;
    }

    pub fn next_snippet(&mut self) {
        self.step_selection(1);
    }

    pub fn previous_snippet(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, delta: isize) {
        let visible: Vec<String> = self.visible_snippets().iter().map(|s| s.id.clone()).collect();
        if visible.is_empty() {
            return;
        }

        let next = match self.active_visible_index() {
            Some(index) => (index as isize + delta).clamp(0, visible.len() as isize - 1) as usize,
            None => 0,
        };
        self.select_snippet(Some(visible[next].clone()));
    }

    pub fn new_snippet(&mut self) {
        let result = self.runtime.block_on(self.session.store.create_blank());
        match result {
            Ok(snippet) => {
                self.select_snippet(Some(snippet.id));
                self.set_success_message(self.t("snippetCreated"));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    pub fn save_active(&mut self) {
        let Some(id) = self.active_id.clone() else {
            self.set_error_message(self.t("noActiveSnippet"));
            return;
        };

        let result = self.runtime.block_on(self.session.store.update(
            &id,
            &self.draft_name,
            &self.draft_code,
        ));
        match result {
            Ok(snippet) => {
                self.draft_name = snippet.name;
                self.set_success_message(self.t("snippetSaved"));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    pub fn duplicate_active(&mut self) {
        let Some(id) = self.active_id.clone() else {
            self.set_error_message(self.t("noActiveSnippet"));
            return;
        };

        let result = self.runtime.block_on(self.session.store.duplicate(&id));
        match result {
            Ok(copy) => {
                self.select_snippet(Some(copy.id));
                self.set_success_message(self.t("snippetDuplicated"));
            }
            Err(e) => self.report_store_error(&e),
        }
    }

    pub fn request_delete(&mut self) {
        if self.active_id.is_none() {
            self.set_error_message(self.t("noActiveSnippet"));
            return;
        }
        self.input_mode = InputMode::ConfirmDelete;
    }

    pub fn confirm_delete(&mut self) {
        self.input_mode = InputMode::Normal;
        let Some(id) = self.active_id.clone() else {
            return;
        };

        let result = self.runtime.block_on(self.session.store.remove(&id));
        match result {
            Ok(Some(_)) => {
                self.select_snippet(None);
                self.set_success_message(self.t("snippetDeleted"));
            }
            Ok(None) => self.set_error_message(self.t("snippetNotFound")),
            Err(e) => self.report_store_error(&e),
        }
    }

    /// Moves the active snippet one place up (`-1`) or down (`1`) in the full collection.
    pub fn move_active(&mut self, delta: isize) {
        if search::is_filtering(&self.filter) {
            self.set_error_message(self.t("clearSearchToReorder"));
            return;
        }
        let Some(id) = self.active_id.clone() else {
            self.set_error_message(self.t("noActiveSnippet"));
            return;
        };
        let Some(from) = self.session.store.position(&id) else {
            self.set_error_message(self.t("snippetNotFound"));
            return;
        };

        let target = from as isize + delta;
        if target < 0 || target >= self.session.store.len() as isize {
            self.set_success_message(self.t("cannotMoveFurther"));
            return;
        }

        let result = self
            .runtime
            .block_on(self.session.store.reorder(&id, target as usize));
        match result {
            Ok(()) => self.set_success_message(self.t("orderUpdated")),
            Err(e) => self.report_store_error(&e),
        }
    }

    pub fn export_all(&mut self) {
        let result = self.runtime.block_on(self.session.export_to(None));
        match result {
            Ok(path) => {
                let path = path.display().to_string();
                let message = self.session.translator.t_with("exportedTo", &[("path", &path)]);
                self.set_success_message(message);
            }
            Err(e) => self.set_error_message(self.session.translator.error_status(&e.to_string())),
        }
    }

    pub fn import_file(&mut self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }

        let result = self.runtime.block_on(self.session.import_from(Path::new(path)));
        let message = self.session.import_status(&result);
        match result {
            Ok(imported) => {
                self.select_snippet(imported.first().map(|s| s.id.clone()));
                self.set_success_message(message);
            }
            Err(_) => self.set_error_message(message),
        }
    }

    pub fn toggle_language(&mut self) {
        let next = self.session.translator.language().toggled();
        let result = self.runtime.block_on(self.session.set_language(next.code()));
        match result {
            Ok(_) => {
                let language = next.to_string();
                let message = self
                    .session
                    .translator
                    .t_with("languageChanged", &[("language", &language)]);
                self.set_success_message(message);
            }
            Err(e) => self.set_error_message(self.session.translator.error_status(&e.to_string())),
        }
    }

    /// Shows a failed store operation. Changes that only missed storage are still in
    /// memory, so the drafts are reloaded from the collection.
    pub fn report_store_error(&mut self, err: &StoreError) {
        if matches!(err, StoreError::Unpersisted(_)) {
            let keep = self.active_id.clone().or_else(|| {
                self.session.store.first_id().map(str::to_string)
            });
            self.select_snippet(keep);
        }
        self.set_error_message(self.session.translator.store_error(err));
    }

    pub fn set_error_message(&mut self, message: String) {
        self.status = Some(StatusMessage {
            text: message,
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    pub fn set_success_message(&mut self, message: String) {
        self.status = Some(StatusMessage {
            text: message,
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn clear_messages(&mut self) {
        self.status = None;
    }

    /// Called every loop iteration; clears the status line once it has been shown long enough.
    pub fn tick(&mut self) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.shown_at.elapsed() >= STATUS_TIMEOUT)
        {
            self.clear_messages();
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        snippets::render(frame, self);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use console_rules::config::Config;
    use console_rules::models::{Backend, MemoryStorage};

    use super::*;

    pub(crate) fn test_app() -> App {
        let runtime = Runtime::new().unwrap();
        let session = runtime
            .block_on(Session::with_storage(
                Config::default(),
                PathBuf::from("unused"),
                Backend::Memory(MemoryStorage::new()),
            ))
            .unwrap();
        App::new(session, runtime)
    }

    #[test]
    fn test_scroll_stops_at_last_page() {
        let mut app = test_app();
        app.draft_code = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        app.content_height = 10;

        for _ in 0..50 {
            app.scroll_content(10);
        }
        assert_eq!(app.content_scroll_position, 20);

        app.scroll_content(-10);
        assert_eq!(app.content_scroll_position, 10);
        app.scroll_content(-100);
        assert_eq!(app.content_scroll_position, 0);
    }

    #[test]
    fn test_short_code_does_not_scroll() {
        let mut app = test_app();
        app.draft_code = "1;\n2;".to_string();
        app.content_height = 10;

        app.scroll_content(10);
        assert_eq!(app.content_scroll_position, 0);
    }
}
