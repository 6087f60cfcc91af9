use ratatui::widgets::TableState;
use tracing::debug;

use super::keys::KeyAction;
use crate::state::{
    editor::{EditorDefaults, EditorOptions, LogSubmitHandler, SubmitHandler},
    form::Field,
    list::{CatalogList, PageRequest},
    nav::{LoadEvent, Navigator, Request, Screen},
};

const PAGE_STEP: isize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Search,
    Filter,
    Edit(Field),
}

pub struct App {
    pub nav: Navigator,
    pub table_state: TableState,
    pub should_quit: bool,
    pub show_help: bool,
    pub input_mode: InputMode,
    pub input_buffer: String,
    /// Byte offset of the cursor within `input_buffer`.
    pub input_cursor: usize,
    pub status_message: Option<String>,
    /// Rows of the list table that fit on screen, set during rendering.
    pub list_visible_rows: usize,
    options: EditorOptions,
    defaults: EditorDefaults,
    handler: Box<dyn SubmitHandler + Send>,
    requests: Vec<Request>,
}

impl App {
    /// Creates the app with its first page request queued.
    pub fn new(
        list: CatalogList,
        first: PageRequest,
        options: EditorOptions,
        defaults: EditorDefaults,
    ) -> Self {
        Self {
            nav: Navigator::new(list),
            table_state: TableState::default(),
            should_quit: false,
            show_help: false,
            input_mode: InputMode::None,
            input_buffer: String::new(),
            input_cursor: 0,
            status_message: None,
            list_visible_rows: 0,
            options,
            defaults,
            handler: Box::new(LogSubmitHandler),
            requests: vec![Request::Page(first)],
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Box<dyn SubmitHandler + Send>) -> Self {
        self.handler = handler;
        self
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    /// Fetches queued since the last call.
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn on_load_event(&mut self, event: LoadEvent) {
        let is_page = event.tier().is_none();
        if !self.nav.deliver(event) {
            return;
        }
        if is_page {
            self.clamp_selection();
            self.fill_list();
        }
    }

    /// Requests the next page when the selection is near the end of the
    /// loaded rows, when the rows do not fill the screen, or while a saved
    /// cursor is being restored.
    pub fn fill_list(&mut self) {
        let list = self.nav.list();
        let selected = self.table_state.selected().unwrap_or(0);
        let wanted = list.near_end(selected)
            || list.wants_restore()
            || (!list.rows().is_empty() && list.rows().len() < self.list_visible_rows);
        if wanted && let Some(request) = self.nav.list_mut().load_next() {
            self.requests.push(Request::Page(request));
        }
    }

    pub fn is_input_active(&self) -> bool {
        self.input_mode != InputMode::None
    }

    pub(crate) fn handle_action(&mut self, action: KeyAction) {
        if self.input_mode != InputMode::None {
            self.handle_input_action(action);
            return;
        }

        if self.show_help {
            match action {
                KeyAction::ToggleHelp | KeyAction::Dismiss => self.show_help = false,
                KeyAction::Quit => {
                    self.show_help = false;
                    self.should_quit = true;
                }
                _ => {}
            }
            return;
        }

        match action {
            KeyAction::Quit => {
                self.should_quit = true;
                return;
            }
            KeyAction::ToggleHelp => {
                self.show_help = true;
                return;
            }
            _ => {}
        }

        match self.nav.screen() {
            Screen::List => self.handle_list_action(action),
            Screen::Editor => self.handle_editor_action(action),
            Screen::ImagePicker => self.handle_image_picker_action(action),
            Screen::LocationPicker => self.handle_location_picker_action(action),
        }
    }

    fn handle_list_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::MoveDown => self.move_selection(1),
            KeyAction::MoveUp => self.move_selection(-1),
            KeyAction::PageDown => self.move_selection(PAGE_STEP),
            KeyAction::PageUp => self.move_selection(-PAGE_STEP),
            KeyAction::JumpFirst => self.move_selection(isize::MIN),
            KeyAction::JumpLast => self.move_selection(isize::MAX),
            KeyAction::Activate => self.open_selected(),
            KeyAction::StartSearch => {
                let search = self.nav.list().query().search.clone();
                self.begin_input(InputMode::Search, search);
            }
            KeyAction::ToggleSort => {
                let request = self.nav.list_mut().toggle_sort();
                self.status_message = Some(format!("Sorted by title {}", request.query.sort));
                self.requests.push(Request::Page(request));
                self.table_state.select(None);
            }
            KeyAction::Retry => {
                if let Some(request) = self.nav.list_mut().retry() {
                    self.requests.push(Request::Page(request));
                }
            }
            KeyAction::Dismiss => {
                if let Some(request) = self.nav.list_mut().set_search("") {
                    self.requests.push(Request::Page(request));
                    self.table_state.select(None);
                }
            }
            _ => {}
        }
    }

    fn handle_editor_action(&mut self, action: KeyAction) {
        let Some(editor) = self.nav.editor_mut() else {
            return;
        };
        match action {
            KeyAction::MoveDown => editor.move_focus(1),
            KeyAction::MoveUp => editor.move_focus(-1),
            KeyAction::Activate | KeyAction::Toggle => match editor.focus() {
                Field::ItemType => editor.cycle_item_type(),
                Field::Available => editor.toggle_available(),
                Field::Images => self.open_image_picker(),
                Field::Locations => self.open_location_picker(),
                field if action == KeyAction::Activate => {
                    let value = editor.form().text(field);
                    self.begin_input(InputMode::Edit(field), value);
                }
                _ => {}
            },
            KeyAction::OpenImages => self.open_image_picker(),
            KeyAction::OpenLocations => self.open_location_picker(),
            KeyAction::Retry => {
                let retries = editor.retry_failed();
                self.requests.extend(retries.into_iter().map(Request::Tier));
            }
            KeyAction::Save => self.submit(),
            KeyAction::Dismiss | KeyAction::NavigateBack => {
                self.nav.back();
                self.status_message = Some("Edit discarded".to_string());
            }
            _ => {}
        }
    }

    fn handle_image_picker_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Activate => {
                self.nav.confirm_picker();
                let count = self.nav.editor().map_or(0, |e| e.selected_images().len());
                self.status_message = Some(format!("{count} image(s) selected"));
                return;
            }
            KeyAction::Dismiss | KeyAction::NavigateBack => {
                self.nav.back();
                return;
            }
            KeyAction::Retry => {
                self.retry_editor_tiers();
                return;
            }
            _ => {}
        }
        let Some(picker) = self.nav.image_picker_mut() else {
            return;
        };
        match action {
            KeyAction::MoveDown => picker.move_cursor(1),
            KeyAction::MoveUp => picker.move_cursor(-1),
            KeyAction::PageDown => picker.move_cursor(PAGE_STEP),
            KeyAction::PageUp => picker.move_cursor(-PAGE_STEP),
            KeyAction::JumpFirst => picker.move_cursor(isize::MIN),
            KeyAction::JumpLast => picker.jump_last(),
            KeyAction::Toggle => picker.toggle_at_cursor(),
            KeyAction::ToggleSort => picker.toggle_sort(),
            KeyAction::UnselectAll => picker.unselect_all(),
            KeyAction::StartSearch => {
                let filter = picker.filter().to_string();
                self.begin_input(InputMode::Filter, filter);
            }
            _ => {}
        }
    }

    fn handle_location_picker_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Activate => {
                self.nav.confirm_picker();
                let names = self.nav.editor().map(|e| e.location_names().join(", "));
                self.status_message = names.map(|names| format!("Locations: {names}"));
                return;
            }
            KeyAction::Dismiss | KeyAction::NavigateBack => {
                self.nav.back();
                return;
            }
            KeyAction::Retry => {
                self.retry_editor_tiers();
                return;
            }
            _ => {}
        }
        let Some(picker) = self.nav.location_picker_mut() else {
            return;
        };
        match action {
            KeyAction::MoveDown => picker.move_cursor(1),
            KeyAction::MoveUp => picker.move_cursor(-1),
            KeyAction::PageDown => picker.move_cursor(PAGE_STEP),
            KeyAction::PageUp => picker.move_cursor(-PAGE_STEP),
            KeyAction::JumpFirst => picker.move_cursor(isize::MIN),
            KeyAction::JumpLast => picker.move_cursor(isize::MAX),
            KeyAction::Toggle => picker.toggle_at_cursor(),
            KeyAction::UnselectAll => picker.unselect_all(),
            KeyAction::StartSearch => {
                let filter = picker.filter().to_string();
                self.begin_input(InputMode::Filter, filter);
            }
            _ => {}
        }
    }

    fn handle_input_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => {
                self.end_input();
                self.should_quit = true;
            }
            KeyAction::Dismiss => self.end_input(),
            KeyAction::Backspace => {
                if self.input_cursor > 0 {
                    let prev = self.input_buffer[..self.input_cursor]
                        .char_indices()
                        .next_back()
                        .map_or(0, |(i, _)| i);
                    self.input_buffer.drain(prev..self.input_cursor);
                    self.input_cursor = prev;
                }
            }
            KeyAction::InputChar(c) => {
                self.input_buffer.insert(self.input_cursor, c);
                self.input_cursor += c.len_utf8();
            }
            KeyAction::CursorLeft => {
                if self.input_cursor > 0 {
                    self.input_cursor = self.input_buffer[..self.input_cursor]
                        .char_indices()
                        .next_back()
                        .map_or(0, |(i, _)| i);
                }
            }
            KeyAction::CursorRight => {
                if self.input_cursor < self.input_buffer.len() {
                    self.input_cursor += self.input_buffer[self.input_cursor..]
                        .chars()
                        .next()
                        .map_or(0, char::len_utf8);
                }
            }
            KeyAction::CursorStart => self.input_cursor = 0,
            KeyAction::CursorEnd => self.input_cursor = self.input_buffer.len(),
            KeyAction::KillToEnd => self.input_buffer.truncate(self.input_cursor),
            KeyAction::Activate => {
                let value = std::mem::take(&mut self.input_buffer);
                match self.input_mode {
                    InputMode::Search => {
                        if let Some(request) = self.nav.list_mut().set_search(&value) {
                            self.requests.push(Request::Page(request));
                            self.table_state.select(None);
                        }
                    }
                    InputMode::Filter => {
                        if let Some(picker) = self.nav.image_picker_mut() {
                            picker.set_filter(&value);
                        } else if let Some(picker) = self.nav.location_picker_mut() {
                            picker.set_filter(&value);
                        }
                    }
                    InputMode::Edit(field) => {
                        if let Some(editor) = self.nav.editor_mut() {
                            editor.set_text(field, &value);
                        }
                    }
                    InputMode::None => {}
                }
                self.end_input();
            }
            _ => {}
        }
    }

    fn begin_input(&mut self, mode: InputMode, value: String) {
        self.input_mode = mode;
        self.input_cursor = value.len();
        self.input_buffer = value;
    }

    fn end_input(&mut self) {
        self.input_mode = InputMode::None;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.nav.list().rows().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        self.table_state
            .select(Some(current.saturating_add_signed(delta).min(len - 1)));
        self.fill_list();
    }

    fn clamp_selection(&mut self) {
        let len = self.nav.list().rows().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn open_selected(&mut self) {
        let Some(id) = self
            .table_state
            .selected()
            .and_then(|index| self.nav.list().rows().get(index))
            .map(|row| row.id)
        else {
            return;
        };
        let requests = self.nav.open_editor(id, self.options, self.defaults.clone());
        self.requests.extend(requests.into_iter().map(Request::Tier));
        self.status_message = None;
    }

    fn open_image_picker(&mut self) {
        self.nav.open_image_picker();
    }

    fn open_location_picker(&mut self) {
        self.nav.open_location_picker();
    }

    fn retry_editor_tiers(&mut self) {
        if let Some(editor) = self.nav.editor_mut() {
            let retries = editor.retry_failed();
            self.requests.extend(retries.into_iter().map(Request::Tier));
        }
    }

    fn submit(&mut self) {
        let Some(editor) = self.nav.editor_mut() else {
            return;
        };
        match editor.submit(self.handler.as_mut()) {
            Ok(submission) => {
                debug!(product_id = submission.product_id, "editor closed after submit");
                self.nav.back();
                self.status_message = Some(format!("Saved item #{}", submission.product_id));
            }
            Err(errors) => {
                self.status_message = Some(format!("Not saved: {errors}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use catalog::prelude::*;

    use super::*;
    use crate::state::{
        editor::TierKind,
        fixtures::{image_set, page, product},
        form::EditSubmission,
        list::ListQuery,
    };

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<EditSubmission>>>);

    impl SubmitHandler for Recorder {
        fn submit(&mut self, submission: &EditSubmission) {
            if let Ok(mut calls) = self.0.lock() {
                calls.push(submission.clone());
            }
        }
    }

    fn fixture_app() -> App {
        let (list, first) = CatalogList::new(ListQuery::default(), 10);
        let mut app = App::new(list, first, EditorOptions::default(), EditorDefaults::default());
        let requests = app.take_requests();
        let Some(Request::Page(first)) = requests.into_iter().next() else {
            panic!("first page request");
        };
        app.on_load_event(LoadEvent::Page {
            request: first,
            result: Ok(page(30, 0, 10)),
        });
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_action(KeyAction::InputChar(ch));
        }
    }

    /// Opens the editor on the selected row and resolves all three tiers.
    fn open_ready_editor(app: &mut App) -> u64 {
        app.handle_action(KeyAction::Activate);
        let id = app.nav.editor().map(|e| e.product_id()).expect("editor");
        for request in app.take_requests() {
            let Request::Tier(request) = request else {
                continue;
            };
            let event = match request.kind {
                TierKind::Detail => LoadEvent::Detail {
                    request,
                    result: Ok(product(id)),
                },
                TierKind::Images => LoadEvent::Images {
                    request,
                    result: Ok(image_set(id)),
                },
                TierKind::Locations => LoadEvent::Locations {
                    request,
                    result: Ok(default_locations()),
                },
            };
            app.on_load_event(event);
        }
        id
    }

    #[test]
    fn first_page_selects_first_row() {
        let app = fixture_app();
        assert_eq!(app.table_state.selected(), Some(0));
        assert_eq!(app.nav.list().rows().len(), 10);
    }

    #[test]
    fn scrolling_near_the_end_requests_next_page_once() {
        let mut app = fixture_app();
        for _ in 0..6 {
            app.handle_action(KeyAction::MoveDown);
        }
        assert!(app.take_requests().is_empty());

        app.handle_action(KeyAction::MoveDown);
        let requests = app.take_requests();
        assert!(matches!(requests.as_slice(), [Request::Page(r)] if r.offset == 10));

        app.handle_action(KeyAction::MoveDown);
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn short_list_fills_the_screen() {
        let mut app = fixture_app();
        app.list_visible_rows = 25;
        app.fill_list();
        assert!(matches!(app.take_requests().as_slice(), [Request::Page(r)] if r.offset == 10));
    }

    #[test]
    fn search_keyboard_workflow() {
        let mut app = fixture_app();
        app.handle_action(KeyAction::StartSearch);
        assert!(app.is_input_active());
        type_text(&mut app, "phone");
        app.handle_action(KeyAction::Activate);

        assert!(!app.is_input_active());
        assert_eq!(app.nav.list().query().search, "phone");
        assert!(app.nav.list().rows().is_empty());
        assert!(matches!(
            app.take_requests().as_slice(),
            [Request::Page(r)] if r.offset == 0 && r.query.search == "phone"
        ));

        // Esc on the list clears the search
        app.handle_action(KeyAction::Dismiss);
        assert_eq!(app.nav.list().query().search, "");
        assert_eq!(app.take_requests().len(), 1);
    }

    #[test]
    fn sort_toggle_requests_first_page() {
        let mut app = fixture_app();
        app.handle_action(KeyAction::ToggleSort);
        assert_eq!(app.nav.list().query().sort, SortOrder::Desc);
        assert!(matches!(
            app.take_requests().as_slice(),
            [Request::Page(r)] if r.offset == 0 && r.query.sort == SortOrder::Desc
        ));
    }

    #[test]
    fn enter_opens_editor_with_three_tier_requests() {
        let mut app = fixture_app();
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::Activate);
        assert_eq!(app.nav.screen(), Screen::Editor);
        assert_eq!(app.nav.editor().map(|e| e.product_id()), Some(2));
        let requests = app.take_requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| matches!(r, Request::Tier(_))));
    }

    #[test]
    fn edit_name_and_save_calls_handler() {
        let recorder = Recorder::default();
        let mut app = fixture_app().with_handler(Box::new(recorder.clone()));
        let id = open_ready_editor(&mut app);

        app.handle_action(KeyAction::Activate);
        assert_eq!(app.input_mode, InputMode::Edit(Field::Name));
        assert_eq!(app.input_buffer, "Product 001");
        app.handle_action(KeyAction::KillToEnd);
        app.handle_action(KeyAction::CursorStart);
        app.handle_action(KeyAction::KillToEnd);
        type_text(&mut app, "Renamed");
        app.handle_action(KeyAction::Activate);

        app.handle_action(KeyAction::Save);
        assert_eq!(app.nav.screen(), Screen::List);
        let calls = recorder.0.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].product_id, id);
        assert_eq!(calls[0].name, "Renamed");
        assert_eq!(calls[0].location_ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn empty_name_blocks_save() {
        let recorder = Recorder::default();
        let mut app = fixture_app().with_handler(Box::new(recorder.clone()));
        open_ready_editor(&mut app);

        app.handle_action(KeyAction::Activate);
        app.handle_action(KeyAction::CursorStart);
        app.handle_action(KeyAction::KillToEnd);
        app.handle_action(KeyAction::Activate);
        app.handle_action(KeyAction::Save);

        assert_eq!(app.nav.screen(), Screen::Editor);
        assert!(recorder.0.lock().expect("lock").is_empty());
        assert!(app.nav.editor().and_then(|e| e.errors()).is_some());
        assert!(app.status_message.as_deref().is_some_and(|m| m.starts_with("Not saved")));
    }

    #[test]
    fn image_picker_confirm_and_cancel() {
        let mut app = fixture_app();
        open_ready_editor(&mut app);

        app.handle_action(KeyAction::OpenImages);
        assert_eq!(app.nav.screen(), Screen::ImagePicker);
        app.handle_action(KeyAction::Toggle);
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::Toggle);
        app.handle_action(KeyAction::Activate);
        assert_eq!(app.nav.screen(), Screen::Editor);
        assert_eq!(app.nav.editor().map(|e| e.selected_images().len()), Some(2));

        // cancelled changes do not reach the editor
        app.handle_action(KeyAction::OpenImages);
        app.handle_action(KeyAction::UnselectAll);
        app.handle_action(KeyAction::Dismiss);
        assert_eq!(app.nav.screen(), Screen::Editor);
        assert_eq!(app.nav.editor().map(|e| e.selected_images().len()), Some(2));
    }

    #[test]
    fn picker_filter_uses_input_mode() {
        let mut app = fixture_app();
        open_ready_editor(&mut app);
        app.handle_action(KeyAction::OpenLocations);
        app.handle_action(KeyAction::StartSearch);
        assert_eq!(app.input_mode, InputMode::Filter);
        type_text(&mut app, "squ");
        app.handle_action(KeyAction::Activate);
        let visible = app.nav.location_picker().map(|p| p.visible().len());
        assert_eq!(visible, Some(1));
    }

    #[test]
    fn location_picker_save_commits_selection() {
        let mut app = fixture_app();
        open_ready_editor(&mut app);
        app.handle_action(KeyAction::OpenLocations);
        app.handle_action(KeyAction::UnselectAll);
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::Toggle);
        app.handle_action(KeyAction::Activate);
        assert_eq!(app.nav.editor().map(|e| e.location_names()), Some(vec!["Square".to_string()]));
        assert_eq!(app.status_message.as_deref(), Some("Locations: Square"));
    }

    #[test]
    fn location_picker_cancel_keeps_editor_locations() {
        let mut app = fixture_app();
        open_ready_editor(&mut app);
        let all: Vec<String> = ["1", "2", "3", "4"].map(String::from).to_vec();

        app.handle_action(KeyAction::OpenLocations);
        app.handle_action(KeyAction::UnselectAll);
        app.handle_action(KeyAction::Toggle);
        app.handle_action(KeyAction::Dismiss);
        assert_eq!(app.nav.screen(), Screen::Editor);
        assert_eq!(app.nav.editor().map(|e| e.location_ids().to_vec()), Some(all.clone()));

        app.handle_action(KeyAction::OpenLocations);
        app.handle_action(KeyAction::UnselectAll);
        app.handle_action(KeyAction::NavigateBack);
        assert_eq!(app.nav.screen(), Screen::Editor);
        assert_eq!(app.nav.editor().map(|e| e.location_ids().to_vec()), Some(all.clone()));
    }

    #[test]
    fn retry_reissues_failed_tier() {
        let mut app = fixture_app();
        app.handle_action(KeyAction::Activate);
        let requests = app.take_requests();
        let images = requests
            .iter()
            .find_map(|r| match r {
                Request::Tier(t) if t.kind == TierKind::Images => Some(*t),
                _ => None,
            })
            .expect("images request");
        app.on_load_event(LoadEvent::Images {
            request: images,
            result: Err("boom".into()),
        });
        app.handle_action(KeyAction::Retry);
        assert_eq!(app.take_requests(), vec![Request::Tier(images)]);
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = fixture_app();
        app.handle_action(KeyAction::ToggleHelp);
        app.handle_action(KeyAction::MoveDown);
        assert_eq!(app.table_state.selected(), Some(0));
        app.handle_action(KeyAction::Dismiss);
        assert!(!app.show_help);
    }
}
