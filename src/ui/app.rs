use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tui_widgets::popup::PopupState;

use crate::config::{Config, UiColors};
use crate::option::PickOption;
use crate::picker::{Picker, PickerListener, Selection};

use super::draw;
use super::input::QueryInput;
use super::keys;

const PAGE_SIZE: isize = 5;

/// One line of the open dropdown list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub text: String,
    pub subtitle: Option<String>,
    /// Position in the picker's display order; `None` for group headers
    pub display_index: Option<usize>,
    pub selected: bool,
}

impl ListRow {
    pub fn selectable(&self) -> bool {
        self.display_index.is_some()
    }
}

/// What the dropdown ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Picked(Selection<String>),
    Dismissed,
}

#[derive(Default)]
struct OutcomeRecorder {
    outcome: Option<Outcome>,
}

impl PickerListener<String> for OutcomeRecorder {
    fn on_select(&mut self, option: &PickOption<String>, value: &String) {
        info!(label = %option.label, value = %value, "option selected");
        self.outcome = Some(Outcome::Picked(Selection::Value(value.clone())));
    }

    fn on_custom(&mut self, text: &str) {
        info!(text, "custom entry confirmed");
        self.outcome = Some(Outcome::Picked(Selection::Custom(text.to_string())));
    }

    fn on_dismiss(&mut self) {
        self.outcome = Some(Outcome::Dismissed);
    }
}

pub struct App<'a> {
    config: &'a Config,
    pub title: String,
    pub picker: Picker<String>,
    pub query_input: QueryInput,
    pub rows: Vec<ListRow>,
    pub highlighted_row: Option<usize>,
    pub modal_popup: PopupState,
    pub status: Option<String>,
    recorder: OutcomeRecorder,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, title: impl Into<String>, picker: Picker<String>) -> Self {
        let mut app = Self {
            config,
            title: title.into(),
            picker,
            query_input: QueryInput::default(),
            rows: Vec::new(),
            highlighted_row: None,
            modal_popup: PopupState::default(),
            status: None,
            recorder: OutcomeRecorder::default(),
        };
        app.open_dropdown();
        app
    }

    /// Run until an option is confirmed or the user quits.
    pub fn run(&mut self) -> Result<Option<Selection<String>>> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<Option<Selection<String>>>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key) {
                        break;
                    }
                    if let Some(Outcome::Picked(selection)) = self.recorder.outcome.clone() {
                        return Ok(Some(selection));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if keys::is_interrupt(&key) {
            return true;
        }

        if self.picker.is_open() {
            self.handle_open_key(key);
            return false;
        }

        let config = self.config;
        let closed = &config.keys.closed;
        if keys::matches_any(&key, &closed.open) {
            if !self.open_dropdown() {
                self.set_status("Picker is disabled");
            }
            return false;
        }
        if keys::matches_any(&key, &closed.reset) {
            self.picker.reset();
            self.set_status("Selection cleared");
            return false;
        }
        keys::matches_any(&key, &closed.quit)
    }

    fn handle_open_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let open = &config.keys.open;

        if keys::matches_any(&key, &open.cancel) {
            self.picker.dismiss(&mut self.recorder);
            return;
        }
        if keys::matches_any(&key, &open.confirm) {
            self.picker.confirm_highlighted(&mut self.recorder);
            return;
        }
        if keys::matches_any(&key, &open.next) {
            self.move_highlight(1);
            return;
        }
        if keys::matches_any(&key, &open.prev) {
            self.move_highlight(-1);
            return;
        }
        if keys::matches_any(&key, &open.page_down) {
            self.move_highlight(PAGE_SIZE);
            return;
        }
        if keys::matches_any(&key, &open.page_up) {
            self.move_highlight(-PAGE_SIZE);
            return;
        }

        if self.query_input.handle_key_event(key) {
            self.picker.set_query(self.query_input.value());
            self.rebuild_rows();
        }
    }

    fn open_dropdown(&mut self) -> bool {
        if !self.picker.open() {
            return false;
        }
        self.query_input.reset();
        self.modal_popup = PopupState::default();
        self.status = None;
        self.rebuild_rows();
        true
    }

    fn move_highlight(&mut self, delta: isize) {
        self.picker.move_highlight(delta);
        self.update_highlighted_row();
    }

    pub fn rebuild_rows(&mut self) {
        self.rows.clear();

        let push = |rows: &mut Vec<ListRow>, index: usize, option: &PickOption<String>| {
            rows.push(ListRow {
                text: option.label.clone(),
                subtitle: option.subtitle.clone(),
                display_index: Some(index),
                selected: self.picker.is_selected(option),
            });
        };

        match self.picker.grouped() {
            Some(groups) => {
                let mut index = 0;
                for (name, options) in groups.iter() {
                    self.rows.push(ListRow {
                        text: name.title().to_uppercase(),
                        subtitle: None,
                        display_index: None,
                        selected: false,
                    });
                    for &option in options {
                        push(&mut self.rows, index, option);
                        index += 1;
                    }
                }
            }
            None => {
                for (index, option) in self.picker.visible().into_iter().enumerate() {
                    push(&mut self.rows, index, option);
                }
            }
        }

        self.update_highlighted_row();
    }

    fn update_highlighted_row(&mut self) {
        let target = self.picker.highlighted();
        self.highlighted_row = self
            .rows
            .iter()
            .position(|row| row.display_index == Some(target));
    }

    /// Label shown on the closed field line.
    pub fn field_text(&self) -> String {
        match self.picker.selection() {
            Some(Selection::Value(value)) => self
                .picker
                .selected_option()
                .map(|option| option.label.clone())
                .unwrap_or_else(|| value.clone()),
            Some(Selection::Custom(text)) => text.clone(),
            None => self.config.ui.placeholder.clone(),
        }
    }

    pub fn has_selection(&self) -> bool {
        self.picker.selection().is_some()
    }

    pub fn custom_candidate(&self) -> Option<String> {
        self.picker.custom_candidate()
    }

    pub fn empty_message(&self) -> &str {
        &self.config.ui.empty_message
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }
}
