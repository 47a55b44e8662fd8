//! Dropdown selection state.
//!
//! A [`Picker`] is either closed or open. While open it owns a transient
//! query and an optional custom-entry text; confirming an option or a
//! custom entry updates the current [`Selection`] and closes the picker.
//! Refused transitions are silent no-ops.

use tracing::debug;

use crate::group::{self, Groups};
use crate::option::{PickOption, SearchField};
use crate::search;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerState {
    #[default]
    Closed,
    Open,
}

/// Current value of a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<V> {
    Value(V),
    Custom(String),
}

impl<V> Selection<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            Selection::Value(value) => Some(value),
            Selection::Custom(_) => None,
        }
    }

    pub fn custom(&self) -> Option<&str> {
        match self {
            Selection::Value(_) => None,
            Selection::Custom(text) => Some(text),
        }
    }
}

/// Behavioural flags supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
    pub disabled: bool,
    pub allow_custom: bool,
    pub search_fields: Vec<SearchField>,
    pub group_key: Option<String>,
    pub max_visible: Option<usize>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            allow_custom: false,
            search_fields: SearchField::defaults(),
            group_key: None,
            max_visible: None,
        }
    }
}

/// Receives the outcome of an open picker.
pub trait PickerListener<V> {
    fn on_select(&mut self, _option: &PickOption<V>, _value: &V) {}

    fn on_custom(&mut self, _text: &str) {}

    fn on_dismiss(&mut self) {}
}

impl<V> PickerListener<V> for () {}

#[derive(Debug, Clone)]
pub struct Picker<V> {
    options: Vec<PickOption<V>>,
    config: PickerConfig,
    state: PickerState,
    query: String,
    custom_text: String,
    highlighted: usize,
    selection: Option<Selection<V>>,
}

impl<V: Clone + PartialEq> Picker<V> {
    pub fn new(options: Vec<PickOption<V>>, config: PickerConfig) -> Self {
        Self {
            options,
            config,
            state: PickerState::Closed,
            query: String::new(),
            custom_text: String::new(),
            highlighted: 0,
            selection: None,
        }
    }

    /// Start from an already confirmed value.
    pub fn with_selection(mut self, selection: Option<Selection<V>>) -> Self {
        self.selection = selection;
        self
    }

    pub fn options(&self) -> &[PickOption<V>] {
        &self.options
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PickerState::Open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn custom_text(&self) -> &str {
        &self.custom_text
    }

    pub fn selection(&self) -> Option<&Selection<V>> {
        self.selection.as_ref()
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// The option whose value equals the current selection, if any.
    pub fn selected_option(&self) -> Option<&PickOption<V>> {
        let value = self.selection.as_ref()?.value()?;
        self.options.iter().find(|option| &option.value == value)
    }

    pub fn is_selected(&self, option: &PickOption<V>) -> bool {
        matches!(&self.selection, Some(Selection::Value(value)) if *value == option.value)
    }

    pub fn open(&mut self) -> bool {
        if self.config.disabled {
            debug!("picker disabled, ignoring open");
            return false;
        }
        if self.is_open() {
            return false;
        }
        self.state = PickerState::Open;
        self.query.clear();
        self.custom_text.clear();
        self.highlighted = 0;
        true
    }

    pub fn set_query(&mut self, query: &str) {
        if !self.is_open() {
            return;
        }
        self.query = query.to_string();
        self.highlighted = 0;
    }

    /// Override the text a custom entry will carry. Defaults to the query.
    pub fn set_custom_text(&mut self, text: &str) {
        if self.is_open() {
            self.custom_text = text.to_string();
        }
    }

    /// Matching options for the current query, capped by `max_visible`.
    pub fn visible(&self) -> Vec<&PickOption<V>> {
        let mut matching = search::filter(&self.options, &self.query, &self.config.search_fields);
        if let Some(cap) = self.config.max_visible {
            matching.truncate(cap);
        }
        matching
    }

    /// Visible options bucketed by the configured group key.
    pub fn grouped(&self) -> Option<Groups<'_, V>> {
        let visible = self.visible();
        group::group_by(&visible, self.config.group_key.as_deref())
    }

    /// Visible options in display order: bucket by bucket when grouped.
    pub fn display_order(&self) -> Vec<&PickOption<V>> {
        match self.grouped() {
            Some(groups) => groups.flatten(),
            None => self.visible(),
        }
    }

    pub fn highlighted_option(&self) -> Option<&PickOption<V>> {
        self.display_order().get(self.highlighted).copied()
    }

    pub fn move_highlight(&mut self, delta: isize) {
        let len = self.display_order().len() as isize;
        if len == 0 {
            self.highlighted = 0;
            return;
        }
        let mut index = self.highlighted as isize + delta;
        if index < 0 {
            index = 0;
        } else if index >= len {
            index = len - 1;
        }
        self.highlighted = index as usize;
    }

    /// Text a custom entry would carry right now, when one is offered.
    pub fn custom_candidate(&self) -> Option<String> {
        if !self.is_open() || !self.config.allow_custom {
            return None;
        }
        if !search::filter(&self.options, &self.query, &self.config.search_fields).is_empty() {
            return None;
        }
        let source = if self.custom_text.trim().is_empty() {
            &self.query
        } else {
            &self.custom_text
        };
        let trimmed = source.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn confirm<L>(&mut self, option: &PickOption<V>, listener: &mut L) -> bool
    where
        L: PickerListener<V> + ?Sized,
    {
        if !self.is_open() {
            debug!("confirm while closed ignored");
            return false;
        }
        let value = option.value.clone();
        self.selection = Some(Selection::Value(value.clone()));
        self.close();
        listener.on_select(option, &value);
        true
    }

    pub fn confirm_highlighted<L>(&mut self, listener: &mut L) -> bool
    where
        L: PickerListener<V> + ?Sized,
    {
        match self.highlighted_option().cloned() {
            Some(option) => self.confirm(&option, listener),
            None => self.confirm_custom(listener),
        }
    }

    pub fn confirm_custom<L>(&mut self, listener: &mut L) -> bool
    where
        L: PickerListener<V> + ?Sized,
    {
        let Some(text) = self.custom_candidate() else {
            debug!("custom entry not offered");
            return false;
        };
        self.selection = Some(Selection::Custom(text.clone()));
        self.close();
        listener.on_custom(&text);
        true
    }

    pub fn dismiss<L>(&mut self, listener: &mut L) -> bool
    where
        L: PickerListener<V> + ?Sized,
    {
        if !self.is_open() {
            return false;
        }
        self.close();
        listener.on_dismiss();
        true
    }

    pub fn reset(&mut self) {
        self.selection = None;
    }

    fn close(&mut self) {
        self.state = PickerState::Closed;
        self.custom_text.clear();
    }
}
