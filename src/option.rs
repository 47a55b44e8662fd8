//! Option records offered by the picker.
//!
//! An option carries a display label, a generic value and optional
//! subtitle, icon and metadata. Metadata holds loosely typed scalars that
//! the filter and grouping stages look up by name.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata value attached to an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Text form used for matching and bucket names.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::String(s) => Cow::Borrowed(s.as_str()),
            Scalar::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Scalar::Number(n) => Cow::Owned(format_number(*n)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

// Integral values print without a fractional part so "2024" matches 2024.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A field an option can be searched by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchField {
    Label,
    Meta(String),
}

impl SearchField {
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("label") {
            SearchField::Label
        } else {
            SearchField::Meta(trimmed.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchField::Label => "label",
            SearchField::Meta(name) => name,
        }
    }

    pub fn defaults() -> Vec<SearchField> {
        vec![SearchField::Label]
    }
}

impl From<&str> for SearchField {
    fn from(value: &str) -> Self {
        SearchField::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickOption<V> {
    id: Option<String>,
    pub label: String,
    pub value: V,
    pub subtitle: Option<String>,
    pub icon: Option<String>,
    pub metadata: BTreeMap<String, Scalar>,
}

impl<V> PickOption<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            id: None,
            label: label.into(),
            value,
            subtitle: None,
            icon: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Explicit id, when one was given.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn meta(&self, key: &str) -> Option<&Scalar> {
        self.metadata.get(key)
    }

    /// Text of a searchable field, or `None` when the option lacks it.
    pub fn field(&self, field: &SearchField) -> Option<Cow<'_, str>> {
        match field {
            SearchField::Label => Some(Cow::Borrowed(self.label.as_str())),
            SearchField::Meta(name) => self.metadata.get(name).map(Scalar::as_text),
        }
    }
}

impl<V: fmt::Display> PickOption<V> {
    /// Explicit id, or the value's text when none was given.
    pub fn key(&self) -> Cow<'_, str> {
        match &self.id {
            Some(id) => Cow::Borrowed(id.as_str()),
            None => Cow::Owned(self.value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_text_forms() {
        assert_eq!(Scalar::from("Lahore").as_text(), "Lahore");
        assert_eq!(Scalar::from(true).as_text(), "true");
        assert_eq!(Scalar::from(2024_i64).as_text(), "2024");
        assert_eq!(Scalar::from(3.5).as_text(), "3.5");
    }

    #[test]
    fn search_field_parsing() {
        assert_eq!(SearchField::parse("label"), SearchField::Label);
        assert_eq!(SearchField::parse(" Label "), SearchField::Label);
        assert_eq!(
            SearchField::parse("city"),
            SearchField::Meta("city".to_string())
        );
    }

    #[test]
    fn key_falls_back_to_value() {
        let plain = PickOption::new("NUST", "nust");
        assert_eq!(plain.key(), "nust");

        let explicit = PickOption::new("NUST", "nust").with_id("uni-1");
        assert_eq!(explicit.key(), "uni-1");
    }

    #[test]
    fn missing_metadata_field_is_none() {
        let option = PickOption::new("FAST", "fast").with_meta("city", "Islamabad");
        assert_eq!(
            option.field(&SearchField::Meta("city".into())).as_deref(),
            Some("Islamabad")
        );
        assert!(option.field(&SearchField::Meta("sector".into())).is_none());
    }
}
