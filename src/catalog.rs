//! Loading option lists from catalog files.
//!
//! A catalog is a JSON or TOML document listing options. The logo importer
//! turns a university CSV export into the same shape.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::option::{PickOption, Scalar};

const NAME_COLUMN: &str = "university_name";
const LOGO_COLUMN: &str = "logo_url";

/// Logo URLs containing any of these are placeholders or scraped junk.
const INVALID_LOGO_MARKERS: [&str; 4] = ["#/media", "data:image", "Not have", "Dangerous"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported catalog format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),
    #[error("option #{index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("option #{index} has an empty label")]
    EmptyLabel { index: usize },
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV is missing the `{0}` column")]
    MissingColumn(&'static str),
}

/// One option as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Scalar>,
}

impl CatalogEntry {
    fn into_option(self) -> PickOption<String> {
        let value = self.value.unwrap_or_else(|| self.label.clone());
        let mut option = PickOption::new(self.label, value);
        if let Some(id) = self.id {
            option = option.with_id(id);
        }
        option.subtitle = self.subtitle;
        option.icon = self.icon;
        option.metadata = self.metadata;
        option
    }
}

impl From<&PickOption<String>> for CatalogEntry {
    fn from(option: &PickOption<String>) -> Self {
        Self {
            label: option.label.clone(),
            value: Some(option.value.clone()),
            id: option.id().map(str::to_string),
            subtitle: option.subtitle.clone(),
            icon: option.icon.clone(),
            metadata: option.metadata.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    options: Vec<CatalogEntry>,
}

/// JSON document form; entries stay raw so each one reports its own index.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonDocument {
    options: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Toml,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(CatalogFormat::Json),
            "toml" => Ok(CatalogFormat::Toml),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn load(path: &Path) -> Result<Vec<PickOption<String>>, CatalogError> {
    let format = CatalogFormat::from_path(path)?;
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = parse(&raw, format)?;
    info!(path = %path.display(), count = options.len(), "loaded catalog");
    Ok(options)
}

pub fn parse(raw: &str, format: CatalogFormat) -> Result<Vec<PickOption<String>>, CatalogError> {
    let entries = match format {
        CatalogFormat::Json => json_entries(raw)?,
        CatalogFormat::Toml => toml::from_str::<CatalogFile>(raw)?.options,
    };

    let mut seen = HashSet::new();
    let mut options = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if entry.label.trim().is_empty() {
            return Err(CatalogError::EmptyLabel { index });
        }
        let option = entry.into_option();
        if !seen.insert(option.value.clone()) {
            warn!(value = %option.value, "duplicate option value in catalog");
        }
        options.push(option);
    }
    Ok(options)
}

fn json_entries(raw: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let items = match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Array(items) => items,
        doc => serde_json::from_value::<JsonDocument>(doc)?.options,
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|source| CatalogError::InvalidEntry { index, source })
        })
        .collect()
}

pub fn to_json(options: &[PickOption<String>]) -> Result<String, CatalogError> {
    let file = CatalogFile {
        options: options.iter().map(CatalogEntry::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Strip everything but ASCII letters and digits.
pub fn short_key(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

pub fn is_valid_logo_url(url: &str) -> bool {
    !url.is_empty() && !INVALID_LOGO_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Build options from a `university_name,logo_url` CSV export.
///
/// Rows without a usable logo are skipped, a repeated name keeps its last
/// row, and the result is sorted by name.
pub fn import_logos<R: Read>(reader: R) -> Result<Vec<PickOption<String>>, CatalogError> {
    let mut rows = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rows.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(CatalogError::MissingColumn(name))
    };
    let name_idx = column(NAME_COLUMN)?;
    let logo_idx = column(LOGO_COLUMN)?;

    let mut logos: BTreeMap<String, String> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in rows.records() {
        let record = record?;
        let name = record.get(name_idx).unwrap_or_default().trim();
        let url = record.get(logo_idx).unwrap_or_default().trim();
        if name.is_empty() || !is_valid_logo_url(url) {
            skipped += 1;
            continue;
        }
        logos.insert(name.to_string(), url.to_string());
    }

    info!(kept = logos.len(), skipped, "imported university logos");

    Ok(logos
        .into_iter()
        .map(|(name, url)| PickOption::new(name.clone(), short_key(&name)).with_icon(url))
        .collect())
}
