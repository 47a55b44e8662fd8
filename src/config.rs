use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::option::SearchField;
use crate::picker::PickerConfig;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "unipick";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the configuration was read from (or would be, when absent)
    pub config_path: PathBuf,
    pub picker: PickerConfig,
    pub keys: Keys,
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        ConfigFile::default().into_config(PathBuf::new())
    }
}

// =============================================================================
// UI Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub placeholder: String,
    pub empty_message: String,
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header: RgbColor,
    pub muted: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key bindings
// =============================================================================

/// Key bindings organized by picker state
#[derive(Debug, Clone)]
pub struct Keys {
    /// Keys while the dropdown is closed
    pub closed: ClosedKeys,
    /// Keys while the dropdown is open and the query has focus
    pub open: OpenKeys,
}

#[derive(Debug, Clone)]
pub struct ClosedKeys {
    pub open: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OpenKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            closed: ClosedKeys::default(),
            open: OpenKeys::default(),
        }
    }
}

impl Default for ClosedKeys {
    fn default() -> Self {
        Self {
            open: vec!["Enter".into(), "Space".into()],
            reset: vec!["x".into()],
            quit: vec!["q".into(), "Escape".into()],
        }
    }
}

impl Default for OpenKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            confirm: vec!["Enter".into()],
            next: vec!["Down".into(), "Tab".into()],
            prev: vec!["Up".into(), "Backtab".into()],
            page_down: vec!["PageDown".into()],
            page_up: vec!["PageUp".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    closed: ClosedKeysFile,
    open: OpenKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClosedKeysFile {
    open: KeyBinding,
    reset: KeyBinding,
    quit: KeyBinding,
}

impl Default for ClosedKeysFile {
    fn default() -> Self {
        let defaults = ClosedKeys::default();
        Self {
            open: KeyBinding::Multiple(defaults.open),
            reset: KeyBinding::Multiple(defaults.reset),
            quit: KeyBinding::Multiple(defaults.quit),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OpenKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
    page_down: KeyBinding,
    page_up: KeyBinding,
}

impl Default for OpenKeysFile {
    fn default() -> Self {
        let defaults = OpenKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            page_down: KeyBinding::Multiple(defaults.page_down),
            page_up: KeyBinding::Multiple(defaults.page_up),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            closed: ClosedKeys {
                open: file.closed.open.into_vec(),
                reset: file.closed.reset.into_vec(),
                quit: file.closed.quit.into_vec(),
            },
            open: OpenKeys {
                cancel: file.open.cancel.into_vec(),
                confirm: file.open.confirm.into_vec(),
                next: file.open.next.into_vec(),
                prev: file.open.prev.into_vec(),
                page_down: file.open.page_down.into_vec(),
                page_up: file.open.page_up.into_vec(),
            },
        }
    }
}

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'X' means Shift+x, different from 'x').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Check for collisions within a single context
fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    check_context_collisions(
        &[
            ("open", &keys.closed.open),
            ("reset", &keys.closed.reset),
            ("quit", &keys.closed.quit),
        ],
        "closed",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.open.cancel),
            ("confirm", &keys.open.confirm),
            ("next", &keys.open.next),
            ("prev", &keys.open.prev),
            ("page_down", &keys.open.page_down),
            ("page_up", &keys.open.page_up),
        ],
        "open",
    )?;

    // Printable characters go to the query input while open.
    for key in keys
        .open
        .cancel
        .iter()
        .chain(&keys.open.confirm)
        .chain(&keys.open.next)
        .chain(&keys.open.prev)
        .chain(&keys.open.page_down)
        .chain(&keys.open.page_up)
    {
        if key.trim().chars().count() == 1 {
            bail!(
                "[keys.open] binding '{}' is a printable character and would shadow typing",
                key
            );
        }
    }

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    picker: PickerFile,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PickerFile {
    allow_custom: bool,
    disabled: bool,
    search_fields: Vec<String>,
    group_key: Option<String>,
    max_visible: Option<usize>,
}

impl Default for PickerFile {
    fn default() -> Self {
        Self {
            allow_custom: false,
            disabled: false,
            search_fields: vec!["label".to_string()],
            group_key: None,
            max_visible: None,
        }
    }
}

impl PickerFile {
    fn validate(&self) -> Result<()> {
        if self.max_visible == Some(0) {
            bail!("picker.max_visible must be at least 1");
        }
        if self.search_fields.iter().any(|f| f.trim().is_empty()) {
            bail!("picker.search_fields must not contain empty names");
        }
        Ok(())
    }
}

impl From<PickerFile> for PickerConfig {
    fn from(file: PickerFile) -> Self {
        let search_fields = if file.search_fields.is_empty() {
            SearchField::defaults()
        } else {
            file.search_fields
                .iter()
                .map(|name| SearchField::parse(name))
                .collect()
        };
        let group_key = file
            .group_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        PickerConfig {
            disabled: file.disabled,
            allow_custom: file.allow_custom,
            search_fields,
            group_key,
            max_visible: file.max_visible,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiFile {
    placeholder: String,
    empty_message: String,
    colors: UiColorsFile,
}

impl Default for UiFile {
    fn default() -> Self {
        Self {
            placeholder: "Select an option".to_string(),
            empty_message: "No results found".to_string(),
            colors: UiColorsFile::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header: RgbColor,
    muted: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(0, 150, 90),
            selection_bg: RgbColor::new(0, 150, 90),
            selection_fg: RgbColor::new(255, 255, 255),
            header: RgbColor::new(0, 190, 120),
            muted: RgbColor::new(140, 140, 140),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            placeholder: file.placeholder,
            empty_message: file.empty_message,
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                header: file.colors.header,
                muted: file.colors.muted,
            },
        }
    }
}

impl ConfigFile {
    fn into_config(self, config_path: PathBuf) -> Config {
        Config {
            config_path,
            picker: self.picker.into(),
            keys: self.keys.into(),
            ui: self.ui.into(),
        }
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load from `path`, or from the default location when `None`.
///
/// A missing file yields the defaults; every setting is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        debug!(path = %path.display(), "no configuration file, using defaults");
        return Ok(ConfigFile::default().into_config(path));
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, path)
}

fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    cfg_file.picker.validate()?;

    let config = cfg_file.into_config(path);
    validate_key_bindings(&config.keys)?;
    Ok(config)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in_context(value, "", &["picker", "keys", "ui"]);

    if let Some(picker) = table.get("picker") {
        warn_unknown_in_context(
            picker,
            "picker",
            &[
                "allow_custom",
                "disabled",
                "search_fields",
                "group_key",
                "max_visible",
            ],
        );
    }

    if let Some(keys) = table.get("keys") {
        warn_unknown_in_context(keys, "keys", &["closed", "open"]);
        if let Some(closed) = keys.get("closed") {
            warn_unknown_in_context(closed, "keys.closed", &["open", "reset", "quit"]);
        }
        if let Some(open) = keys.get("open") {
            warn_unknown_in_context(
                open,
                "keys.open",
                &["cancel", "confirm", "next", "prev", "page_down", "page_up"],
            );
        }
    }

    if let Some(ui) = table.get("ui") {
        warn_unknown_in_context(ui, "ui", &["placeholder", "empty_message", "colors"]);
        if let Some(colors) = ui.get("colors") {
            warn_unknown_in_context(
                colors,
                "ui.colors",
                &["border", "selection_bg", "selection_fg", "header", "muted"],
            );
        }
    }
}

fn warn_unknown_in_context(value: &toml::Value, context: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            if context.is_empty() {
                warn!("unknown configuration key `{}`", key);
            } else {
                warn!("unknown configuration key `{}.{}`", context, key);
            }
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
            Hex(String),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Array(values) => Ok(RgbColor::new(values[0], values[1], values[2])),
            Helper::Map { r, g, b } => Ok(RgbColor::new(r, g, b)),
            Helper::Hex(hex) => RgbColor::from_hex(&hex).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid colour `{}`, expected #rrggbb", hex))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(raw: &str) -> Result<Config> {
        parse(raw, PathBuf::from("test.toml"))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_str("").unwrap();
        assert_eq!(config.picker, PickerConfig::default());
        assert_eq!(config.keys.open.confirm, vec!["Enter"]);
        assert_eq!(config.ui.placeholder, "Select an option");
    }

    #[test]
    fn picker_section_maps_to_picker_config() {
        let config = parse_str(
            r#"
            [picker]
            allow_custom = true
            search_fields = ["label", "city"]
            group_key = " type "
            max_visible = 25
            "#,
        )
        .unwrap();
        assert!(config.picker.allow_custom);
        assert_eq!(
            config.picker.search_fields,
            vec![SearchField::Label, SearchField::Meta("city".into())]
        );
        assert_eq!(config.picker.group_key.as_deref(), Some("type"));
        assert_eq!(config.picker.max_visible, Some(25));
    }

    #[test]
    fn zero_max_visible_is_rejected() {
        assert!(parse_str("[picker]\nmax_visible = 0\n").is_err());
    }

    #[test]
    fn single_string_key_binding() {
        let config = parse_str("[keys.closed]\nreset = \"d\"\n").unwrap();
        assert_eq!(config.keys.closed.reset, vec!["d"]);
        assert_eq!(config.keys.closed.open, vec!["Enter", "Space"]);
    }

    #[test]
    fn key_collisions_are_rejected() {
        let err = parse_str("[keys.open]\nnext = [\"Enter\"]\n").unwrap_err();
        assert!(err.to_string().contains("collision"));
    }

    #[test]
    fn printable_keys_rejected_while_open() {
        assert!(parse_str("[keys.open]\nnext = [\"j\"]\n").is_err());
    }

    #[test]
    fn colours_accept_hex_array_and_map() {
        let config = parse_str(
            r##"
            [ui.colors]
            border = "#0a1B2c"
            header = [1, 2, 3]
            muted = { r = 4, g = 5, b = 6 }
            "##,
        )
        .unwrap();
        assert_eq!(config.ui.colors.border, RgbColor::new(10, 27, 44));
        assert_eq!(config.ui.colors.header, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.muted, RgbColor::new(4, 5, 6));
        assert!(parse_str("[ui.colors]\nborder = \"orange\"\n").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = load(Some(Path::new("/nonexistent/unipick/config.toml"))).unwrap();
        assert!(!config.picker.allow_custom);
    }
}
