//! Searchable option picker: filter, group and select over in-memory lists.

pub mod catalog;
pub mod config;
pub mod group;
pub mod logging;
pub mod option;
pub mod picker;
pub mod search;
pub mod ui;

pub use group::{group, group_by, GroupName, Groups};
pub use option::{PickOption, Scalar, SearchField};
pub use picker::{Picker, PickerConfig, PickerListener, PickerState, Selection};
pub use search::filter;
