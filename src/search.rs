use crate::option::{PickOption, SearchField};

/// Normalize a string for matching.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// True when any of `fields` contains the already normalized `needle`.
pub fn matches<V>(option: &PickOption<V>, needle: &str, fields: &[SearchField]) -> bool {
    fields.iter().any(|field| {
        option
            .field(field)
            .map(|text| normalize(&text).contains(needle))
            .unwrap_or(false)
    })
}

/// Keep the options whose fields contain `query`, in input order.
///
/// A blank query keeps everything. An empty `fields` slice searches the
/// label only.
pub fn filter<'a, V>(
    options: &'a [PickOption<V>],
    query: &str,
    fields: &[SearchField],
) -> Vec<&'a PickOption<V>> {
    let Some(needle) = normalize_query(query) else {
        return options.iter().collect();
    };

    let default_fields;
    let fields = if fields.is_empty() {
        default_fields = SearchField::defaults();
        &default_fields[..]
    } else {
        fields
    };

    options
        .iter()
        .filter(|option| matches(option, &needle, fields))
        .collect()
}
