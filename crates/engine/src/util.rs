//! Internal helpers for name normalization.
//!
//! These utilities are **not** part of the public API. Account names and
//! aliases go through the same folding so lookups agree with the unique
//! index on `accounts.name_norm`.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim and collapse inner whitespace, keeping the original spelling.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Lookup key: whitespace-collapsed, accents stripped, lower-cased.
pub(crate) fn normalize_key(input: &str) -> String {
    let mut out = String::new();
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for ch in word.nfkd().filter(|ch| !is_combining_mark(*ch)) {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Single-token form of [`normalize_key`]: inner spaces become `_`, so the
/// result can be typed as one word on a command line.
pub(crate) fn typed_key(input: &str) -> String {
    normalize_key(input).replace(' ', "_")
}

/// Validate an account name and return `(display, key)`.
pub(crate) fn normalize_account_name(input: &str) -> ResultEngine<(String, String)> {
    let display = normalize_display(input)
        .ok_or_else(|| EngineError::InvalidName("account name must not be empty".to_string()))?;
    let key = normalize_key(&display);
    Ok((display, key))
}
