//! Text normalization for roster headers and numeric range cells.
//!
//! Roster documents in the wild mix accented and unaccented headers
//! ("Função" vs "Funcao"), inconsistent casing, and decimal commas in
//! the range column. Everything that compares or parses cell text goes
//! through here.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex matching the first decimal number in a cell, with either a
/// dot or a comma as the decimal separator.
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").unwrap());

/// Regex matching a `{{KEY}}` placeholder token.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[A-Za-z0-9_]+\}\}").unwrap());

/// Fold a header cell for comparison.
///
/// Decomposes to NFKD and drops combining marks (so "Função" and
/// "Funcao" compare equal), lowercases, keeps only alphanumerics and
/// whitespace, and collapses whitespace runs to single spaces.
pub fn fold_header(text: &str) -> String {
    text.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the first number out of a range cell.
///
/// Accepts plain numbers (`12.34`), decimal commas (`12,34`), and
/// numbers embedded in label text (`ALCANCE: 12,34 m`). Returns `None`
/// when the cell contains no number.
pub fn parse_range(text: &str) -> Option<f64> {
    let m = NUMBER_REGEX.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

/// Find `{{KEY}}` tokens still present in text after substitution.
///
/// Used to warn about template placeholders the roster did not fill.
pub fn unresolved_tokens(text: &str) -> Vec<String> {
    TOKEN_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
