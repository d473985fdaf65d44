// src/utils/html.rs

//! HTML helpers shared by the handshake and the extractor.

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Text content of an element with whitespace collapsed and trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Attribute selector matching an exact `id`.
pub fn id_selector(tag: &str, id: &str) -> String {
    format!("{tag}[id=\"{}\"]", escape_attr(id))
}

/// Attribute selector matching an `id` ending with `suffix`.
pub fn id_suffix_selector(tag: &str, suffix: &str) -> String {
    format!("{tag}[id$=\"{}\"]", escape_attr(suffix))
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
