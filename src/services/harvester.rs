// src/services/harvester.rs

//! Hidden field harvesting from the login page.

use scraper::Html;

use crate::models::HiddenFieldSet;
use crate::utils::html::parse_selector;

/// What the handshake needs to know about the login page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPage {
    pub hidden_fields: HiddenFieldSet,
    /// `action` of the first form; `None` when the page has no form
    pub form_action: Option<String>,
}

impl LoginPage {
    pub fn parse(html: &str, preferred: &[String]) -> Self {
        let document = Html::parse_document(html);
        Self {
            hidden_fields: harvest(&document, preferred),
            form_action: form_action(&document),
        }
    }
}

/// Collect `name -> value` pairs of hidden inputs.
///
/// Inputs missing a name or a value are skipped. Names in `preferred` keep
/// their last occurrence; every other name keeps its first.
pub fn harvest_hidden_fields(html: &str, preferred: &[String]) -> HiddenFieldSet {
    harvest(&Html::parse_document(html), preferred)
}

fn harvest(document: &Html, preferred: &[String]) -> HiddenFieldSet {
    let mut fields = HiddenFieldSet::default();
    let selector = match parse_selector("input") {
        Ok(sel) => sel,
        Err(e) => {
            log::error!("Hidden field harvest skipped: {e}");
            return fields;
        }
    };

    for input in document.select(&selector) {
        let element = input.value();
        let is_hidden = element
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
        if !is_hidden {
            continue;
        }
        let (Some(name), Some(value)) = (element.attr("name"), element.attr("value")) else {
            continue;
        };
        if name.is_empty() || value.is_empty() {
            continue;
        }

        if preferred.iter().any(|p| p == name) {
            fields.insert_replacing(name, value);
        } else {
            fields.insert_first(name, value);
        }
    }

    log::debug!("Harvested {} hidden fields", fields.len());
    fields
}

fn form_action(document: &Html) -> Option<String> {
    let selector = parse_selector("form").ok()?;
    let form = document.select(&selector).next()?;
    Some(form.value().attr("action").unwrap_or("").trim().to_string())
}
