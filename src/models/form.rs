//! Form field collections used by the login handshake.

use std::collections::BTreeMap;

use serde::Serialize;

/// Hidden `name -> value` pairs harvested from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HiddenFieldSet {
    fields: BTreeMap<String, String>,
}

impl HiddenFieldSet {
    /// Record a value unless the name was already seen.
    pub fn insert_first(&mut self, name: &str, value: &str) {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }

    /// Record a value, replacing any earlier one.
    pub fn insert_replacing(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The full set of fields submitted by the login postback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormPayload {
    fields: BTreeMap<String, String>,
}

impl FormPayload {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of the payload with the named field's value masked.
    pub fn masked(&self, secret_field: &str) -> Self {
        let mut copy = self.clone();
        if let Some(value) = copy.fields.get_mut(secret_field) {
            *value = "********".to_string();
        }
        copy
    }
}
