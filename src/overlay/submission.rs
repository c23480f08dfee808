//! Submitted profile form data

use std::collections::HashMap;

/// Fields posted by the profile-edit form
///
/// Only raw values are kept here; sanitation happens on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSubmission {
    fields: HashMap<String, String>,
}

impl ProfileSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one posted field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build from name/value pairs; later duplicates win
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` request body
    pub fn from_urlencoded(body: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body.as_bytes()).into_owned())
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
}
