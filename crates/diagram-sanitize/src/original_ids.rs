//! The set of element ids that belong to the diagram before icons are merged.

use std::collections::HashSet;

use log::debug;

use crate::{document::Document, error::SanitizeError};

/// Ids of elements authored in the diagram itself.
///
/// Text elements whose id is missing from this set are treated as labels
/// that came in with an icon library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalIds(HashSet<String>);

impl OriginalIds {
    /// Parse a JSON array of strings.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Json`] for invalid JSON and
    /// [`SanitizeError::MalformedInput`] if the value is not an array of strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use diagram_sanitize::OriginalIds;
    ///
    /// let ids = OriginalIds::parse(r#"["a1", "a2"]"#).expect("valid id list");
    /// assert!(ids.contains("a1"));
    /// assert_eq!(ids.len(), 2);
    /// ```
    pub fn parse(source: &str) -> Result<Self, SanitizeError> {
        let value: serde_json::Value = serde_json::from_str(source)
            .map_err(|err| SanitizeError::new_json_error(err, source))?;

        let ids: Vec<String> = serde_json::from_value(value).map_err(|err| {
            SanitizeError::malformed(format!("original ids must be an array of strings: {err}"))
        })?;

        debug!(ids = ids.len(); "Original ids loaded");
        Ok(ids.into_iter().collect())
    }

    /// Capture the ids of every element currently in `document`.
    pub fn from_document(document: &Document) -> Self {
        document
            .elements()
            .iter()
            .map(|element| element.id().to_string())
            .collect()
    }

    /// Returns `true` if `id` belongs to the original diagram.
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns the number of ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no ids.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize the ids as a sorted JSON array.
    pub fn to_json_string(&self) -> String {
        let mut ids: Vec<&str> = self.0.iter().map(String::as_str).collect();
        ids.sort_unstable();
        serde_json::Value::from(ids).to_string()
    }
}

impl<S: Into<String>> FromIterator<S> for OriginalIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
