//! The sanitization pass.
//!
//! Icon libraries published around 2021-2022 carry element properties that
//! current Excalidraw releases reject with "invalid file". [`Sanitizer`]
//! strips them in a single pass over the element list:
//!
//! 1. Optionally drop text labels that are not part of the original diagram.
//! 2. Remove deprecated properties from every element.
//! 3. Remove arrowhead properties from `line` elements.
//! 4. Replace empty `boundElements` arrays with `null`.

use std::fmt;

use log::{debug, trace};
use serde_json::Value;

use crate::{
    config::SanitizeRules,
    document::{Element, ElementKind},
    original_ids::OriginalIds,
};

const BOUND_ELEMENTS_KEY: &str = "boundElements";

/// Counters collected during one sanitization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    /// Deprecated and line-only properties removed.
    pub deprecated_removed: usize,
    /// Icon library text labels removed.
    pub text_removed: usize,
    /// Empty `boundElements` arrays replaced with `null`.
    pub empty_bound_fixed: usize,
}

impl SanitizeStats {
    /// Returns `true` if the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Returns the total number of changes.
    pub fn total(&self) -> usize {
        self.deprecated_removed + self.text_removed + self.empty_bound_fixed
    }
}

impl fmt::Display for SanitizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Deprecated properties removed: {}",
            self.deprecated_removed
        )?;
        writeln!(f, "  Icon text labels removed: {}", self.text_removed)?;
        write!(f, "  Empty boundElements fixed: {}", self.empty_bound_fixed)
    }
}

/// Applies [`SanitizeRules`] to diagram elements.
///
/// # Examples
///
/// ```
/// use diagram_sanitize::{Element, OriginalIds, Sanitizer};
/// use serde_json::json;
///
/// let elements = vec![
///     Element::from_value(json!({"id": "a1", "type": "line", "baseline": 0})).unwrap(),
///     Element::from_value(json!({"id": "icon1", "type": "text"})).unwrap(),
/// ];
/// let ids = OriginalIds::from_iter(["a1"]);
///
/// let (elements, stats) = Sanitizer::default().sanitize(elements, Some(&ids), true);
/// assert_eq!(elements.len(), 1);
/// assert_eq!(stats.deprecated_removed, 1);
/// assert_eq!(stats.text_removed, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    rules: SanitizeRules,
}

impl Sanitizer {
    /// Create a sanitizer with the given rules.
    pub fn new(rules: SanitizeRules) -> Self {
        Self { rules }
    }

    /// Returns the rules this sanitizer applies.
    pub fn rules(&self) -> &SanitizeRules {
        &self.rules
    }

    /// Sanitize `elements`, returning the survivors in their original order.
    ///
    /// Text removal only happens when `remove_icon_text` is set and
    /// `original_ids` is a non-empty set; otherwise every element is kept and
    /// only the property fixes apply.
    ///
    /// # Arguments
    ///
    /// * `elements` - Elements in document order
    /// * `original_ids` - Ids of elements authored in the diagram itself
    /// * `remove_icon_text` - Drop text elements whose id is not in `original_ids`
    pub fn sanitize(
        &self,
        elements: Vec<Element>,
        original_ids: Option<&OriginalIds>,
        remove_icon_text: bool,
    ) -> (Vec<Element>, SanitizeStats) {
        let mut stats = SanitizeStats::default();

        let mut elements = match original_ids {
            Some(ids) if remove_icon_text && !ids.is_empty() => {
                let before = elements.len();
                let kept: Vec<Element> = elements
                    .into_iter()
                    .filter(|element| !is_icon_text(element, ids))
                    .collect();
                stats.text_removed = before - kept.len();
                kept
            }
            _ => {
                if remove_icon_text {
                    debug!("No original ids given, keeping all text elements");
                }
                elements
            }
        };

        for element in &mut elements {
            stats.deprecated_removed += self.strip_properties(element);

            if is_empty_array(element.get(BOUND_ELEMENTS_KEY)) {
                element.insert(BOUND_ELEMENTS_KEY, Value::Null);
                stats.empty_bound_fixed += 1;
                trace!(id = element.id(); "Replaced empty boundElements with null");
            }
        }

        debug!(
            deprecated_removed = stats.deprecated_removed,
            text_removed = stats.text_removed,
            empty_bound_fixed = stats.empty_bound_fixed;
            "Sanitization pass finished"
        );

        (elements, stats)
    }

    /// Remove deprecated properties, and arrowheads from lines. Returns the
    /// number of properties removed.
    fn strip_properties(&self, element: &mut Element) -> usize {
        let line_only: &[String] = if element.kind() == ElementKind::Line {
            self.rules.line_only_properties()
        } else {
            &[]
        };

        let mut removed = 0;
        for property in self.rules.deprecated_properties().iter().chain(line_only) {
            if element.remove(property).is_some() {
                trace!(id = element.id(), property = property.as_str(); "Removed property");
                removed += 1;
            }
        }
        removed
    }
}

/// Sanitize `elements` with the default rules.
///
/// See [`Sanitizer::sanitize`].
pub fn sanitize(
    elements: Vec<Element>,
    original_ids: Option<&OriginalIds>,
    remove_icon_text: bool,
) -> (Vec<Element>, SanitizeStats) {
    Sanitizer::default().sanitize(elements, original_ids, remove_icon_text)
}

fn is_icon_text(element: &Element, original_ids: &OriginalIds) -> bool {
    element.kind() == ElementKind::Text && !original_ids.contains(element.id())
}

fn is_empty_array(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Array(items)) if items.is_empty())
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use serde_json::{Map, json};

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn kind_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["line", "arrow", "text", "rectangle", "ellipse", "frame"])
    }

    fn optional_field_strategy() -> impl Strategy<Value = Option<Value>> {
        prop::option::of(prop_oneof![
            Just(Value::Null),
            Just(json!("sharp")),
            Just(json!(0)),
            Just(json!("triangle")),
        ])
    }

    fn bound_strategy() -> impl Strategy<Value = Option<Value>> {
        prop::option::of(prop_oneof![
            Just(json!([])),
            Just(Value::Null),
            Just(json!([{"id": "bound", "type": "text"}])),
        ])
    }

    fn element_strategy() -> impl Strategy<Value = Element> {
        (
            0u8..12,
            kind_strategy(),
            optional_field_strategy(),
            optional_field_strategy(),
            optional_field_strategy(),
            optional_field_strategy(),
            bound_strategy(),
        )
            .prop_map(|(id, kind, sharpness, baseline, start, end, bound)| {
                let mut fields = Map::new();
                fields.insert("id".to_string(), json!(format!("el{id}")));
                fields.insert("type".to_string(), json!(kind));
                let optional = [
                    ("strokeSharpness", sharpness),
                    ("baseline", baseline),
                    ("startArrowhead", start),
                    ("endArrowhead", end),
                    ("boundElements", bound),
                ];
                for (key, value) in optional {
                    if let Some(value) = value {
                        fields.insert(key.to_string(), value);
                    }
                }
                Element::from_value(Value::Object(fields)).expect("generated element is valid")
            })
    }

    fn elements_strategy() -> impl Strategy<Value = Vec<Element>> {
        prop::collection::vec(element_strategy(), 0..24)
    }

    fn ids_strategy() -> impl Strategy<Value = OriginalIds> {
        prop::collection::hash_set((0u8..12).prop_map(|id| format!("el{id}")), 0..8)
            .prop_map(|ids| ids.into_iter().collect::<OriginalIds>())
    }

    // ===================
    // Property Test Functions
    // ===================

    /// No surviving element carries a deprecated property, and no line carries arrowheads.
    fn check_properties_stripped(
        elements: Vec<Element>,
        ids: OriginalIds,
        remove: bool,
    ) -> Result<(), TestCaseError> {
        let (output, _) = sanitize(elements, Some(&ids), remove);
        for element in &output {
            prop_assert!(!element.contains("strokeSharpness"));
            prop_assert!(!element.contains("baseline"));
            if element.kind() == ElementKind::Line {
                prop_assert!(!element.contains("startArrowhead"));
                prop_assert!(!element.contains("endArrowhead"));
            }
        }
        Ok(())
    }

    /// Empty `boundElements` become null, everything else is untouched.
    fn check_bound_elements(elements: Vec<Element>) -> Result<(), TestCaseError> {
        let before: Vec<Option<Value>> = elements
            .iter()
            .map(|element| element.get("boundElements").cloned())
            .collect();
        let (output, stats) = sanitize(elements, None, false);

        prop_assert_eq!(output.len(), before.len());
        let mut fixed = 0;
        for (element, before) in output.iter().zip(before) {
            let after = element.get("boundElements").cloned();
            if is_empty_array(before.as_ref()) {
                prop_assert_eq!(after, Some(Value::Null));
                fixed += 1;
            } else {
                prop_assert_eq!(after, before);
            }
        }
        prop_assert_eq!(stats.empty_bound_fixed, fixed);
        Ok(())
    }

    /// Only icon text is removed, original text is kept, and order is stable.
    fn check_text_filter(elements: Vec<Element>, ids: OriginalIds) -> Result<(), TestCaseError> {
        let expected: Vec<String> = elements
            .iter()
            .filter(|element| {
                ids.is_empty() || element.kind() != ElementKind::Text || ids.contains(element.id())
            })
            .map(|element| element.id().to_string())
            .collect();
        let before = elements.len();

        let (output, stats) = sanitize(elements, Some(&ids), true);

        let actual: Vec<String> = output.iter().map(|e| e.id().to_string()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(stats.text_removed, before - output.len());
        Ok(())
    }

    /// A second pass over sanitized output changes nothing.
    fn check_idempotent(
        elements: Vec<Element>,
        ids: OriginalIds,
        remove: bool,
    ) -> Result<(), TestCaseError> {
        let (once, _) = sanitize(elements, Some(&ids), remove);
        let (twice, stats) = sanitize(once.clone(), Some(&ids), remove);
        prop_assert!(stats.is_clean(), "second pass reported {:?}", stats);
        prop_assert_eq!(once, twice);
        Ok(())
    }

    proptest! {
        #[test]
        fn properties_stripped(elements in elements_strategy(), ids in ids_strategy(), remove in any::<bool>()) {
            check_properties_stripped(elements, ids, remove)?;
        }

        #[test]
        fn bound_elements_normalized(elements in elements_strategy()) {
            check_bound_elements(elements)?;
        }

        #[test]
        fn text_filter_is_stable(elements in elements_strategy(), ids in ids_strategy()) {
            check_text_filter(elements, ids)?;
        }

        #[test]
        fn sanitize_is_idempotent(elements in elements_strategy(), ids in ids_strategy(), remove in any::<bool>()) {
            check_idempotent(elements, ids, remove)?;
        }
    }
}
