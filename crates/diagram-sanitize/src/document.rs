//! Diagram document model.
//!
//! A [`Document`] is the parsed top-level JSON object of an `.excalidraw`
//! file. Its `elements` array is lifted into validated [`Element`] values;
//! every other field is kept verbatim and written back in its original
//! position.

use std::{fmt, io};

use log::{debug, trace};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{
    Map, Value,
    ser::{Formatter, PrettyFormatter},
};

use crate::{
    config::OutputConfig,
    error::SanitizeError,
    original_ids::OriginalIds,
    sanitize::{SanitizeStats, Sanitizer},
};

const ELEMENTS_KEY: &str = "elements";
const ID_KEY: &str = "id";
const TYPE_KEY: &str = "type";

/// Classification of an element's `type` tag.
///
/// Only the tags the sanitizer treats specially get their own variant;
/// everything else is carried as [`ElementKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind<'a> {
    Line,
    Arrow,
    Text,
    Other(&'a str),
}

impl<'a> ElementKind<'a> {
    /// Returns the tag as it appears in the document.
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Text => "text",
            Self::Other(tag) => tag,
        }
    }
}

impl<'a> From<&'a str> for ElementKind<'a> {
    fn from(tag: &'a str) -> Self {
        match tag {
            "line" => Self::Line,
            "arrow" => Self::Arrow,
            "text" => Self::Text,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for ElementKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagram element.
///
/// The element keeps all of its fields in their original order. Construction
/// through [`Element::from_value`] guarantees that `id` and `type` are present
/// and hold strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Element {
    fields: Map<String, Value>,
}

impl Element {
    /// Validates a JSON value as an element.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `value` is not an object or
    /// lacks a string `id` or `type`.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(fields) = value else {
            return Err(format!("expected an object, found {}", value_kind(&value)));
        };

        for key in [ID_KEY, TYPE_KEY] {
            match fields.get(key) {
                Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(format!(
                        "field `{key}` must be a string, found {}",
                        value_kind(other)
                    ));
                }
                None => return Err(format!("missing required field `{key}`")),
            }
        }

        Ok(Self { fields })
    }

    /// Returns the element id.
    pub fn id(&self) -> &str {
        self.str_field(ID_KEY)
    }

    /// Returns the element's `type` tag.
    pub fn kind(&self) -> ElementKind<'_> {
        ElementKind::from(self.str_field(TYPE_KEY))
    }

    /// Returns the value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns `true` if the element carries `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the element's fields in document order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Removes `key`, keeping the order of the remaining fields.
    ///
    /// `id` and `type` cannot be removed.
    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        if key == ID_KEY || key == TYPE_KEY {
            return None;
        }
        self.fields.shift_remove(key)
    }

    /// Replaces the value of an existing `key` in place, or appends it.
    pub(crate) fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.fields.insert(key.to_string(), value)
    }

    fn str_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}

impl TryFrom<Value> for Element {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// A parsed diagram document.
///
/// # Examples
///
/// ```
/// use diagram_sanitize::Document;
///
/// let source = r#"{"type": "excalidraw", "elements": [{"id": "a", "type": "line"}]}"#;
/// let document = Document::parse(source).expect("valid document");
/// assert_eq!(document.len(), 1);
/// assert_eq!(document.elements()[0].id(), "a");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Top-level fields; the `elements` slot holds a placeholder.
    fields: Map<String, Value>,
    elements: Vec<Element>,
}

impl Document {
    /// Parse document text and validate every element.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Json`] if `source` is not valid JSON and
    /// [`SanitizeError::MalformedInput`] if the root is not an object, the
    /// `elements` field is missing or not an array, or an element lacks a
    /// string `id` or `type`.
    pub fn parse(source: &str) -> Result<Self, SanitizeError> {
        let value: Value = serde_json::from_str(source)
            .map_err(|err| SanitizeError::new_json_error(err, source))?;

        let Value::Object(mut fields) = value else {
            return Err(SanitizeError::malformed(format!(
                "document root must be an object, found {}",
                value_kind(&value)
            )));
        };

        let raw = fields
            .get_mut(ELEMENTS_KEY)
            .map(Value::take)
            .ok_or_else(|| SanitizeError::malformed("document has no `elements` field"))?;

        let Value::Array(items) = raw else {
            return Err(SanitizeError::malformed(format!(
                "`elements` must be an array, found {}",
                value_kind(&raw)
            )));
        };

        let elements = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Element::from_value(item).map_err(|reason| {
                    SanitizeError::malformed(format!("element at index {index}: {reason}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(elements = elements.len(); "Document parsed");

        Ok(Self { fields, elements })
    }

    /// Returns the elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Moves the elements out, leaving the document empty.
    pub fn take_elements(&mut self) -> Vec<Element> {
        std::mem::take(&mut self.elements)
    }

    /// Replaces the element list.
    pub fn set_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns a top-level field other than `elements`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        if key == ELEMENTS_KEY {
            return None;
        }
        self.fields.get(key)
    }

    /// Run `sanitizer` over this document's elements.
    pub fn sanitize_with(
        &mut self,
        sanitizer: &Sanitizer,
        original_ids: Option<&OriginalIds>,
        remove_icon_text: bool,
    ) -> SanitizeStats {
        let elements = self.take_elements();
        let (elements, stats) = sanitizer.sanitize(elements, original_ids, remove_icon_text);
        self.elements = elements;
        stats
    }

    /// Serialize the document with `indent` spaces per level.
    ///
    /// Non-ASCII characters are written as `\uXXXX` escapes.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Io`] if serialization fails.
    pub fn to_json_string(&self, indent: usize) -> Result<String, SanitizeError> {
        self.write_json(indent, true)
    }

    /// Serialize the document using the configured output settings.
    ///
    /// # Errors
    ///
    /// See [`Document::to_json_string`].
    pub fn render(&self, output: &OutputConfig) -> Result<String, SanitizeError> {
        self.write_json(output.indent(), output.ensure_ascii())
    }

    fn write_json(&self, indent: usize, ensure_ascii: bool) -> Result<String, SanitizeError> {
        let indent = " ".repeat(indent);
        let formatter = AsciiFormatter {
            inner: PrettyFormatter::with_indent(indent.as_bytes()),
            ensure_ascii,
        };

        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer).map_err(io::Error::from)?;

        trace!(bytes = buf.len(); "Document serialized");
        String::from_utf8(buf)
            .map_err(|err| SanitizeError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}

/// Pretty printer that optionally escapes every non-ASCII character as
/// UTF-16 `\uXXXX` units, keeping the output pure ASCII.
struct AsciiFormatter<'a> {
    inner: PrettyFormatter<'a>,
    ensure_ascii: bool,
}

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ensure_ascii || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            if key == ELEMENTS_KEY {
                map.serialize_entry(key, &self.elements)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_keeps_field_order() {
        let source = r#"{
  "type": "excalidraw",
  "version": 2,
  "elements": [
    {
      "type": "rectangle",
      "id": "r1",
      "x": 10
    }
  ],
  "appState": {
    "gridSize": null
  }
}"#;
        let document = Document::parse(source).expect("Failed to parse document");
        let rendered = document.to_json_string(2).expect("Failed to render document");
        assert_eq!(rendered, source);
    }

    #[test]
    fn test_indent_width() {
        let document = Document::parse(r#"{"elements":[]}"#).unwrap();
        assert_eq!(document.to_json_string(4).unwrap(), "{\n    \"elements\": []\n}");
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let source = r#"{"elements": [{"id": "t1", "type": "text", "text": "Café 🚀"}]}"#;
        let document = Document::parse(source).unwrap();

        let rendered = document.to_json_string(0).unwrap();
        assert!(rendered.contains(r#""text": "Caf\u00e9 \ud83d\ude80""#));
        assert!(rendered.is_ascii());

        let reparsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(reparsed["elements"][0]["text"], "Café 🚀");
    }

    #[test]
    fn test_render_keeps_utf8_when_configured() {
        let source = r#"{"elements": [{"id": "t1", "type": "text", "text": "Café\n"}]}"#;
        let document = Document::parse(source).unwrap();

        let rendered = document.render(&OutputConfig::new(2).with_ensure_ascii(false)).unwrap();
        assert!(rendered.contains(r#""text": "Café\n""#));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Document::parse("{\"elements\": [").unwrap_err();
        assert!(matches!(err, SanitizeError::Json { .. }));
    }

    #[test]
    fn test_parse_root_not_object() {
        let err = Document::parse("[]").unwrap_err();
        assert!(matches!(err, SanitizeError::MalformedInput(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_parse_missing_elements() {
        let err = Document::parse(r#"{"type": "excalidraw"}"#).unwrap_err();
        assert!(err.to_string().contains("no `elements` field"));
    }

    #[test]
    fn test_parse_elements_not_array() {
        let err = Document::parse(r#"{"elements": {}}"#).unwrap_err();
        assert!(err.to_string().contains("`elements` must be an array"));
    }

    #[test]
    fn test_parse_element_without_type() {
        let source = r#"{"elements": [{"id": "a", "type": "text"}, {"id": "b"}]}"#;
        let err = Document::parse(source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed input: element at index 1: missing required field `type`"
        );
    }

    #[test]
    fn test_parse_element_with_numeric_id() {
        let source = r#"{"elements": [{"id": 7, "type": "text"}]}"#;
        let err = Document::parse(source).unwrap_err();
        assert!(err.to_string().contains("field `id` must be a string, found a number"));
    }

    #[test]
    fn test_element_kind() {
        let line = Element::from_value(json!({"id": "l", "type": "line"})).unwrap();
        let frame = Element::from_value(json!({"id": "f", "type": "frame"})).unwrap();
        assert_eq!(line.kind(), ElementKind::Line);
        assert_eq!(frame.kind(), ElementKind::Other("frame"));
        assert_eq!(frame.kind().to_string(), "frame");
    }

    #[test]
    fn test_element_rejects_non_object() {
        let err = Element::from_value(json!("text")).unwrap_err();
        assert_eq!(err, "expected an object, found a string");
    }

    #[test]
    fn test_remove_keeps_required_fields() {
        let mut element =
            Element::from_value(json!({"id": "a", "type": "line", "baseline": 3})).unwrap();
        assert_eq!(element.remove("id"), None);
        assert_eq!(element.remove("baseline"), Some(json!(3)));
        assert_eq!(element.id(), "a");
        assert!(!element.contains("baseline"));
    }

    #[test]
    fn test_set_elements_round_trip_position() {
        let mut document =
            Document::parse(r#"{"a": 1, "elements": [], "b": 2}"#).unwrap();
        document.set_elements(vec![
            Element::from_value(json!({"id": "x", "type": "text"})).unwrap(),
        ]);
        let rendered: Value =
            serde_json::from_str(&document.to_json_string(0).unwrap()).unwrap();
        let keys: Vec<_> = rendered.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["a", "elements", "b"]);
        assert_eq!(document.field("elements"), None);
        assert_eq!(document.field("b"), Some(&json!(2)));
    }
}
