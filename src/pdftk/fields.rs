//! Parser for pdftk's `dump_data_fields_utf8` output
//!
//! pdftk prints one block per form field, separated by `---` lines:
//!
//! ```text
//! ---
//! FieldType: Button
//! FieldName: checkbox2
//! FieldFlags: 0
//! FieldJustification: Left
//! FieldStateOption: Off
//! FieldStateOption: Yes
//! ```

use indexmap::IndexMap;
use serde::Serialize;

/// Line separating field blocks
const BLOCK_SEPARATOR: &str = "---";

/// Form fields keyed by name, in dump order
pub type FieldMap = IndexMap<String, FieldDescriptor>;

/// Attributes pdftk reports for one form field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Lower-cased attribute name to value (`type`, `value`, `flags`, ...)
    #[serde(flatten)]
    attributes: IndexMap<String, String>,
    /// `FieldStateOption` values, in dump order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
}

impl FieldDescriptor {
    /// Attribute by lower-cased name
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// `FieldType`: `Text`, `Button`, `Choice` or `Signature`
    pub fn field_type(&self) -> Option<&str> {
        self.get("type")
    }

    /// `FieldValue`, absent for fields that were never filled
    pub fn value(&self) -> Option<&str> {
        self.get("value")
    }

    /// Selectable states of checkboxes, radio groups and choice fields
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    fn merge(&mut self, other: FieldDescriptor) {
        self.attributes.extend(other.attributes);
        self.options.extend(other.options);
    }
}

/// One `Field<Attribute>: <value>` line
#[derive(Debug, PartialEq, Eq)]
enum FieldLine<'a> {
    Name(&'a str),
    StateOption(&'a str),
    Attribute(String, &'a str),
}

fn parse_line(line: &str) -> Option<FieldLine<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (key, value) = line.split_once(':')?;

    let prefix = key.get(..5)?;
    if !prefix.eq_ignore_ascii_case("field") {
        return None;
    }
    let attribute = &key[5..];
    if attribute.is_empty() || !attribute.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let value = value.strip_prefix(' ').unwrap_or(value);

    let line = if attribute.eq_ignore_ascii_case("name") {
        FieldLine::Name(value)
    } else if attribute.eq_ignore_ascii_case("stateoption") {
        FieldLine::StateOption(value)
    } else {
        FieldLine::Attribute(attribute.to_ascii_lowercase(), value)
    };
    Some(line)
}

/// Parse a full field dump into a [`FieldMap`].
///
/// Blocks without a `FieldName` line are dropped. A name repeated in a later
/// block reopens the earlier record: attributes overwrite, options append.
pub fn parse_field_dump(dump: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut name: Option<&str> = None;
    let mut current = FieldDescriptor::default();

    for line in dump.lines().chain(std::iter::once(BLOCK_SEPARATOR)) {
        if line.trim() == BLOCK_SEPARATOR {
            let block = std::mem::take(&mut current);
            if let Some(name) = name.take() {
                fields.entry(name.to_string()).or_default().merge(block);
            }
            continue;
        }

        match parse_line(line) {
            Some(FieldLine::Name(value)) => name = Some(value),
            Some(FieldLine::StateOption(value)) => current.options.push(value.to_string()),
            Some(FieldLine::Attribute(attribute, value)) => {
                current.attributes.insert(attribute, value.to_string());
            }
            None => {}
        }
    }

    fields
}
