//! XFDF (XML Forms Data Format) interchange documents
//!
//! pdftk's `fill_form` reads field values from an XFDF file that names the
//! target PDF and lists one `<field>` per value:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <xfdf xmlns="http://ns.adobe.com/xfdf/" xml:space="preserve">
//!   <f href="form.pdf"/>
//!   <fields>
//!     <field name="name1">
//!       <value>Value 1</value>
//!     </field>
//!   </fields>
//! </xfdf>
//! ```

use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const XFDF_NAMESPACE: &str = "http://ns.adobe.com/xfdf/";

/// Value for one form field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text, or a checkbox/radio state name such as `Yes`
    Text(String),
    /// Checkbox state: `Yes` when true, `Off` when false
    Checked(bool),
}

impl FieldValue {
    pub fn as_xfdf(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Checked(true) => "Yes",
            FieldValue::Checked(false) => "Off",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Checked(value)
    }
}

/// Field name to value, written in insertion order
pub type FieldValues = IndexMap<String, FieldValue>;

/// XFDF document for one fill request
#[derive(Debug, Clone)]
pub struct XfdfDocument {
    href: String,
    fields: FieldValues,
}

impl XfdfDocument {
    /// Start a document targeting `pdf`.
    ///
    /// XFDF is UTF-8 text, so a path that is not valid UTF-8 is rejected.
    pub fn new(pdf: &Path) -> Result<Self> {
        let href = pdf.to_str().ok_or_else(|| Error::FileAccess {
            path: pdf.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path is not valid UTF-8",
            ),
        })?;

        Ok(Self {
            href: href.to_string(),
            fields: FieldValues::new(),
        })
    }

    pub fn with_fields(mut self, values: &FieldValues) -> Self {
        self.fields
            .extend(values.iter().map(|(name, value)| (name.clone(), value.clone())));
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Serialize to UTF-8 XML.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer
            .create_element("xfdf")
            .with_attributes([("xmlns", XFDF_NAMESPACE), ("xml:space", "preserve")])
            .write_inner_content(|writer| {
                writer
                    .create_element("f")
                    .with_attribute(("href", self.href.as_str()))
                    .write_empty()?;
                writer
                    .create_element("fields")
                    .write_inner_content(|writer| {
                        for (name, value) in &self.fields {
                            writer
                                .create_element("field")
                                .with_attribute(("name", name.as_str()))
                                .write_inner_content(|writer| {
                                    writer
                                        .create_element("value")
                                        .write_text_content(BytesText::new(value.as_xfdf()))?;
                                    Ok::<(), quick_xml::Error>(())
                                })?;
                        }
                        Ok::<(), quick_xml::Error>(())
                    })?;
                Ok::<(), quick_xml::Error>(())
            })?;

        Ok(writer.into_inner())
    }

    /// Write the document to a fresh temporary `.xfdf` file.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped.
    pub async fn write_temp(&self) -> Result<TempPath> {
        let document = self.to_bytes()?;

        let file = tempfile::Builder::new()
            .prefix("pdftk-forms-")
            .suffix(".xfdf")
            .tempfile()
            .map_err(Error::TempFile)?;
        let (file, path) = file.into_parts();

        let mut file = tokio::fs::File::from_std(file);
        write_interchange(&mut file, &document, &path).await?;

        Ok(path)
    }
}

/// Write an interchange document, rejecting a write that transferred nothing.
pub async fn write_interchange<W>(writer: &mut W, document: &[u8], path: &Path) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = document;
    let written = tokio::io::copy(&mut reader, writer)
        .await
        .map_err(Error::TempFile)?;
    writer.flush().await.map_err(Error::TempFile)?;

    if written == 0 {
        return Err(Error::EmptyInterchange {
            path: path.to_path_buf(),
        });
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn document(values: &[(&str, FieldValue)]) -> String {
        let mut xfdf = XfdfDocument::new(Path::new("form.pdf")).unwrap();
        for (name, value) in values {
            xfdf.add_field(*name, value.clone());
        }
        String::from_utf8(xfdf.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_xfdf_basic() {
        let xml = document(&[
            ("name1", "Value 1".into()),
            ("checkbox2", "Yes".into()),
        ]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<xfdf xmlns=\"http://ns.adobe.com/xfdf/\" xml:space=\"preserve\">"));
        assert!(xml.contains("<f href=\"form.pdf\"/>"));
        assert!(xml.contains("<field name=\"name1\">"));
        assert!(xml.contains("<value>Value 1</value>"));
        assert!(xml.contains("<field name=\"checkbox2\">"));
        assert!(xml.contains("<value>Yes</value>"));
        assert!(xml.trim_end().ends_with("</xfdf>"));

        let name1 = xml.find("name1").unwrap();
        let checkbox2 = xml.find("checkbox2").unwrap();
        assert!(name1 < checkbox2);
    }

    #[test]
    fn test_xfdf_boolean_values() {
        let xml = document(&[("agree", true.into()), ("decline", false.into())]);

        assert!(xml.contains("<field name=\"agree\">"));
        assert!(xml.contains("<value>Yes</value>"));
        assert!(xml.contains("<field name=\"decline\">"));
        assert!(xml.contains("<value>Off</value>"));
    }

    #[test]
    fn test_xfdf_escapes_special_chars() {
        let xml = document(&[("a&b", "Smith & Jones <Consulting>".into())]);

        assert!(xml.contains("<field name=\"a&amp;b\">"));
        assert!(xml.contains("<value>Smith &amp; Jones &lt;Consulting&gt;</value>"));
    }

    #[test]
    fn test_field_value_deserialize() {
        let values: FieldValues =
            serde_json::from_str(r#"{"name1": "Value 1", "checkbox2": true}"#).unwrap();
        assert_eq!(values["name1"], FieldValue::Text("Value 1".into()));
        assert_eq!(values["checkbox2"], FieldValue::Checked(true));
        assert_eq!(values.get_index(0).unwrap().0, "name1");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_rejected() {
        use std::os::unix::ffi::OsStrExt;

        let pdf = Path::new(std::ffi::OsStr::from_bytes(b"/forms/w9\xff.pdf"));
        let err = XfdfDocument::new(pdf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[tokio::test]
    async fn test_write_interchange_exact_bytes() {
        let mut mock = tokio_test::io::Builder::new().write(b"<xfdf/>").build();
        let written = write_interchange(&mut mock, b"<xfdf/>", Path::new("a.xfdf"))
            .await
            .unwrap();
        assert_eq!(written, 7);
    }

    #[tokio::test]
    async fn test_zero_byte_write_is_rejected() {
        let mut sink: Vec<u8> = Vec::new();
        let err = write_interchange(&mut sink, b"", Path::new("/tmp/empty.xfdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInterchange { .. }));
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[tokio::test]
    async fn test_write_temp_is_scoped() {
        let mut xfdf = XfdfDocument::new(Path::new("form.pdf")).unwrap();
        xfdf.add_field("name1", "Value 1");

        let path = xfdf.write_temp().await.unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, xfdf.to_bytes().unwrap());
        assert!(path.extension().is_some_and(|ext| ext == "xfdf"));

        let kept = path.to_path_buf();
        drop(path);
        assert!(!kept.exists());
    }
}
