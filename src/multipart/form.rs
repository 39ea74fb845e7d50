//! Form data model shared by the decoder and the encoder.

use std::borrow::Cow;

use bytes::Bytes;
use percent_encoding::percent_decode_str;

/// Media type assumed for file parts that do not declare one.
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// A plain (non-file) form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    /// Media type, only when the part declared one.
    pub content_type: Option<String>,
}

/// An uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Form field name the file was sent under.
    pub field_name: String,
    /// Filename exactly as transmitted by the client.
    pub filename: String,
    /// Declared media type.
    pub content_type: String,
    pub data: Bytes,
}

impl FormFile {
    /// The filename percent-decoded once, for logs, messages and extension
    /// checks. The transmitted form in `filename` is never rewritten by this.
    pub fn display_name(&self) -> Cow<'_, str> {
        percent_decode_str(&self.filename).decode_utf8_lossy()
    }

    /// Lower-cased extension of the display name, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.display_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// The transmitted filename without its extension.
    ///
    /// The extension is found on the display name, so an encoded dot such as
    /// `book%2Exlsx` is stripped as well. Names without an extension come back
    /// whole.
    pub fn stem(&self) -> &str {
        let display = self.display_name();
        let Some((stem, ext)) = display.rsplit_once('.') else {
            return &self.filename;
        };
        if stem.is_empty() {
            return &self.filename;
        }
        let suffix = format!(".{}", ext);
        self.filename
            .char_indices()
            .rev()
            .map(|(i, _)| i)
            .find(|&i| percent_decode_str(&self.filename[i..]).decode_utf8_lossy() == suffix)
            .filter(|&i| i > 0)
            .map(|i| &self.filename[..i])
            .unwrap_or(&self.filename)
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Field(FormField),
    File(FormFile),
}

/// All parts of a multipart body, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: FormPart) {
        self.parts.push(part);
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(FormPart::Field(FormField {
            name: name.into(),
            value: value.into(),
            content_type: None,
        }));
    }

    pub fn push_file(&mut self, file: FormFile) {
        self.push(FormPart::File(file));
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.parts.iter().filter_map(|p| match p {
            FormPart::Field(f) => Some(f),
            FormPart::File(_) => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &FormFile> {
        self.parts.iter().filter_map(|p| match p {
            FormPart::File(f) => Some(f),
            FormPart::Field(_) => None,
        })
    }

    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut FormFile> {
        self.parts.iter_mut().filter_map(|p| match p {
            FormPart::File(f) => Some(f),
            FormPart::Field(_) => None,
        })
    }

    /// Value of a field; the last occurrence wins.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()
            .filter(|f| f.name == name)
            .last()
            .map(|f| f.value.as_str())
    }

    /// First file sent under `field_name`.
    pub fn file(&self, field_name: &str) -> Option<&FormFile> {
        self.files().find(|f| f.field_name == field_name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FormFile {
        FormFile {
            field_name: "file".to_string(),
            filename: name.to_string(),
            content_type: DEFAULT_FILE_TYPE.to_string(),
            data: Bytes::new(),
        }
    }

    #[test]
    fn test_display_name_decodes_once() {
        assert_eq!(file("Q3%20report.xlsx").display_name(), "Q3 report.xlsx");
        assert_eq!(file("100%2520growth.xlsx").display_name(), "100%20growth.xlsx");
        assert_eq!(file("plain.xlsx").display_name(), "plain.xlsx");
    }

    #[test]
    fn test_literal_percent_is_left_alone() {
        assert_eq!(file("50% off.xls").display_name(), "50% off.xls");
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("Book1.XLSX").extension().as_deref(), Some("xlsx"));
        assert_eq!(file("archive.tar.gz").extension().as_deref(), Some("gz"));
        assert_eq!(file("README").extension(), None);
        assert_eq!(file(".xlsx").extension(), None);
    }

    #[test]
    fn test_stem_strips_plain_and_encoded_extensions() {
        assert_eq!(file("q3.xlsx").stem(), "q3");
        assert_eq!(file("archive.2024.xls").stem(), "archive.2024");
        assert_eq!(file("Q3%20report.xlsx").stem(), "Q3%20report");
        assert_eq!(file("book%2Exlsx").stem(), "book");
        assert_eq!(file("book%2exlsx").stem(), "book");
        assert_eq!(file("noext").stem(), "noext");
        assert_eq!(file(".xlsx").stem(), ".xlsx");
    }

    #[test]
    fn test_field_lookup_last_write_wins() {
        let mut form = FormData::new();
        form.push_field("parser", "naive");
        form.push_file(file("a.pdf"));
        form.push_field("parser", "table");

        assert_eq!(form.field("parser"), Some("table"));
        assert_eq!(form.fields().count(), 2);
        assert_eq!(form.file("file").map(|f| f.filename.as_str()), Some("a.pdf"));
        assert_eq!(form.len(), 3);
    }
}
