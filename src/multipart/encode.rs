//! Multipart encoder.
//!
//! Produces a complete `multipart/form-data` body with a fresh boundary. Part
//! payloads are already owned buffers, so the body is assembled once with an
//! exact capacity and its length is known before the request is sent.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::multipart::form::{FormData, FormPart};

/// An encoded multipart body.
#[derive(Debug, Clone)]
pub struct EncodedForm {
    boundary: String,
    body: Bytes,
}

impl EncodedForm {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Value for the `Content-Length` header.
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Generate a boundary that cannot collide with typical payloads.
pub fn generate_boundary() -> String {
    format!("----SheetGatewayBoundary{}", Uuid::new_v4().simple())
}

/// Encode with a freshly generated boundary.
pub fn encode(form: &FormData) -> EncodedForm {
    encode_with_boundary(form, generate_boundary())
}

/// Encode with a caller-chosen boundary.
pub fn encode_with_boundary(form: &FormData, boundary: String) -> EncodedForm {
    let headers: Vec<String> = form.parts().iter().map(part_headers).collect();

    let capacity = form
        .parts()
        .iter()
        .zip(&headers)
        .map(|(part, head)| boundary.len() + 4 + head.len() + payload(part).len() + 2)
        .sum::<usize>()
        + boundary.len()
        + 6;

    let mut body = BytesMut::with_capacity(capacity);
    for (part, head) in form.parts().iter().zip(&headers) {
        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"\r\n");
        body.put_slice(head.as_bytes());
        body.put_slice(payload(part));
        body.put_slice(b"\r\n");
    }
    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"--\r\n");

    EncodedForm {
        boundary,
        body: body.freeze(),
    }
}

fn payload(part: &FormPart) -> &[u8] {
    match part {
        FormPart::Field(field) => field.value.as_bytes(),
        FormPart::File(file) => file.data.as_ref(),
    }
}

/// Part headers including the blank line that ends them.
fn part_headers(part: &FormPart) -> String {
    match part {
        FormPart::Field(field) => match &field.content_type {
            Some(content_type) => format!(
                "Content-Disposition: form-data; name=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                escape_param(&field.name),
                content_type.replace(['\r', '\n'], "")
            ),
            None => format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_param(&field.name)
            ),
        },
        FormPart::File(file) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            escape_param(&file.field_name),
            escape_param(&file.filename),
            file.content_type.replace(['\r', '\n'], "")
        ),
    }
}

/// Escape a quoted header parameter the way browsers encode form names.
fn escape_param(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::decode::{decode_bytes, DecodeLimits};
    use crate::multipart::form::FormFile;

    fn sample_form() -> FormData {
        let mut form = FormData::new();
        form.push_field("kb_id", "kb-42");
        form.push_file(FormFile {
            field_name: "file".to_string(),
            filename: "Q3%20report.xlsx".to_string(),
            content_type: "application/vnd.ms-excel".to_string(),
            data: Bytes::from_static(b"\x00\x01binary\r\n--not-a-boundary\xff"),
        });
        form.push_field("parser_id", "table");
        form.push_file(FormFile {
            field_name: "file".to_string(),
            filename: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        });
        form
    }

    #[test]
    fn test_layout() {
        let mut form = FormData::new();
        form.push_field("a", "1");
        let encoded = encode_with_boundary(&form, "XyZ".to_string());

        assert_eq!(
            encoded.body().as_ref(),
            b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--XyZ--\r\n"
        );
        assert_eq!(encoded.content_type(), "multipart/form-data; boundary=XyZ");
        assert_eq!(encoded.content_length(), encoded.body().len() as u64);
    }

    #[tokio::test]
    async fn test_field_content_type_survives_reencode() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"meta\"\r\nContent-Type: application/json\r\n\r\n{\"tags\":[\"q3\"]}\r\n--b\r\nContent-Disposition: form-data; name=\"kb_id\"\r\n\r\nkb-1\r\n--b--\r\n";
        let form = decode_bytes(body, "b", DecodeLimits::default()).await.unwrap();

        let encoded = encode_with_boundary(&form, "c".to_string());
        let text = String::from_utf8_lossy(encoded.body());
        assert!(text.contains(
            "name=\"meta\"\r\nContent-Type: application/json\r\n\r\n{\"tags\":[\"q3\"]}"
        ));
        assert!(text.contains("name=\"kb_id\"\r\n\r\nkb-1"));

        let again = decode_bytes(encoded.into_body(), "c", DecodeLimits::default())
            .await
            .unwrap();
        assert_eq!(again, form);
    }

    #[test]
    fn test_fresh_boundary_each_time() {
        let form = sample_form();
        assert_ne!(encode(&form).boundary(), encode(&form).boundary());
    }

    #[test]
    fn test_escapes_quotes_in_filenames() {
        let mut form = FormData::new();
        form.push_file(FormFile {
            field_name: "file".to_string(),
            filename: "say \"hi\".pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: Bytes::new(),
        });
        let encoded = encode_with_boundary(&form, "b".to_string());
        let text = String::from_utf8_lossy(encoded.body());
        assert!(text.contains("filename=\"say %22hi%22.pdf\""));
    }

    #[tokio::test]
    async fn test_decode_encode_decode_is_stable() {
        let original = sample_form();

        let first = encode(&original);
        let decoded = decode_bytes(first.body().clone(), first.boundary(), DecodeLimits::default())
            .await
            .unwrap();
        assert_eq!(decoded, original);

        let second = encode(&decoded);
        let again = decode_bytes(second.body().clone(), second.boundary(), DecodeLimits::default())
            .await
            .unwrap();
        assert_eq!(again, original);
        assert_eq!(second.content_length(), first.content_length());
    }
}
