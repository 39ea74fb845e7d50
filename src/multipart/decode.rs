//! Streaming multipart decoder.
//!
//! The decoder is pull-based: each `next_part` call reads exactly one part
//! from the body stream, so callers see errors at the part that caused them
//! and can stop reading at any point. Size limits are enforced by multer while
//! chunks arrive, before a part is fully buffered.

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use multer::{Constraints, Multipart, SizeLimit};

use crate::multipart::form::{FormData, FormField, FormFile, FormPart, DEFAULT_FILE_TYPE};
use crate::multipart::CodecError;

/// Byte limits applied while decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    pub max_body_bytes: u64,
    pub max_part_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        let defaults = crate::config::LimitsConfig::default();
        Self {
            max_body_bytes: defaults.max_body_bytes,
            max_part_bytes: defaults.max_file_bytes,
        }
    }
}

impl From<&crate::config::LimitsConfig> for DecodeLimits {
    fn from(limits: &crate::config::LimitsConfig) -> Self {
        Self {
            max_body_bytes: limits.max_body_bytes,
            max_part_bytes: limits.max_file_bytes,
        }
    }
}

/// Extract the boundary parameter from a `multipart/form-data` content type.
pub fn parse_boundary(content_type: &str) -> Result<String, CodecError> {
    multer::parse_boundary(content_type)
        .map_err(|e| CodecError::Malformed(format!("invalid multipart content type: {}", e)))
}

/// Lazy, finite, non-restartable sequence of form parts.
pub struct MultipartDecoder {
    inner: Multipart<'static>,
}

impl MultipartDecoder {
    /// Create a decoder over a body stream with a known boundary.
    pub fn new<S, O, E>(stream: S, boundary: impl Into<String>, limits: DecodeLimits) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let constraints = Constraints::new().size_limit(
            SizeLimit::new()
                .whole_stream(limits.max_body_bytes)
                .per_field(limits.max_part_bytes),
        );
        Self {
            inner: Multipart::with_constraints(stream, boundary, constraints),
        }
    }

    /// Create a decoder from the request's content type header.
    pub fn from_content_type<S, O, E>(
        stream: S,
        content_type: &str,
        limits: DecodeLimits,
    ) -> Result<Self, CodecError>
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let boundary = parse_boundary(content_type)?;
        Ok(Self::new(stream, boundary, limits))
    }

    /// Read the next part, or `None` after the closing boundary.
    pub async fn next_part(&mut self) -> Result<Option<FormPart>, CodecError> {
        let Some(mut field) = self.inner.next_field().await? else {
            return Ok(None);
        };

        let name = field
            .name()
            .map(str::to_string)
            .ok_or_else(|| CodecError::Malformed("part without a field name".to_string()))?;
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        let data = buffer.freeze();

        let part = match filename {
            Some(filename) => FormPart::File(FormFile {
                field_name: name,
                filename,
                content_type: content_type.unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
                data,
            }),
            None => {
                let value = String::from_utf8(data.to_vec()).map_err(|_| {
                    CodecError::Malformed(format!("field '{}' is not valid UTF-8", name))
                })?;
                FormPart::Field(FormField {
                    name,
                    value,
                    content_type,
                })
            }
        };

        Ok(Some(part))
    }

    /// Drain every remaining part.
    pub async fn collect(mut self) -> Result<FormData, CodecError> {
        let mut form = FormData::new();
        while let Some(part) = self.next_part().await? {
            form.push(part);
        }
        Ok(form)
    }
}

/// Decode a complete in-memory body.
pub async fn decode_bytes(
    body: impl Into<Bytes>,
    boundary: &str,
    limits: DecodeLimits,
) -> Result<FormData, CodecError> {
    let body: Bytes = body.into();
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    MultipartDecoder::new(stream, boundary, limits).collect().await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

    fn sample_body() -> String {
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"parser_id\"\r\n\r\n\
             naive\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"Q3%20sales.xlsx\"\r\n\
             Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n\
             PK-binary\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\r\n\
             hello\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        )
    }

    #[tokio::test]
    async fn test_decodes_fields_and_files_in_order() {
        let form = decode_bytes(sample_body(), BOUNDARY, DecodeLimits::default())
            .await
            .unwrap();

        assert_eq!(form.len(), 3);
        assert_eq!(form.field("parser_id"), Some("naive"));

        let files: Vec<_> = form.files().collect();
        assert_eq!(files[0].filename, "Q3%20sales.xlsx");
        assert_eq!(
            files[0].content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(files[0].data.as_ref(), b"PK-binary");
        assert_eq!(files[1].content_type, DEFAULT_FILE_TYPE);
        assert_eq!(files[1].data.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_pull_one_part_at_a_time() {
        let body = Bytes::from(sample_body());
        let stream = futures_util::stream::iter(
            body.chunks(7)
                .map(|c| Ok::<_, std::io::Error>(Bytes::copy_from_slice(c)))
                .collect::<Vec<_>>(),
        );
        let mut decoder = MultipartDecoder::new(stream, BOUNDARY, DecodeLimits::default());

        assert!(matches!(decoder.next_part().await.unwrap(), Some(FormPart::Field(_))));
        assert!(matches!(decoder.next_part().await.unwrap(), Some(FormPart::File(_))));
        assert!(matches!(decoder.next_part().await.unwrap(), Some(FormPart::File(_))));
        assert!(decoder.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_truncated_body_is_malformed() {
        let body = sample_body();
        let truncated = &body[..body.len() / 2];
        let err = decode_bytes(truncated.to_string(), BOUNDARY, DecodeLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_part_over_limit_is_too_large() {
        let limits = DecodeLimits {
            max_body_bytes: 1024 * 1024,
            max_part_bytes: 4,
        };
        let err = decode_bytes(sample_body(), BOUNDARY, limits).await.unwrap_err();
        assert!(matches!(err, CodecError::TooLarge { limit: 4 }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_stream_failure_is_abort() {
        let stream = futures_util::stream::iter(vec![
            Ok(Bytes::from(format!("--{}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nx", BOUNDARY))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ]);
        let err = MultipartDecoder::new(stream, BOUNDARY, DecodeLimits::default())
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::Aborted(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_non_utf8_field_is_malformed() {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"meta\"\r\n\r\n",
            b = BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let err = decode_bytes(body, BOUNDARY, DecodeLimits::default()).await.unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_parse_boundary() {
        assert_eq!(
            parse_boundary("multipart/form-data; boundary=abc123").unwrap(),
            "abc123"
        );
        assert!(parse_boundary("multipart/form-data").is_err());
    }
}
