//! Minimal multipart/form-data encoding for single-file uploads.

use rand::{distr::Alphanumeric, RngExt};
use std::path::Path;

/// Builds a multipart/form-data request body.
#[derive(Debug)]
pub struct Builder<'a> {
    boundary: String,
    parts: Vec<Part<'a>>,
}

impl<'a> Builder<'a> {
    /// Creates a new Builder with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Creates a new Builder with the specified boundary.
    /// Useful for testing.
    pub fn with_boundary(boundary: String) -> Self {
        Builder {
            boundary,
            parts: Vec::new(),
        }
    }

    /// Adds a file field from in-memory bytes.
    pub fn add_file_bytes(
        &mut self,
        name: &'a str,
        filename: &'a Path,
        content_type: &'a str,
        content: &'a [u8],
    ) {
        self.parts.push(Part {
            name,
            filename,
            content_type,
            content,
        });
    }

    /// Builds the final multipart/form-data body along with the
    /// `Content-Type` header value (including the boundary).
    pub fn build(self) -> Body {
        let mut body_bytes = Vec::new();
        let boundary_marker = format!("--{}\r\n", self.boundary);
        let boundary_end = format!("--{}--\r\n", self.boundary);

        for part in self.parts {
            body_bytes.extend_from_slice(boundary_marker.as_bytes());

            body_bytes
                .extend_from_slice(b"Content-Disposition: form-data; name=\"");
            push_escaped(&mut body_bytes, part.name.as_bytes());
            body_bytes.extend_from_slice(b"\"; filename=\"");
            push_escaped(
                &mut body_bytes,
                part.filename.as_os_str().as_encoded_bytes(),
            );
            body_bytes.extend_from_slice(b"\"\r\n");

            body_bytes.extend_from_slice(b"Content-Type: ");
            body_bytes.extend_from_slice(part.content_type.as_bytes());
            body_bytes.extend_from_slice(b"\r\n\r\n");

            body_bytes.extend_from_slice(part.content);
            body_bytes.extend_from_slice(b"\r\n");
        }

        body_bytes.extend_from_slice(boundary_end.as_bytes());
        let content_type_header =
            format!("multipart/form-data; boundary={}", self.boundary);

        Body {
            body: body_bytes,
            content_type: content_type_header,
        }
    }
}

/// Represents the built multipart body and its associated Content-Type header.
#[derive(Debug)]
pub struct Body {
    /// The raw bytes of the multipart/form-data body.
    pub body: Vec<u8>,
    /// The value for the `Content-Type` header, e.g., `"multipart/form-data; boundary=..."`.
    pub content_type: String,
}

/// A file field provided as raw bytes.
#[derive(Debug)]
struct Part<'a> {
    name: &'a str,
    filename: &'a Path,
    content_type: &'a str,
    content: &'a [u8],
}

/// Escapes a quoted header parameter value. Quotes and backslashes are
/// backslash-escaped; CR and LF are percent-encoded so they can't end the
/// header line.
fn push_escaped(out: &mut Vec<u8>, value: &[u8]) {
    for &b in value {
        match b {
            b'"' | b'\\' => out.extend_from_slice(&[b'\\', b]),
            b'\r' => out.extend_from_slice(b"%0D"),
            b'\n' => out.extend_from_slice(b"%0A"),
            _ => out.push(b),
        }
    }
}

/// Generates a random alphanumeric boundary string of length 30.
pub fn generate_boundary() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// Infers a MIME type from a filename extension.
///
/// Defaults to `application/octet-stream` for unknown or non-UTF8
/// extensions.
pub fn mime_from_filename<P: AsRef<Path>>(path: P) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// --- Tests ---
