//! Safe previews of gate response bodies for logs.
//!
//! Response bodies are opaque bytes of any content type. Text is logged up to
//! a byte limit; anything that is not UTF-8 is reduced to its length so binary
//! never reaches a log line.

/// Default preview limit in bytes.
pub const PREVIEW_LIMIT: usize = 1024;

/// Render `body` for a log line.
///
/// - empty → `<empty>`
/// - whole body is UTF-8 → decoded text, cut at `limit` bytes on a
///   character boundary
/// - otherwise → `<N bytes>`
#[must_use]
pub fn body_preview(body: &[u8], limit: usize) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }

    match std::str::from_utf8(body) {
        Ok(text) => {
            let mut end = text.len().min(limit);
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text[..end].to_string()
        }
        Err(_) => byte_count(body.len()),
    }
}

fn byte_count(len: usize) -> String {
    format!("<{len} bytes>")
}
