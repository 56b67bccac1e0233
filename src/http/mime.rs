//! MIME type detection from file names.

pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Content type for `path`, decided by the text after its last `.`.
///
/// The extension is compared case-insensitively. Paths with no `.` or an
/// unknown extension get `application/octet-stream`.
///
/// # Examples
/// ```
/// use keel::http::mime::mime_type_for;
/// assert_eq!(mime_type_for("public/index.HTML"), "text/html");
/// assert_eq!(mime_type_for("README"), "application/octet-stream");
/// ```
pub fn mime_type_for(path: &str) -> &'static str {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return DEFAULT_MIME;
    };

    match ext.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",

        // Scripts and data
        "js" => "application/javascript",
        "json" => "application/json",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",

        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",

        _ => DEFAULT_MIME,
    }
}
