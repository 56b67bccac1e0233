/// Methods this server answers; sent in `Allow` on 204 and 405 responses.
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File served
/// - `NoContent` (204): OPTIONS reply
/// - `BadRequest` (400): Malformed or unreadable request
/// - `NotFound` (404): No such file under the document root
/// - `MethodNotAllowed` (405): Anything but GET, HEAD, OPTIONS
/// - `NotAcceptable` (406): `Accept` rules out the file's type
/// - `InternalServerError` (500): Best-effort reply after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    NoContent,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use keel::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotAcceptable.as_u16(), 406);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::NotAcceptable => 406,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::NotAcceptable => "Not Acceptable",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be written to a client.
///
/// Headers keep insertion order: Content-Type, Content-Length, Connection,
/// then anything added afterwards.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// `build` always derives Content-Length from the body and always sets
/// `Connection: close`; values passed for those two headers are discarded.
///
/// # Example
///
/// ```
/// # use keel::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("application/json")
///     .body(b"{}".to_vec())
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("2"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    content_type: Option<String>,
    extra: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            extra: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// Adds or replaces a header placed after the framing headers.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key.eq_ignore_ascii_case("Content-Length") || key.eq_ignore_ascii_case("Connection") {
            return self;
        }
        if key.eq_ignore_ascii_case("Content-Type") {
            return self.content_type(value);
        }

        let value = value.into();
        match self.extra.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.extra.push((key, value)),
        }
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Response {
        let mut headers = Vec::with_capacity(3 + self.extra.len());

        if let Some(mime) = self.content_type {
            headers.push(("Content-Type".to_string(), mime));
        }
        // RFC 9110 forbids Content-Length on 204.
        if self.status != StatusCode::NoContent {
            headers.push(("Content-Length".to_string(), self.body.len().to_string()));
        }
        headers.push(("Connection".to_string(), "close".to_string()));
        headers.extend(self.extra);

        Response {
            status: self.status,
            headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A 200 OK carrying `body` as `mime`.
    pub fn ok(mime: &str, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .content_type(mime)
            .body(body.into())
            .build()
    }

    /// The OPTIONS reply: 204 with an `Allow` header and no body.
    pub fn options() -> Self {
        ResponseBuilder::new(StatusCode::NoContent)
            .header("Allow", ALLOWED_METHODS)
            .build()
    }

    /// An error response with a minimal HTML page naming the status.
    pub fn error(status: StatusCode) -> Self {
        let title = format!("{} {}", status.as_u16(), status.reason_phrase());
        let page = format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
             <body><h1>{title}</h1></body></html>\n"
        );

        let builder = ResponseBuilder::new(status)
            .content_type("text/html")
            .body(page.into_bytes());

        if status == StatusCode::MethodNotAllowed {
            builder.header("Allow", ALLOWED_METHODS).build()
        } else {
            builder.build()
        }
    }

    pub fn bad_request() -> Self {
        Self::error(StatusCode::BadRequest)
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::error(StatusCode::MethodNotAllowed)
    }

    pub fn not_acceptable() -> Self {
        Self::error(StatusCode::NotAcceptable)
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::InternalServerError)
    }

    /// Looks up a header by name, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
