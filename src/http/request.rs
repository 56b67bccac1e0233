use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
///
/// Only GET, HEAD and OPTIONS are served; every other method, including ones
/// this enum has no name for, is answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// Any other token from the request line, kept verbatim
    Other(String),
}

/// Represents a parsed HTTP request from a client.
///
/// Built once from the raw header block and never modified afterwards.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, HEAD, etc.)
    pub method: Method,
    /// The request target, always starting with `/`
    pub path: String,
    /// HTTP version token (typically "HTTP/1.1")
    pub version: String,
    /// Request headers, names exactly as the client sent them
    pub headers: HashMap<String, String>,
}

impl Method {
    /// Parses a method token. Matching is case-sensitive, as in HTTP.
    ///
    /// # Example
    ///
    /// ```
    /// # use keel::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::Other(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    ///
    /// Names are not case-folded: `header("Accept")` does not find a header
    /// the client sent as `accept`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// The `Accept` header, or the empty string when the client sent none.
    pub fn accept(&self) -> &str {
        self.header("Accept").unwrap_or("")
    }
}
