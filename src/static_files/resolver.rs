use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::http::mime::mime_type_for;
use crate::http::response::Response;

/// File served for a request of exactly `/`.
pub const INDEX_FILE: &str = "index.html";

/// A file read from the document root, held only until it is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Outcome of a lookup. Absence is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ServedFile),
    NotFound,
}

impl ServedFile {
    /// Frames the file as a 200 response.
    pub fn into_response(self) -> Response {
        Response::ok(self.mime_type, self.bytes)
    }
}

/// Resolves request paths against one document root.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads the file `request_path` names without producing a response.
    ///
    /// Used for HEAD and to learn the type before negotiating a GET.
    pub async fn peek(&self, request_path: &str) -> Lookup {
        let Some(relative) = sanitize_path(request_path) else {
            tracing::warn!(path = %request_path, "rejected path outside document root");
            return Lookup::NotFound;
        };

        let full = self.root.join(&relative);

        let Some(real) = self.contained(&full).await else {
            tracing::debug!(path = %full.display(), "no servable file");
            return Lookup::NotFound;
        };

        match tokio::fs::read(&real).await {
            Ok(bytes) => Lookup::Found(ServedFile {
                bytes,
                mime_type: mime_type_for(&full.to_string_lossy()),
            }),
            Err(e) => {
                tracing::debug!(path = %full.display(), error = %e, "file unreadable");
                Lookup::NotFound
            }
        }
    }

    /// Canonical form of `full` if it is a regular file inside the root.
    ///
    /// Canonicalizing both sides catches symlinks that point out of the
    /// root, which a purely lexical check cannot see.
    async fn contained(&self, full: &Path) -> Option<PathBuf> {
        let root = tokio::fs::canonicalize(&self.root).await.ok()?;
        let real = tokio::fs::canonicalize(full).await.ok()?;

        if !real.starts_with(&root) {
            tracing::warn!(
                path = %full.display(),
                resolved = %real.display(),
                "resolved path escapes document root"
            );
            return None;
        }

        let meta = tokio::fs::metadata(&real).await.ok()?;
        meta.is_file().then_some(real)
    }
}

/// Turns a request target into a path relative to the document root.
///
/// Drops any query or fragment, percent-decodes, and refuses anything that
/// could climb out of the root: `..` segments, drive prefixes, backslashes
/// and NUL bytes. `/` maps to [`INDEX_FILE`].
pub fn sanitize_path(request_path: &str) -> Option<PathBuf> {
    let clean = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or(request_path);

    if clean == "/" {
        return Some(PathBuf::from(INDEX_FILE));
    }

    let decoded = percent_decode_str(clean).decode_utf8().ok()?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(&*decoded).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(segment) => relative.push(segment),
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }

    Some(relative)
}
