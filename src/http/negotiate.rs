/// Whether a response of type `mime` satisfies the client's `Accept` header.
///
/// An empty header accepts anything. Otherwise any single media range that
/// matches is enough: `*/*`, `type/*` sharing the primary type, or an exact
/// match. Parameters such as `q=` are ignored, so `text/html;q=0` still
/// accepts `text/html`.
pub fn is_acceptable(accept: &str, mime: &str) -> bool {
    if accept.is_empty() {
        return true;
    }

    accept
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.split(';').next().unwrap_or(token).trim())
        .any(|range| range_matches(range, mime))
}

fn range_matches(range: &str, mime: &str) -> bool {
    if range == "*/*" {
        return true;
    }

    if let Some(primary) = range.strip_suffix("/*") {
        return mime
            .strip_prefix(primary)
            .is_some_and(|rest| rest.starts_with('/'));
    }

    range == mime
}
