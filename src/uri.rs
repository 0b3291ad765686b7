//! URI handling for schema scopes and reference resolution.
//!
//! Scopes and `$ref` targets are plain strings at the API surface; this
//! module centralizes normalization and relative resolution, including the
//! `jar:`-scheme special case used to address packaged schema documents
//! (the scheme-specific part splits on `!`, the inner path is normalized,
//! and the two halves are rejoined).

use url::Url;

/// Returns the scheme of a URI, if it has one.
pub(crate) fn scheme(uri: &str) -> Option<&str> {
    let colon = uri.find(':')?;
    let candidate = &uri[..colon];
    if uri[..colon].contains('/') || candidate.is_empty() {
        return None;
    }
    let mut bytes = candidate.bytes();
    let first = bytes.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if bytes.all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.') {
        Some(candidate)
    } else {
        None
    }
}

/// True when the URI carries its own scheme.
pub(crate) fn is_absolute(uri: &str) -> bool {
    scheme(uri).is_some()
}

/// Returns the URI with any fragment removed.
pub(crate) fn strip_fragment(uri: &str) -> &str {
    match uri.split_once('#') {
        Some((head, _)) => head,
        None => uri,
    }
}

/// Normalizes a URI into its canonical cache-key form.
///
/// Dot segments are collapsed, empty fragments dropped, and `jar:` URIs are
/// normalized on their inner path only.
pub(crate) fn normalize(uri: &str) -> String {
    let uri = uri.strip_suffix('#').unwrap_or(uri);
    if let Some(rest) = uri.strip_prefix("jar:") {
        return match rest.split_once('!') {
            Some((outer, inner)) => format!("jar:{}!{}", outer, normalize_path(inner)),
            None => format!("jar:{}", normalize_path(rest)),
        };
    }
    if is_absolute(uri) {
        if let Ok(parsed) = Url::parse(uri) {
            let text = parsed.to_string();
            return text.strip_suffix('#').unwrap_or(&text).to_string();
        }
    }
    normalize_path(uri)
}

/// Resolves `rel` against `base`, producing a normalized URI.
///
/// Absolute references ignore the base. Fragment-only references replace the
/// base's fragment. Relative paths merge with the base path, whether the
/// base itself is absolute, relative, or `jar:`-packaged.
pub(crate) fn resolve(base: &str, rel: &str) -> String {
    if is_absolute(rel) {
        return normalize(rel);
    }
    let base = base.trim();
    if base.is_empty() {
        return normalize(rel);
    }
    if let Some(fragment) = rel.strip_prefix('#') {
        let head = strip_fragment(base);
        if fragment.is_empty() {
            return normalize(head);
        }
        return format!("{}#{}", normalize(head), fragment);
    }
    if let Some(rest) = base.strip_prefix("jar:") {
        return match rest.split_once('!') {
            Some((outer, inner)) => {
                format!("jar:{}!{}", outer, merge_paths(strip_fragment(inner), rel))
            }
            None => format!("jar:{}", merge_paths(strip_fragment(rest), rel)),
        };
    }
    if is_absolute(base) {
        if let Ok(parsed) = Url::parse(strip_fragment(base)) {
            if let Ok(joined) = parsed.join(rel) {
                return normalize(joined.as_str());
            }
        }
    }
    merge_paths(strip_fragment(base), rel)
}

/// Merges a relative reference into a base path per RFC 3986 path math.
fn merge_paths(base: &str, rel: &str) -> String {
    if rel.starts_with('/') {
        return normalize_path(rel);
    }
    let dir = match base.rfind('/') {
        Some(pos) => &base[..=pos],
        None => "",
    };
    normalize_path(&format!("{}{}", dir, rel))
}

/// Collapses `.` and `..` segments in a path, preserving any fragment.
fn normalize_path(path: &str) -> String {
    let (path, fragment) = match path.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (path, None),
    };
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }
    let mut out = String::new();
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if path.ends_with('/') && !out.ends_with('/') && !out.is_empty() {
        out.push('/');
    }
    if let Some(f) = fragment {
        out.push('#');
        out.push_str(f);
    }
    out
}

/// Decodes percent-escapes in a URI fragment.
pub(crate) fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(byte) = u8::from_str_radix(&text[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_detection() {
        assert_eq!(scheme("https://example.com"), Some("https"));
        assert_eq!(scheme("jar:file:/a.jar!/s.json"), Some("jar"));
        assert_eq!(scheme("./relative.json"), None);
        assert_eq!(scheme("relative/path.json"), None);
        assert_eq!(scheme("#/fragment"), None);
    }

    #[test]
    fn test_normalize_collapses_dot_segments() {
        assert_eq!(normalize("a/b/../c/./d.json"), "a/c/d.json");
        assert_eq!(
            normalize("https://example.com/a/../b.json"),
            "https://example.com/b.json"
        );
    }

    #[test]
    fn test_normalize_jar_splits_on_bang() {
        assert_eq!(
            normalize("jar:file:/lib/schemas.jar!/dir/../s.json"),
            "jar:file:/lib/schemas.jar!/s.json"
        );
    }

    #[test]
    fn test_resolve_absolute_ignores_base() {
        assert_eq!(
            resolve("https://a.com/x.json", "https://b.com/y.json"),
            "https://b.com/y.json"
        );
    }

    #[test]
    fn test_resolve_relative_against_http_base() {
        assert_eq!(
            resolve("https://a.com/dir/x.json", "other.json"),
            "https://a.com/dir/other.json"
        );
        assert_eq!(
            resolve("https://a.com/dir/x.json", "../up.json"),
            "https://a.com/up.json"
        );
    }

    #[test]
    fn test_resolve_relative_against_relative_base() {
        assert_eq!(resolve("dir/x.json", "other.json"), "dir/other.json");
        assert_eq!(resolve("x.json", "other.json"), "other.json");
    }

    #[test]
    fn test_resolve_fragment_only() {
        assert_eq!(
            resolve("https://a.com/x.json", "#/definitions/a"),
            "https://a.com/x.json#/definitions/a"
        );
    }

    #[test]
    fn test_resolve_inside_jar() {
        assert_eq!(
            resolve("jar:file:/lib/s.jar!/dir/x.json", "y.json"),
            "jar:file:/lib/s.jar!/dir/y.json"
        );
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/a%20b"), "/a b");
        assert_eq!(percent_decode("/a%2Fb"), "/a/b");
        assert_eq!(percent_decode("/plain"), "/plain");
        assert_eq!(percent_decode("/bad%2"), "/bad%2");
    }
}
