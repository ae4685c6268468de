//! Bucket sanitization and namespace derivation.

/// Normalizes a raw bucket into a metric key.
///
/// Every `/` becomes `_`, every run of whitespace collapses into a single `_`, and anything
/// outside `[A-Za-z0-9_\-.]` is dropped.  Empty or otherwise degenerate results are returned as-is.
pub fn sanitize(bucket: &str) -> String {
    let mut key = String::with_capacity(bucket.len());
    let mut in_whitespace = false;

    for c in bucket.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                key.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        match c {
            '/' => key.push('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' => key.push(c),
            _ => {},
        }
    }

    key
}

/// Splits a metric key into its full namespace and its name.
///
/// The last dot-separated segment is the name.  The rest, with dots turned into slashes, is
/// appended to `root` as `root/suffix`.  A key without any dot lives directly under `root`.
pub fn split_key(root: &str, key: &str) -> (String, String) {
    match key.rsplit_once('.') {
        Some((prefix, name)) => (format!("{}/{}", root, prefix.replace('.', "/")), name.to_owned()),
        None => (root.to_owned(), key.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::{sanitize, split_key};

    #[test]
    fn test_sanitize_clean_key_is_untouched() {
        assert_eq!(sanitize("app.requests.count"), "app.requests.count");
        assert_eq!(sanitize("foo-bar_baz.1"), "foo-bar_baz.1");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in &["a b/c", "we!rd\t\tkey", "  padded  ", "x/y.z", "ünïcode.key"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_sanitize_slashes_and_whitespace() {
        assert_eq!(sanitize("a/b"), "a_b");
        assert_eq!(sanitize("a//b"), "a__b");
        assert_eq!(sanitize("a  \t b"), "a_b");
        assert_eq!(sanitize("a b\nc"), "a_b_c");
    }

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(sanitize("foo!@#$%^&*()bar"), "foobar");
        assert_eq!(sanitize("héllo"), "hllo");
        assert_eq!(sanitize("!!!"), "");
    }

    #[test]
    fn test_split_key() {
        let (ns, name) = split_key("Statsd", "foo.bar");
        assert_eq!(ns, "Statsd/foo");
        assert_eq!(name, "bar");

        let (ns, name) = split_key("Statsd", "app.web.requests");
        assert_eq!(ns, "Statsd/app/web");
        assert_eq!(name, "requests");

        let (ns, name) = split_key("Custom", "foo");
        assert_eq!(ns, "Custom");
        assert_eq!(name, "foo");
    }
}
