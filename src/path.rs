//! Byte-level helpers shared by route insertion, matching and redirection.

/// Returns the position of the first `target` at or after `start`, or the
/// length of `path` if there is none.
pub(crate) fn find(path: &[u8], target: u8, start: usize) -> usize {
    path[start..]
        .iter()
        .position(|&b| b == target)
        .map_or(path.len(), |i| start + i)
}

/// Returns `path` with its trailing slash removed, or one appended if it had none.
///
/// `None` is returned for paths that have no sensible counterpart, i.e. the
/// empty path and the root.
pub(crate) fn toggle_trailing_slash(path: &str) -> Option<String> {
    match path {
        "" | "/" => None,
        _ if path.ends_with('/') => Some(path[..path.len() - 1].to_owned()),
        _ => Some([path, "/"].join("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_byte() {
        let path = b"/users/:id/posts";
        assert_eq!(find(path, b':', 0), 7);
        assert_eq!(find(path, b'/', 8), 10);
        assert_eq!(find(path, b'*', 0), path.len());
        assert_eq!(find(path, b'/', path.len()), path.len());
    }

    #[test]
    fn toggle() {
        let tests = vec![
            ("/photos", Some("/photos/")),
            ("/photos/", Some("/photos")),
            ("/a/b/c", Some("/a/b/c/")),
            ("/", None),
            ("", None),
        ];

        for (path, expected) in tests {
            assert_eq!(toggle_trailing_slash(path).as_deref(), expected, "path: {}", path);
        }
    }
}
