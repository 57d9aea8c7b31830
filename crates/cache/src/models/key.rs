//! Key layout.
//!
//! A page name that maps to a single extension is stored directly under its
//! name (the *simple* key). As soon as a second extension shows up, each
//! record moves to a *multi* key, `name<TAB>extension`, and the simple key
//! holds an overflow marker listing the extensions in insertion order:
//!
//! ```text
//! ls          -> "1\t1\t...\tlist directory contents"          (direct)
//! printf      -> "\t1\t3"                                       (overflow)
//! printf\t1   -> "1\t1\t...\tformat and print data"
//! printf\t3   -> "3\t3\t...\tformatted output conversion"
//! ```
//!
//! Keys starting with `$` are reserved for cache metadata; no page name may
//! start with one.

pub(crate) const SEP: char = '\t';

/// Marks reserved keys.
pub const RESERVED_PREFIX: char = '$';
/// Key holding the cache format version.
pub const VERSION_KEY: &str = "$version$";
/// Key holding the time of the last completed scan.
pub const SCAN_TIME_KEY: &str = "$mtime$";

pub(crate) fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

pub(crate) fn multi_key(name: &str, extension: &str) -> String {
    format!("{name}{SEP}{extension}")
}

/// What a raw key turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Key<'a> {
    Reserved,
    Simple(&'a str),
    Multi(&'a str),
}

impl<'a> Key<'a> {
    /// Classify a raw key, yielding the page name it belongs to.
    pub(crate) fn parse(raw: &'a str) -> Self {
        if is_reserved(raw) {
            return Key::Reserved;
        }
        match raw.split_once(SEP) {
            Some((name, _)) => Key::Multi(name),
            None => Key::Simple(raw),
        }
    }
}

/// The value under a simple key when it holds an overflow marker.
///
/// Direct records never start with the separator because their first field,
/// the extension, is never empty.
pub(crate) fn overflow_list(value: &str) -> Option<Vec<&str>> {
    value.strip_prefix(SEP).map(|rest| rest.split(SEP).filter(|ext| !ext.is_empty()).collect())
}

pub(crate) fn overflow_marker<S: AsRef<str>>(extensions: &[S]) -> String {
    let mut marker = String::new();
    for extension in extensions {
        marker.push(SEP);
        marker.push_str(extension.as_ref());
    }
    marker
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$version$", Key::Reserved)]
    #[case("$mtime$", Key::Reserved)]
    #[case("ls", Key::Simple("ls"))]
    #[case("printf\t3", Key::Multi("printf"))]
    fn test_parse(#[case] raw: &str, #[case] expected: Key<'_>) {
        assert_eq!(Key::parse(raw), expected);
    }

    #[test]
    fn test_overflow_marker() {
        let marker = overflow_marker(&["1", "3"]);
        assert_eq!(marker, "\t1\t3");
        assert_eq!(overflow_list(&marker), Some(vec!["1", "3"]));
        assert_eq!(overflow_list("1\t1\t0\t0\tA\t-\t-\t-\t"), None);
    }
}
