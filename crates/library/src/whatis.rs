//! Splitting raw whatis text into one description per name.

/// One documented name and its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Description<'a> {
    pub name: &'a str,
    pub whatis: Option<&'a str>,
}

const DASH: &str = " - ";

/// Split whatis text (one `names - description` entry per line) into a
/// description per name. Names are comma separated; a name that appears in
/// several entries keeps its first description.
pub fn split(raw: &str) -> Vec<Description<'_>> {
    let mut descriptions: Vec<Description<'_>> = Vec::new();
    for line in raw.lines() {
        let (names, whatis) = match line.split_once(DASH) {
            Some((names, whatis)) => (names, Some(whatis.trim()).filter(|w| !w.is_empty())),
            None => (line, None),
        };
        for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if descriptions.iter().all(|d| d.name != name) {
                descriptions.push(Description { name, whatis });
            }
        }
    }
    descriptions
}

/// Whether a name taken from whatis text can be used as a page name.
pub(crate) fn is_usable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(mandb_cache::RESERVED_PREFIX)
        && !name.contains(|c: char| c.is_whitespace() || c == '/' || c.is_control())
}
