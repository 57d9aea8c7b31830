//! NAME sections of formatted (cat) pages.

use crate::consts::FORMATTED_NAME_HEADER;
use crate::entries::Entries;
use memchr::memchr;

/// Drop backspace overstriking (`b\bb` for bold, `_\bx` for underline).
pub(crate) fn strip_overstrike(line: &str) -> String {
    if memchr(b'\x08', line.as_bytes()).is_none() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\x08' {
            out.pop();
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Collects the NAME section of a formatted page, fed one line at a time.
///
/// The section is the indented block following a flush-left `NAME` title.
#[derive(Debug, Default)]
pub(crate) struct FormattedName {
    in_name: bool,
    done: bool,
    entries: Entries,
}

impl FormattedName {
    /// Feed the next line. Returns `false` once the NAME section is over.
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        if self.done {
            return false;
        }
        let line = strip_overstrike(line);
        if !self.in_name {
            self.in_name = FORMATTED_NAME_HEADER.is_match(&line);
            return true;
        }
        if !line.trim().is_empty() && !line.starts_with(char::is_whitespace) {
            self.done = true;
            return false;
        }
        self.entries.push(&line);
        true
    }

    pub(crate) fn found(&self) -> bool {
        self.in_name
    }

    pub(crate) fn finish(self) -> Option<String> {
        self.entries.finish()
    }
}
