//! NAME sections of roff sources, in both the `man` and `mdoc` macro sets.

use crate::consts::{ROFF_NAME_HEADER, ROFF_SECTION_HEADER};
use crate::entries::Entries;

/// Turn roff escapes into the plain text they print as.
///
/// Font changes, zero-width markers and unknown named characters vanish;
/// the various dashes all become `-`.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            break;
        };
        match escape {
            '-' => out.push('-'),
            'e' | '\\' => out.push('\\'),
            ' ' | '~' | '0' => out.push(' '),
            '&' | '|' | '^' | 'c' | ')' | '/' | ',' | '%' => {},
            // \fB, \f(BI, \f[CR]
            'f' => skip_argument(&mut chars),
            // \*x, \*(xx, \*[name]: strings we don't know the value of.
            '*' => skip_argument(&mut chars),
            '(' => {
                let name: String = chars.by_ref().take(2).collect();
                push_named(&mut out, &name);
            },
            '[' => {
                let name: String = chars.by_ref().take_while(|&c| c != ']').collect();
                push_named(&mut out, &name);
            },
            '"' => break,
            other => out.push(other),
        }
    }
    out
}

fn skip_argument(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    match chars.next() {
        Some('(') => {
            chars.next();
            chars.next();
        },
        Some('[') => chars.by_ref().take_while(|&c| c != ']').for_each(drop),
        _ => {},
    }
}

fn push_named(out: &mut String, name: &str) {
    match name {
        "em" | "en" | "hy" | "mi" => out.push('-'),
        "aq" | "cq" | "oq" => out.push('\''),
        "dq" | "lq" | "rq" => out.push('"'),
        "bu" => out.push('*'),
        _ => {},
    }
}

/// Split a macro line into its name and arguments, honouring double quotes.
fn macro_args(line: &str) -> (&str, Vec<String>) {
    let line = line[1..].trim_start();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in rest.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            },
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            },
            c => {
                current.push(c);
                started = true;
            },
        }
    }
    if started {
        args.push(current);
    }
    (name, args)
}

fn is_comment(line: &str) -> bool {
    line.starts_with(".\\\"") || line.starts_with("'\\\"") || line.starts_with("\\\"") || line == "."
}

/// Collects the NAME section of a roff page, fed one line at a time.
#[derive(Debug, Default)]
pub(crate) struct RoffName {
    in_name: bool,
    done: bool,
    entries: Entries,
    mdoc_names: Vec<String>,
    mdoc_description: Option<String>,
}

impl RoffName {
    /// Feed the next line. Returns `false` once the NAME section is over.
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        if self.done {
            return false;
        }
        if !self.in_name {
            self.in_name = ROFF_NAME_HEADER.is_match(line);
            return true;
        }
        if ROFF_SECTION_HEADER.is_match(line) {
            self.done = true;
            return false;
        }
        if is_comment(line) {
            return true;
        }
        if !line.starts_with(['.', '\'']) {
            self.entries.push(&unescape(line));
            return true;
        }
        let (name, args) = macro_args(line);
        let args: Vec<String> = args.iter().map(|arg| unescape(arg)).collect();
        match name {
            "Nm" => self.mdoc_names.extend(args.into_iter().filter(|a| a != ",").map(|a| {
                a.trim_end_matches(',').to_string()
            })),
            "Nd" => self.mdoc_description = Some(args.join(" ")),
            "B" | "I" | "SM" | "SB" => self.entries.push(&args.join(" ")),
            "BR" | "BI" | "IB" | "IR" | "RB" | "RI" => self.entries.push(&args.concat()),
            _ => {},
        }
        true
    }

    pub(crate) fn found(&self) -> bool {
        self.in_name
    }

    pub(crate) fn finish(self) -> Option<String> {
        if !self.mdoc_names.is_empty() {
            let names = self.mdoc_names.join(", ");
            return Some(match self.mdoc_description {
                Some(description) => format!("{names} - {description}"),
                None => names,
            });
        }
        self.entries.finish()
    }
}
