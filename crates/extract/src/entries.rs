/// Assembles whatis entries out of the text lines of a NAME section.
///
/// Text is joined with single spaces until a line carrying a second
/// ` - ` separator shows up, which starts the next entry.
#[derive(Debug, Default)]
pub(crate) struct Entries {
    done: Vec<String>,
    current: String,
}

const DASH: &str = " - ";

impl Entries {
    pub(crate) fn push(&mut self, text: &str) {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }
        let text_has_dash = format!(" {text} ").contains(DASH);
        if text_has_dash && self.current.contains(DASH) {
            self.done.push(std::mem::take(&mut self.current));
        }
        if !self.current.is_empty() {
            self.current.push(' ');
        }
        self.current.push_str(&text);
    }

    /// All entries, one per line, or `None` if there was no text at all.
    pub(crate) fn finish(mut self) -> Option<String> {
        if !self.current.is_empty() {
            self.done.push(self.current);
        }
        (!self.done.is_empty()).then(|| self.done.join("\n"))
    }
}
