use regex::Regex;
use std::sync::LazyLock;

// Section titles used for NAME by the translations most commonly installed.
const NAME_TITLES: &str = "NAME|NOMBRE|NOM|BEZEICHNUNG|NOME|NAAM|NAZWA|NAVN|NAMN";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `.SH NAME`, `.SH "NAME"`, `.Sh NAME`.
regex!(ROFF_NAME_HEADER, format!(r#"(?i)^[.']\s*sh\s+"?(?:{NAME_TITLES})"?\s*$"#).as_str());
// Any other section header ends the NAME section.
regex!(ROFF_SECTION_HEADER, r"(?i)^[.']\s*sh(?:\s|$)");
// Formatted pages print the title flush left, in capitals.
regex!(FORMATTED_NAME_HEADER, format!(r"^(?:{NAME_TITLES})\s*$").as_str());
// `'\" t` on the first line lists the preprocessors a page needs.
regex!(FILTER_HINT, r#"^['.]\\"\s+([egprtv]+)\s*$"#);
