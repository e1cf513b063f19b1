//! Text normalisation for clip identifiers.

use regex::Regex;

/// Longest slug a clip identifier may carry.
pub const MAX_SLUG_LENGTH: usize = 100;

#[allow(clippy::expect_used)]
mod patterns {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref PLURAL_IES: Regex = Regex::new(r"ies\b").expect("valid regex");
        pub static ref STOP_WORDS: Regex =
            Regex::new(r"\b(a|an|at|be|of|on|the|to|in|is|has|by|with)\b").expect("valid regex");
        pub static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
        pub static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9_]").expect("valid regex");
    }
}

fn replace(pattern: &Regex, text: &str, with: &str) -> String {
    pattern.replace_all(text, with).into_owned()
}

/// Turns free text into the identifier fragment used in clip keys.
///
/// `slug("The Grand Northern Express")` is `"grand_northern_express"`.
pub fn slug(text: &str) -> String {
    let text = text.to_lowercase();
    let text = replace(&patterns::PLURAL_IES, &text, "y");
    let text = replace(&patterns::STOP_WORDS, &text, "");
    let text = replace(&patterns::WHITESPACE, text.trim(), "_");
    let text = replace(&patterns::NON_SLUG, &text, "");
    text.chars().take(MAX_SLUG_LENGTH).collect()
}

/// Trims and collapses runs of whitespace to single spaces.
pub fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
