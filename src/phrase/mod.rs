//! Phrase trees and their resolution into vox keys.

pub mod element;
pub mod resolver;
pub mod state;
pub mod strings;

pub use element::{ElementType, PhraseElement, PhraseNode};
pub use resolver::{Inflection, Resolver, to_vox};
pub use state::{AnnouncementState, Platform, PhraseState};
pub use strings::{clean, slug};

use crate::error::Result;
use std::path::Path;

/// Reads a phrase tree from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a phrase document.
pub fn load_phrase(path: &Path) -> Result<PhraseNode> {
    let content = std::fs::read_to_string(path)?;
    parse_phrase(&content)
}

/// Parses a phrase tree from JSON.
///
/// # Errors
/// Returns [`crate::error::VoxError::Phrase`] for malformed documents.
pub fn parse_phrase(json: &str) -> Result<PhraseNode> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoxError;

    #[test]
    fn test_parse_phrase() {
        let root = parse_phrase(r#"{ "type": "phrase", "attrs": { "ref": "x" }, "children": ["Hi"] }"#)
            .unwrap();
        assert_eq!(root.text_content(), "Hi");
    }

    #[test]
    fn test_parse_phrase_rejects_garbage() {
        assert!(matches!(parse_phrase("[1, 2"), Err(VoxError::Phrase(_))));
    }
}
