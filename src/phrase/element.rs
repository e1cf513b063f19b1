//! The resolved phrase tree: typed slot elements, wrappers and text.
//!
//! In JSON a string is a text node and an object is an element:
//!
//! ```json
//! { "type": "phrase", "attrs": { "ref": "welcome" },
//!   "children": ["This is ", { "type": "station", "attrs": { "context": "source" } }, "."] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a typed element stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Phrase,
    Phraseset,
    Coach,
    Excuse,
    Integer,
    Named,
    Platform,
    Service,
    Station,
    Stationlist,
    Time,
    Vox,
    #[serde(other)]
    Unknown,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Phrase => "phrase",
            ElementType::Phraseset => "phraseset",
            ElementType::Coach => "coach",
            ElementType::Excuse => "excuse",
            ElementType::Integer => "integer",
            ElementType::Named => "named",
            ElementType::Platform => "platform",
            ElementType::Service => "service",
            ElementType::Station => "station",
            ElementType::Stationlist => "stationlist",
            ElementType::Time => "time",
            ElementType::Vox => "vox",
            ElementType::Unknown => "unknown",
        }
    }

    /// Phrases and phrasesets hold authored text; everything else is a slot.
    pub fn is_container(&self) -> bool {
        matches!(self, ElementType::Phrase | ElementType::Phraseset)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the phrase tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhraseNode {
    Text(String),
    Element(PhraseElement),
}

impl PhraseNode {
    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            PhraseNode::Text(text) => text.clone(),
            PhraseNode::Element(element) => element.text_content(),
        }
    }

    pub fn as_element(&self) -> Option<&PhraseElement> {
        match self {
            PhraseNode::Element(element) => Some(element),
            PhraseNode::Text(_) => None,
        }
    }
}

impl From<&str> for PhraseNode {
    fn from(text: &str) -> Self {
        PhraseNode::Text(text.to_string())
    }
}

impl From<PhraseElement> for PhraseNode {
    fn from(element: PhraseElement) -> Self {
        PhraseNode::Element(element)
    }
}

/// An element; untyped elements are plain wrappers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhraseElement {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Collapsed optional sections are not spoken.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PhraseNode>,
}

impl PhraseElement {
    pub fn new(kind: ElementType) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// An untyped wrapper element.
    pub fn wrapper() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, child: impl Into<PhraseNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `context` attribute, empty when absent.
    pub fn context(&self) -> &str {
        self.attr("context").unwrap_or("")
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                PhraseNode::Text(text) => out.push_str(text),
                PhraseNode::Element(element) => element.collect_text(out),
            }
        }
    }
}
