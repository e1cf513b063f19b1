//! Turns a resolved phrase tree into the vox keys that speak it.

use crate::defaults::silence;
use crate::phrase::element::{ElementType, PhraseElement, PhraseNode};
use crate::phrase::state::PhraseState;
use crate::phrase::strings::{clean, slug};
use crate::vox::key::VoxKey;
use tracing::debug;

const SENTENCE_MARKS: [char; 3] = ['.', '!', '?'];

/// Whether a slot ends its sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inflection {
    Mid,
    End,
}

impl Inflection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Inflection::Mid => "mid",
            Inflection::End => "end",
        }
    }

    fn is_mid(&self) -> bool {
        *self == Inflection::Mid
    }
}

/// A node that produces speech.
#[derive(Debug, Clone, Copy)]
enum Spoken<'a> {
    /// Authored text, with the container it belongs to and its index among
    /// its parent's children.
    Text {
        text: &'a str,
        owner: &'a PhraseElement,
        index: usize,
    },
    Slot(&'a PhraseElement, ElementType),
}

impl Spoken<'_> {
    fn text_content(&self) -> String {
        match self {
            Spoken::Text { text, .. } => text.to_string(),
            Spoken::Slot(element, _) => element.text_content(),
        }
    }
}

/// Walks a phrase tree against a slot state.
pub struct Resolver<'a, S: PhraseState + ?Sized> {
    root: &'a PhraseNode,
    state: &'a S,
}

impl<'a, S: PhraseState + ?Sized> Resolver<'a, S> {
    pub fn new(root: &'a PhraseNode, state: &'a S) -> Self {
        Self { root, state }
    }

    /// Resolves the whole phrase to an ordered key list.
    pub fn to_vox(&self) -> Vec<VoxKey> {
        let nodes = self.flatten();
        let mut keys = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            let inflection = inflection_before(nodes.get(i + 1));
            let resolved = match *node {
                Spoken::Text { text, owner, index } => resolve_text(text, owner, index),
                Spoken::Slot(element, kind) => self.resolve_slot(element, kind, inflection, &keys),
            };
            keys.extend(resolved);
        }
        keys
    }

    fn flatten(&self) -> Vec<Spoken<'a>> {
        let mut nodes = Vec::new();
        match self.root {
            PhraseNode::Element(element) => flatten_element(element, None, &mut nodes),
            PhraseNode::Text(_) => debug!("phrase root is bare text, nothing to speak"),
        }
        nodes
    }

    fn resolve_slot(
        &self,
        element: &PhraseElement,
        kind: ElementType,
        inflection: Inflection,
        emitted: &[VoxKey],
    ) -> Vec<VoxKey> {
        let context = element.context();
        let keys = match kind {
            ElementType::Coach => self.resolve_coach(context, inflection),
            ElementType::Excuse => self.resolve_excuse(inflection),
            ElementType::Integer => self.resolve_integer(element),
            ElementType::Named => self.resolve_named(),
            ElementType::Platform => self.resolve_platform(inflection),
            ElementType::Service => self.resolve_service(context, emitted),
            ElementType::Station => self.resolve_station(context, inflection),
            ElementType::Stationlist => self.resolve_station_list(context, inflection),
            ElementType::Time => self.resolve_time(context),
            ElementType::Vox => resolve_vox(element),
            ElementType::Phrase | ElementType::Phraseset | ElementType::Unknown => Some(Vec::new()),
        };
        keys.unwrap_or_else(|| {
            debug!(slot = %kind, context, "slot has no value, skipped");
            Vec::new()
        })
    }

    fn resolve_coach(&self, context: &str, inflection: Inflection) -> Option<Vec<VoxKey>> {
        let letter = self.state.coach(context)?;
        let mut keys = crate::vox![silence::SLOT, format!("letter.{}.{}", letter, inflection.as_str())];
        if inflection.is_mid() {
            keys.push(VoxKey::Silence(silence::SLOT));
        }
        Some(keys)
    }

    fn resolve_excuse(&self, inflection: Inflection) -> Option<Vec<VoxKey>> {
        let excuse = self.state.excuse()?;
        let mut keys = crate::vox![silence::SHORT, format!("excuse.{}.{}", slug(excuse), inflection.as_str())];
        if inflection.is_mid() {
            keys.push(VoxKey::Silence(silence::SLOT));
        }
        Some(keys)
    }

    fn resolve_integer(&self, element: &PhraseElement) -> Option<Vec<VoxKey>> {
        let value = self.state.integer(element.context())?;
        let suffix = if value == 1 {
            element.attr("singular")
        } else {
            element.attr("plural")
        };

        let mut keys = crate::vox![silence::INTEGER, format!("number.{}.mid", value), silence::SHORT];
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            keys.push(VoxKey::Clip(format!("number.suffix.{}.end", suffix)));
        }
        Some(keys)
    }

    fn resolve_named(&self) -> Option<Vec<VoxKey>> {
        let named = self.state.named()?;
        Some(crate::vox![silence::SLOT, format!("named.{}.mid", slug(named)), silence::SLOT])
    }

    fn resolve_platform(&self, inflection: Inflection) -> Option<Vec<VoxKey>> {
        let platform = self.state.platform()?;
        let letter = if platform.letter == "¾" { "M" } else { platform.letter.as_str() };
        let mut keys = crate::vox![
            silence::SHORT,
            format!("number.{}{}.{}", platform.number, letter, inflection.as_str())
        ];
        if inflection.is_mid() {
            keys.push(VoxKey::Silence(silence::SLOT));
        }
        Some(keys)
    }

    fn resolve_service(&self, context: &str, emitted: &[VoxKey]) -> Option<Vec<VoxKey>> {
        let service = self.state.service(context)?;
        let mut keys = Vec::new();
        if !emitted.last().is_some_and(VoxKey::is_silence) {
            keys.push(VoxKey::Silence(silence::SHORT));
        }
        keys.push(VoxKey::Clip(format!("service.{}.mid", slug(service))));
        keys.push(VoxKey::Silence(silence::SHORT));
        Some(keys)
    }

    fn resolve_station(&self, context: &str, inflection: Inflection) -> Option<Vec<VoxKey>> {
        let code = self.state.station(context)?;
        let mut keys = crate::vox![silence::SLOT, format!("station.{}.{}", code, inflection.as_str())];
        if inflection.is_mid() {
            keys.push(VoxKey::Silence(silence::SLOT));
        }
        Some(keys)
    }

    fn resolve_station_list(&self, context: &str, inflection: Inflection) -> Option<Vec<VoxKey>> {
        let (last, rest) = self.state.station_list(context)?.split_last()?;
        let mut keys = crate::vox![silence::SLOT];

        for code in rest {
            keys.push(VoxKey::Clip(format!("station.{}.mid", code)));
            keys.push(VoxKey::Silence(silence::LIST));
        }

        if !rest.is_empty() {
            keys.push(VoxKey::from("station.parts.and.mid"));
            keys.push(VoxKey::Silence(silence::LIST));
            keys.push(VoxKey::Clip(format!("station.{}.{}", last, inflection.as_str())));
        } else if context == "calling" {
            keys.push(VoxKey::Clip(format!("station.{}.mid", last)));
            keys.push(VoxKey::Silence(silence::SLOT));
            keys.push(VoxKey::from("station.parts.only.end"));
        } else {
            keys.push(VoxKey::Clip(format!("station.{}.{}", last, inflection.as_str())));
        }

        keys.push(VoxKey::Silence(silence::SLOT));
        Some(keys)
    }

    fn resolve_time(&self, context: &str) -> Option<Vec<VoxKey>> {
        let time = self.state.time(context)?;
        if time == "00:00" {
            return Some(crate::vox![silence::SLOT, "number.0000.mid", silence::SLOT]);
        }

        let (hours, minutes) = time.split_once(':')?;
        let mut keys = crate::vox![silence::SLOT, format!("number.{}.begin", hours)];
        if minutes == "00" {
            keys.extend(crate::vox![silence::HUNDRED, "number.hundred.mid"]);
        } else {
            keys.extend(crate::vox![silence::SLOT, format!("number.{}.mid", minutes)]);
        }
        keys.push(VoxKey::Silence(silence::SHORT));
        Some(keys)
    }
}

/// Convenience for `Resolver::new(root, state).to_vox()`.
pub fn to_vox<S: PhraseState + ?Sized>(root: &PhraseNode, state: &S) -> Vec<VoxKey> {
    Resolver::new(root, state).to_vox()
}

fn inflection_before(next: Option<&Spoken<'_>>) -> Inflection {
    let ends_sentence = next.is_some_and(|node| {
        node.text_content()
            .trim_start()
            .starts_with(SENTENCE_MARKS)
    });
    if ends_sentence {
        Inflection::End
    } else {
        Inflection::Mid
    }
}

/// Depth-first, document order. `typed` is the nearest typed ancestor.
fn flatten_element<'a>(
    element: &'a PhraseElement,
    typed: Option<&'a PhraseElement>,
    out: &mut Vec<Spoken<'a>>,
) {
    if element.collapsed {
        return;
    }
    if is_blank(element) {
        return;
    }

    if let Some(kind) = element.kind.filter(|kind| !kind.is_container()) {
        out.push(Spoken::Slot(element, kind));
    }

    let typed = if element.kind.is_some() { Some(element) } else { typed };
    for (index, child) in element.children.iter().enumerate() {
        match child {
            PhraseNode::Text(text) => {
                let owner = typed.filter(|owner| owner.kind.is_some_and(|k| k.is_container()));
                if let Some(owner) = owner
                    && !text.trim().is_empty()
                {
                    out.push(Spoken::Text { text, owner, index });
                }
            }
            PhraseNode::Element(child) => flatten_element(child, typed, out),
        }
    }
}

/// An element with children, none of which speak. Childless slots still
/// speak, since their value comes from the state.
fn is_blank(element: &PhraseElement) -> bool {
    !element.children.is_empty() && !element.children.iter().any(speaks)
}

/// Non-blank text, or an uncollapsed element holding a slot or such text.
fn speaks(node: &PhraseNode) -> bool {
    match node {
        PhraseNode::Text(text) => !text.trim().is_empty(),
        PhraseNode::Element(element) => {
            !element.collapsed
                && !is_blank(element)
                && (element.kind.is_some_and(|kind| !kind.is_container())
                    || element.children.iter().any(speaks))
        }
    }
}

fn resolve_text(text: &str, owner: &PhraseElement, index: usize) -> Vec<VoxKey> {
    let text = clean(text);
    if text == "." {
        return crate::vox![silence::SENTENCE];
    }

    let mut keys = Vec::new();
    if text.starts_with('.') {
        keys.push(VoxKey::Silence(silence::SENTENCE));
    }
    if !text.chars().any(|c| c.is_ascii_alphanumeric()) {
        return keys;
    }

    let Some(reference) = owner.attr("ref") else {
        debug!(text = %text, "phrase text without a ref, skipped");
        return keys;
    };
    let mut id = format!("{}.{}", owner.kind.map(|k| k.as_str()).unwrap_or(""), reference);
    if owner.kind == Some(ElementType::Phraseset) {
        let Some(chosen) = owner.attr("idx") else {
            debug!(phraseset = reference, "phraseset without a chosen index, skipped");
            return keys;
        };
        id.push('.');
        id.push_str(chosen);
    }
    id.push_str(&format!(".{}", index));
    keys.push(VoxKey::Clip(id));

    if text.ends_with('.') {
        keys.push(VoxKey::Silence(silence::SENTENCE));
    }
    keys
}

fn resolve_vox(element: &PhraseElement) -> Option<Vec<VoxKey>> {
    let key = element.attr("key")?;
    let text = clean(&element.text_content());
    let mut keys = Vec::new();
    if text.starts_with('.') {
        keys.push(VoxKey::Silence(silence::SENTENCE));
    }
    keys.push(VoxKey::from(key));
    if text.ends_with('.') {
        keys.push(VoxKey::Silence(silence::SENTENCE));
    }
    Some(keys)
}
