use crate::facts::SlotMap;
use core::ops::Range;
use regex::Regex;

/// What happened to one slot during a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The slot text was replaced with a different value.
    Replaced,

    /// The slot already held the requested value.
    Unchanged,

    /// No anchor for the slot exists in the document.
    Missing,

    /// More than one anchor matches the slot, so it was left alone.
    Ambiguous,
}

/// Result of patching a document in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub content: String,

    /// Whether `content` differs from the input document.
    pub changed: bool,

    /// Per-slot outcomes, in slot order.
    pub slots: Vec<(String, SlotOutcome)>,
}

impl PatchOutcome {
    /// Slots with the given outcome.
    pub fn slots_with(&self, outcome: SlotOutcome) -> impl Iterator<Item = &str> {
        self.slots.iter().filter(move |(_, o)| *o == outcome).map(|(slot, _)| slot.as_str())
    }

    #[must_use]
    pub fn count(&self, outcome: SlotOutcome) -> usize {
        self.slots_with(outcome).count()
    }
}

/// Replace the text of every slot in `slots` that has exactly one anchor in `document`.
#[must_use]
pub fn patch(document: &str, slots: &SlotMap) -> PatchOutcome {
    let mut content = document.to_string();
    let mut outcomes = Vec::with_capacity(slots.len());

    for (slot, value) in slots {
        let outcome = patch_slot(&mut content, slot, &escape_text(value));
        outcomes.push((slot.clone(), outcome));
    }

    PatchOutcome {
        changed: content != document,
        content,
        slots: outcomes,
    }
}

fn patch_slot(content: &mut String, slot: &str, value: &str) -> SlotOutcome {
    let Some(re) = anchor_regex(slot) else {
        return SlotOutcome::Missing;
    };

    let regions: Vec<Range<usize>> = re
        .captures_iter(content.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|region| region.range())
        .take(2)
        .collect();

    match regions.as_slice() {
        [] => SlotOutcome::Missing,
        [region] if content.get(region.clone()) == Some(value) => SlotOutcome::Unchanged,
        [region] => {
            content.replace_range(region.clone(), value);
            SlotOutcome::Replaced
        }
        _ => SlotOutcome::Ambiguous,
    }
}

/// Start tag with a whitespace-preceded `id="{slot}"` attribute that is not self-closing, capturing the text
/// that follows it up to the next tag.
fn anchor_regex(slot: &str) -> Option<Regex> {
    let pattern = format!(r#"<[A-Za-z][^<>]*?\sid\s*=\s*["']{}["'](?:[^<>]*[^/<>])?>([^<]*)"#, regex::escape(slot));
    Regex::new(&pattern).ok()
}

fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
