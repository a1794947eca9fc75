use super::LOG_TARGET;
use super::patcher::{SlotOutcome, patch};
use crate::Result;
use crate::facts::SlotMap;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// What patching one document on disk did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: Utf8PathBuf,

    /// Whether the patched content differs from what was on disk.
    pub changed: bool,

    /// Whether the file was rewritten.
    pub written: bool,

    /// Number of slots whose text was replaced.
    pub replaced: usize,

    /// Slots with no usable anchor in the document.
    pub unmatched: Vec<String>,
}

/// Read `path`, patch `slots` into it, and write it back only if something changed.
///
/// With `dry_run` set the file is never written. Slots without a unique anchor are logged and skipped.
pub fn patch_document(path: &Utf8Path, slots: &SlotMap, dry_run: bool) -> Result<DocumentReport> {
    let original = fs::read_to_string(path).with_context(|| format!("reading document '{path}'"))?;
    let outcome = patch(&original, slots);

    for (slot, result) in &outcome.slots {
        match result {
            SlotOutcome::Missing => log::warn!(target: LOG_TARGET, "Slot '{slot}' not found in '{path}'"),
            SlotOutcome::Ambiguous => log::warn!(target: LOG_TARGET, "Slot '{slot}' appears more than once in '{path}', left untouched"),
            SlotOutcome::Replaced | SlotOutcome::Unchanged => {}
        }
    }

    let written = outcome.changed && !dry_run;
    if written {
        fs::write(path, &outcome.content).with_context(|| format!("writing document '{path}'"))?;
        log::info!(target: LOG_TARGET, "Updated {} slot(s) in '{path}'", outcome.count(SlotOutcome::Replaced));
    } else if outcome.changed {
        log::info!(target: LOG_TARGET, "Dry run, not writing {} changed slot(s) to '{path}'", outcome.count(SlotOutcome::Replaced));
    } else {
        log::info!(target: LOG_TARGET, "'{path}' is already up to date");
    }

    let unmatched = outcome
        .slots
        .iter()
        .filter(|(_, o)| matches!(o, SlotOutcome::Missing | SlotOutcome::Ambiguous))
        .map(|(slot, _)| slot.clone())
        .collect();

    Ok(DocumentReport {
        path: path.to_path_buf(),
        changed: outcome.changed,
        written,
        replaced: outcome.count(SlotOutcome::Replaced),
        unmatched,
    })
}
