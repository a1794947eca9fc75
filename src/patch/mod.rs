//! Anchor-based slot replacement in banner documents.
//!
//! Documents are never parsed structurally. A slot is the text between the start tag carrying `id="{slot}"`
//! and the next `<`; nothing else in the document is touched.

mod document;
mod patcher;

pub use document::{DocumentReport, patch_document};
pub use patcher::{PatchOutcome, SlotOutcome, patch};

/// Log target for the document patcher
pub(crate) const LOG_TARGET: &str = "patch";
