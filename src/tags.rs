use crate::importer::NoteRecord;

pub const ARCHIVED_TAG: &str = "Archived";
pub const PINNED_TAG: &str = "Pinned";

/// Tag names for a note: labels in their original order, then `Archived`, then `Pinned`.
///
/// Duplicate labels are kept. Names are raw text; escaping happens when written.
pub fn note_tags(note: &NoteRecord) -> Vec<String> {
    let mut tags: Vec<String> = note.labels.iter().map(|l| l.name.clone()).collect();
    if note.is_archived {
        tags.push(ARCHIVED_TAG.to_string());
    }
    if note.is_pinned {
        tags.push(PINNED_TAG.to_string());
    }
    tags
}
