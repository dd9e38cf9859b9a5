/// Type definitions for Google Keep note records as found in a Takeout export.
///
/// Every note is a standalone JSON document. Field names are camelCase on the
/// wire. A trimmed example:
///
/// ```json
/// {
///   "title": "Groceries",
///   "userEditedTimestampUsec": 1606811531000000,
///   "isTrashed": false,
///   "isArchived": false,
///   "isPinned": true,
///   "listContent": [{ "text": "Milk", "isChecked": false }],
///   "labels": [{ "name": "Home" }],
///   "attachments": [{ "filePath": "1761a.png", "mimetype": "image/png" }]
/// }
/// ```
///
/// Only the fields the converter reads are modelled; unknown fields (`color`,
/// `annotations`, `textContentHtml`, ...) are ignored.
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Note record
// ---------------------------------------------------------------------------

/// One exported Keep note.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub title: String,
    /// Last user edit, microseconds since the Unix epoch.
    pub user_edited_timestamp_usec: i64,
    pub is_trashed: bool,
    pub is_archived: bool,
    pub is_pinned: bool,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub list_content: Option<Vec<ListItem>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl NoteRecord {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The shape of the note body.
    ///
    /// Text wins when a record carries both text and list content.
    pub fn body(&self) -> NoteBody<'_> {
        match (&self.text_content, &self.list_content) {
            (Some(text), _) => NoteBody::Text(text),
            (None, Some(items)) => NoteBody::Checklist(items),
            (None, None) => NoteBody::Empty,
        }
    }

    pub fn has_both_bodies(&self) -> bool {
        self.text_content.is_some() && self.list_content.is_some()
    }
}

/// Borrowed view of a note body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteBody<'a> {
    Text(&'a str),
    Checklist(&'a [ListItem]),
    Empty,
}

// ---------------------------------------------------------------------------
// Nested records
// ---------------------------------------------------------------------------

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub text: String,
    pub is_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
}

/// Reference to a file stored elsewhere in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    /// Path relative to the Keep directory of the archive.
    pub file_path: String,
    /// Media type claimed by the exporter. Only used when sniffing the bytes fails.
    #[serde(default)]
    pub mimetype: Option<String>,
}
