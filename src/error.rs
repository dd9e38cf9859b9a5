use thiserror::Error;

/// Failures while reading entries out of the Takeout archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Entry not found in archive: {name}")]
    NotFound { name: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }
}

/// Failures while locating an attachment's bytes. Always recovered per attachment.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Attachment not found in archive (tried {tried:?})")]
    Missing { path: String, tried: Vec<String> },

    #[error("Failed to read attachment {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: ArchiveError,
    },
}

/// An image whose dimensions could not be read. Always recovered per attachment.
#[derive(Error, Debug)]
#[error("Could not read image dimensions: {0}")]
pub struct ProbeError(#[from] pub imagesize::ImageError);

/// A note record that could not be turned into a note.
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Failed to read note record {entry}: {source}")]
    Read {
        entry: String,
        #[source]
        source: ArchiveError,
    },

    #[error("Malformed note record {entry}: {source}")]
    Json {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Note record {entry} has an out-of-range timestamp: {usec}")]
    Timestamp { entry: String, usec: i64 },
}

impl NoteError {
    pub fn entry(&self) -> &str {
        match self {
            NoteError::Read { entry, .. }
            | NoteError::Json { entry, .. }
            | NoteError::Timestamp { entry, .. } => entry,
        }
    }
}
