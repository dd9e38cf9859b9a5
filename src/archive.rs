//! Read-only access to a Google Takeout zip.
//!
//! Takeout puts every Keep note at `Takeout/Keep/<title>.json` and the files it
//! references next to it. Localised or older exports use a different directory,
//! so both prefixes are configurable through [`ArchiveLayout`].

use crate::error::{ArchiveError, ResolveError};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

pub const DEFAULT_NOTES_DIR: &str = "Takeout/Keep/";

/// Where note records and attachments live inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    notes_dir: String,
    attachments_dir: String,
}

impl ArchiveLayout {
    pub fn new(notes_dir: &str, attachments_dir: Option<&str>) -> Self {
        let notes_dir = normalize_dir(notes_dir);
        let attachments_dir = attachments_dir
            .map(normalize_dir)
            .unwrap_or_else(|| notes_dir.clone());
        Self {
            notes_dir,
            attachments_dir,
        }
    }

    pub fn notes_dir(&self) -> &str {
        &self.notes_dir
    }

    pub fn attachments_dir(&self) -> &str {
        &self.attachments_dir
    }

    /// Note records are `.json` entries anywhere below the notes directory.
    pub fn is_note_record(&self, name: &str) -> bool {
        !name.ends_with('/') && name.starts_with(&self.notes_dir) && name.ends_with(".json")
    }

    /// Archive names to try, in order, for an attachment referenced by `note_entry`.
    pub fn attachment_candidates(&self, note_entry: &str, file_path: &str) -> Vec<String> {
        let file_path = file_path.trim_start_matches('/');
        let mut candidates = vec![format!("{}{}", self.attachments_dir, file_path)];

        let note_dir = match note_entry.rfind('/') {
            Some(idx) => &note_entry[..=idx],
            None => "",
        };
        let sibling = format!("{}{}", note_dir, file_path);
        if !candidates.contains(&sibling) {
            candidates.push(sibling);
        }
        candidates
    }
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self::new(DEFAULT_NOTES_DIR, None)
    }
}

fn normalize_dir(dir: &str) -> String {
    let dir = dir.trim_start_matches('/');
    if dir.is_empty() || dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    }
}

/// An opened Takeout archive. Entries are only ever read, never modified.
pub struct TakeoutArchive<R> {
    zip: ZipArchive<R>,
    layout: ArchiveLayout,
}

impl TakeoutArchive<BufReader<File>> {
    pub fn open(path: &Path, layout: ArchiveLayout) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), layout)
    }
}

impl<R: Read + Seek> TakeoutArchive<R> {
    pub fn new(reader: R, layout: ArchiveLayout) -> Result<Self, ArchiveError> {
        let zip = ZipArchive::new(reader)?;
        Ok(Self { zip, layout })
    }

    /// Names of the note-record entries, in central-directory order.
    pub fn note_entries(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter(|name| self.layout.is_note_record(name))
            .map(str::to_string)
            .collect()
    }

    /// Read a whole entry into memory.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(ArchiveError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Locate and read the bytes of an attachment referenced by `note_entry`.
    ///
    /// Returns the archive name the bytes were found under.
    pub fn read_attachment(
        &mut self,
        note_entry: &str,
        file_path: &str,
    ) -> Result<(String, Vec<u8>), ResolveError> {
        let candidates = self.layout.attachment_candidates(note_entry, file_path);
        for name in &candidates {
            match self.read(name) {
                Ok(bytes) => return Ok((name.clone(), bytes)),
                Err(e) if e.is_not_found() => continue,
                Err(source) => {
                    return Err(ResolveError::Read {
                        path: file_path.to_string(),
                        source,
                    });
                }
            }
        }
        Err(ResolveError::Missing {
            path: file_path.to_string(),
            tried: candidates,
        })
    }
}
