//! The per-note pipeline shared by both drivers.
//!
//! `load_entry` does all archive I/O for one note record, `render` turns the
//! loaded data into a [`RenderedNote`] without touching the archive, and
//! `apply` writes the result and updates the report. Only `render` is moved to
//! worker threads by the parallel driver.

use crate::archive::TakeoutArchive;
use crate::error::{NoteError, ResolveError};
use crate::exporter::{EnexWriter, RenderedNote};
use crate::importer::{AttachmentRef, NoteRecord};
use crate::renderer;
use crate::resources::Resource;
use crate::tags;
use crate::utils::{ExportConfig, ExportReport, Issue, enex_timestamp};
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};

/// An attachment after the archive lookup.
#[derive(Debug)]
pub enum FetchedAttachment {
    Found {
        reference: AttachmentRef,
        bytes: Vec<u8>,
    },
    Missing {
        reference: AttachmentRef,
        error: ResolveError,
    },
}

/// A note record with everything it needs from the archive.
#[derive(Debug)]
pub struct NoteJob {
    pub entry: String,
    pub record: NoteRecord,
    pub timestamp: String,
    pub attachments: Vec<FetchedAttachment>,
}

#[derive(Debug)]
pub enum Loaded {
    Note(Box<NoteJob>),
    Trashed { entry: String },
    Malformed(NoteError),
}

#[derive(Debug)]
pub enum Rendered {
    Note {
        entry: String,
        note: Box<RenderedNote>,
        issues: Vec<Issue>,
    },
    Trashed {
        entry: String,
    },
    Malformed(NoteError),
}

pub fn open_archive(config: &ExportConfig) -> Result<TakeoutArchive<BufReader<File>>> {
    TakeoutArchive::open(&config.import_file, config.layout.clone()).wrap_err_with(|| {
        format!(
            "Failed to open Takeout archive: {}",
            config.import_file.display()
        )
    })
}

pub fn load_entry<R: Read + Seek>(
    archive: &mut TakeoutArchive<R>,
    entry: &str,
    include_trashed: bool,
) -> Loaded {
    let bytes = match archive.read(entry) {
        Ok(b) => b,
        Err(source) => {
            return Loaded::Malformed(NoteError::Read {
                entry: entry.to_string(),
                source,
            });
        }
    };

    let record = match NoteRecord::from_slice(&bytes) {
        Ok(r) => r,
        Err(source) => {
            return Loaded::Malformed(NoteError::Json {
                entry: entry.to_string(),
                source,
            });
        }
    };

    if record.is_trashed && !include_trashed {
        return Loaded::Trashed {
            entry: entry.to_string(),
        };
    }

    let Some(timestamp) = enex_timestamp(record.user_edited_timestamp_usec) else {
        return Loaded::Malformed(NoteError::Timestamp {
            entry: entry.to_string(),
            usec: record.user_edited_timestamp_usec,
        });
    };

    let attachments = record
        .attachments
        .iter()
        .map(|reference| match archive.read_attachment(entry, &reference.file_path) {
            Ok((_, bytes)) => FetchedAttachment::Found {
                reference: reference.clone(),
                bytes,
            },
            Err(error) => FetchedAttachment::Missing {
                reference: reference.clone(),
                error,
            },
        })
        .collect();

    Loaded::Note(Box::new(NoteJob {
        entry: entry.to_string(),
        record,
        timestamp,
        attachments,
    }))
}

pub fn render(loaded: Loaded) -> Rendered {
    match loaded {
        Loaded::Note(job) => {
            let NoteJob {
                entry,
                record,
                timestamp,
                attachments,
            } = *job;
            let (note, issues) = render_note(&entry, &record, timestamp, attachments);
            Rendered::Note {
                entry,
                note: Box::new(note),
                issues,
            }
        }
        Loaded::Trashed { entry } => Rendered::Trashed { entry },
        Loaded::Malformed(e) => Rendered::Malformed(e),
    }
}

/// Content, tags and resources for one note, plus whatever had to be left out.
pub fn render_note(
    entry: &str,
    record: &NoteRecord,
    timestamp: String,
    attachments: Vec<FetchedAttachment>,
) -> (RenderedNote, Vec<Issue>) {
    if record.has_both_bodies() {
        tracing::debug!(entry, "note has text and list content, using text");
    }

    let mut content = renderer::render_body(record.body());
    let mut resources = Vec::with_capacity(attachments.len());
    let mut issues = Vec::new();

    for attachment in attachments {
        match attachment {
            FetchedAttachment::Found { reference, bytes } => {
                let (resource, probe_error) = Resource::from_bytes(
                    &reference.file_path,
                    &bytes,
                    reference.mimetype.as_deref(),
                );
                if let Some(e) = probe_error {
                    issues.push(Issue::DimensionsUnavailable {
                        entry: entry.to_string(),
                        attachment: reference.file_path.clone(),
                        reason: e.to_string(),
                    });
                }
                content.append(&resource.media_reference());
                resources.push(resource);
            }
            FetchedAttachment::Missing { reference, error } => {
                issues.push(Issue::AttachmentSkipped {
                    entry: entry.to_string(),
                    attachment: reference.file_path,
                    reason: error.to_string(),
                });
            }
        }
    }

    let note = RenderedNote {
        title: record.title.clone(),
        timestamp,
        content,
        tags: tags::note_tags(record),
        resources,
    };
    (note, issues)
}

/// Write one pipeline result and account for it in the report.
///
/// A malformed note is an error only in strict mode.
pub fn apply<W: Write>(
    rendered: Rendered,
    writer: &mut EnexWriter<W>,
    report: &mut ExportReport,
    strict: bool,
) -> Result<()> {
    match rendered {
        Rendered::Note {
            entry,
            note,
            issues,
        } => {
            writer
                .write_note(&note)
                .wrap_err_with(|| format!("Failed to write note {}", entry))?;
            for issue in &issues {
                tracing::warn!("{}", issue);
            }
            tracing::debug!(
                entry = %entry,
                resources = note.resources.len(),
                tags = note.tags.len(),
                "note written"
            );
            report.written += 1;
            report.issues.extend(issues);
        }
        Rendered::Trashed { entry } => {
            tracing::debug!(entry = %entry, "skipping trashed note");
            report.trashed += 1;
        }
        Rendered::Malformed(e) => {
            if strict {
                return Err(eyre::Report::new(e).wrap_err("Aborting on malformed note record"));
            }
            tracing::warn!(entry = e.entry(), error = %e, "skipping malformed note");
            report.issues.push(Issue::NoteSkipped {
                entry: e.entry().to_string(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}
