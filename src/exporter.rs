//! ENEX document writer.
//!
//! [`EnexWriter::begin`] writes the header, [`EnexWriter::write_note`] streams
//! one `<note>` at a time, and [`EnexWriter::finish`] writes the footer and
//! hands the sink back. Dropping the writer without `finish` leaves an
//! unterminated document, which is why the drivers write into a staging file.

use crate::markup::{Markup, escape};
use crate::resources::Resource;
use std::io::{self, Write};

pub const ENEX_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE en-export SYSTEM "http://xml.evernote.com/pub/evernote-export3.dtd">
<en-export export-date="20201201T084211Z" application="Evernote" version="10.1.7">
"#;

pub const ENEX_FOOTER: &str = "</en-export>\n";

/// Everything needed to write one `<note>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
    pub title: String,
    /// Used for both `<created>` and `<updated>`.
    pub timestamp: String,
    /// Body markup followed by the `<en-media>` references.
    pub content: Markup,
    pub tags: Vec<String>,
    pub resources: Vec<Resource>,
}

pub struct EnexWriter<W: Write> {
    inner: W,
    notes: usize,
}

impl<W: Write> EnexWriter<W> {
    pub fn begin(mut inner: W) -> io::Result<Self> {
        inner.write_all(ENEX_HEADER.as_bytes())?;
        Ok(Self { inner, notes: 0 })
    }

    pub fn write_note(&mut self, note: &RenderedNote) -> io::Result<()> {
        let w = &mut self.inner;
        writeln!(w, "  <note>")?;
        writeln!(w, "    <title>{}</title>", escape(&note.title))?;
        writeln!(w, "    <created>{}</created>", note.timestamp)?;
        writeln!(w, "    <updated>{}</updated>", note.timestamp)?;
        writeln!(w, "    <note-attributes>")?;
        writeln!(w, "    </note-attributes>")?;
        writeln!(w, "    <content>")?;
        writeln!(
            w,
            r#"      <![CDATA[<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#
        )?;
        writeln!(
            w,
            r#"<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd"><en-note>"#
        )?;
        writeln!(w, "{}", note.content)?;
        writeln!(w, "</en-note>]]>")?;
        writeln!(w, "    </content>")?;
        for tag in &note.tags {
            writeln!(w, "    <tag>{}</tag>", escape(tag))?;
        }
        for resource in &note.resources {
            write_resource(w, resource)?;
        }
        writeln!(w, "  </note>")?;
        self.notes += 1;
        Ok(())
    }

    pub fn notes_written(&self) -> usize {
        self.notes
    }

    /// Write the footer, flush, and return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(ENEX_FOOTER.as_bytes())?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn write_resource<W: Write>(w: &mut W, resource: &Resource) -> io::Result<()> {
    write!(w, "    <resource><data encoding=\"base64\">")?;
    w.write_all(resource.data.as_bytes())?;
    write!(w, "</data><mime>{}</mime>", escape(resource.media_type.as_str()))?;
    if let Some(d) = resource.dimensions {
        write!(w, "<width>{}</width><height>{}</height>", d.width, d.height)?;
    }
    writeln!(
        w,
        "<resource-attributes><file-name>{}</file-name></resource-attributes></resource>",
        escape(&resource.file_name)
    )
}
