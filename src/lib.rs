//! # keep-to-enex
//!
//! Converts a Google Keep export from [Google Takeout](https://takeout.google.com)
//! into a single Evernote `.enex` file that Evernote (and most apps that read
//! ENEX, such as Joplin or Apple Notes) can import.
//!
//! ## What it does
//!
//! Takeout stores each Keep note as a JSON file under `Takeout/Keep/` inside a
//! zip, with images and recordings next to it. This tool reads that zip
//! **read-only**, and for every note that is not in the trash writes one
//! `<note>` element with:
//!
//! - the title and last-edited time,
//! - the text (HTML-escaped, links made clickable, line breaks kept) or the
//!   checklist as ENML to-do boxes,
//! - one tag per Keep label, plus `Archived` and `Pinned` tags,
//! - every attachment embedded as a base64 `<resource>`, referenced from the
//!   note body by its MD5 hash.
//!
//! Missing attachments and unreadable images are reported and skipped. A note
//! record that cannot be parsed is skipped too, unless `--strict` is given. The
//! output file only appears once the whole document has been written.
//!
//! ## Usage
//!
//! ```sh
//! # Writes GoogleKeep.enex in the current directory
//! keep-to-enex takeout-20201201.zip
//!
//! # Custom output name, render on 4 threads
//! keep-to-enex takeout.zip notes -j 4
//! ```
//!
//! Preferences can be persisted in `~/.config/keep-to-enex/config.toml`.
pub mod archive;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod logging;
pub mod markup;
pub mod parallel;
pub mod process;
pub mod renderer;
pub mod resources;
pub mod sequential;
pub mod tags;
pub mod utils;

pub use utils::{ExportConfig, ExportReport, Issue};

/// Run a conversion, on worker threads when `config.jobs > 1`.
pub fn convert(config: &ExportConfig) -> eyre::Result<ExportReport> {
    if config.jobs > 1 {
        parallel::execute(config)
    } else {
        sequential::execute(config)
    }
}
