use crate::archive::ArchiveLayout;
use chrono::{DateTime, Local, TimeZone};
use eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_EXPORT_NAME: &str = "GoogleKeep";
pub const EXPORT_EXTENSION: &str = ".enex";

/// Configuration required to run the conversion.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub import_file: PathBuf,
    pub export_file: PathBuf,
    pub layout: ArchiveLayout,
    pub include_trashed: bool,
    pub strict: bool,
    pub jobs: usize,
    pub quiet: bool,
}

impl ExportConfig {
    pub fn new(import_file: impl Into<PathBuf>, export_file: impl Into<PathBuf>) -> Self {
        Self {
            import_file: import_file.into(),
            export_file: export_file.into(),
            layout: ArchiveLayout::default(),
            include_trashed: false,
            strict: false,
            jobs: 1,
            quiet: true,
        }
    }
}

/// Output file name: `GoogleKeep` when none is given, `.enex` appended when missing.
pub fn resolve_export_path(requested: Option<&Path>) -> PathBuf {
    let name = requested
        .map(|p| p.as_os_str().to_os_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.into());

    if name.to_string_lossy().ends_with(EXPORT_EXTENSION) {
        PathBuf::from(name)
    } else {
        let mut name = name;
        name.push(EXPORT_EXTENSION);
        PathBuf::from(name)
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// ENEX timestamp (`YYYYMMDDTHHMMSSZ`) for microseconds since the epoch.
///
/// Known quirk: the wall-clock time is in the machine's local timezone even
/// though the format ends in `Z`. Use [`enex_timestamp_in`] for a fixed zone.
pub fn enex_timestamp(usec: i64) -> Option<String> {
    enex_timestamp_in(usec, &Local)
}

pub fn enex_timestamp_in<Tz: TimeZone>(usec: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: fmt::Display,
{
    let utc = DateTime::from_timestamp_micros(usec)?;
    Some(utc.with_timezone(tz).format("%Y%m%dT%H%M%SZ").to_string())
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Something that was left out of the document without stopping the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    NoteSkipped {
        entry: String,
        reason: String,
    },
    AttachmentSkipped {
        entry: String,
        attachment: String,
        reason: String,
    },
    DimensionsUnavailable {
        entry: String,
        attachment: String,
        reason: String,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::NoteSkipped { entry, reason } => write!(f, "Skipped note {}: {}", entry, reason),
            Issue::AttachmentSkipped {
                entry,
                attachment,
                reason,
            } => write!(f, "Skipped attachment {} of {}: {}", attachment, entry, reason),
            Issue::DimensionsUnavailable {
                entry,
                attachment,
                reason,
            } => write!(
                f,
                "No dimensions for {} of {}: {}",
                attachment, entry, reason
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub output: PathBuf,
    pub written: usize,
    pub trashed: usize,
    pub issues: Vec<Issue>,
}

impl ExportReport {
    pub fn skipped_notes(&self) -> usize {
        self.count(|i| matches!(i, Issue::NoteSkipped { .. }))
    }

    pub fn skipped_attachments(&self) -> usize {
        self.count(|i| matches!(i, Issue::AttachmentSkipped { .. }))
    }

    fn count(&self, pred: impl Fn(&Issue) -> bool) -> usize {
        self.issues.iter().filter(|i| pred(i)).count()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Done. {} notes written to {}, {} trashed skipped.",
            self.written,
            self.output.display(),
            self.trashed
        );
        let notes = self.skipped_notes();
        let attachments = self.skipped_attachments();
        if notes > 0 || attachments > 0 {
            summary.push_str(&format!(
                " Skipped {} malformed note(s) and {} attachment(s).",
                notes, attachments
            ));
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Output file
// ---------------------------------------------------------------------------

/// Temporary file next to `target`, so the final rename stays on one filesystem.
///
/// On unix it is created with mode `0o666` minus the umask, the same mode a
/// plain `File::create` would give the target.
pub fn create_staging_file(target: &Path) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".keep-to-enex-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
        .tempfile_in(dir)
        .wrap_err_with(|| format!("Failed to create output in {}", dir.display()))
}

pub fn persist_staging_file(staging: NamedTempFile, target: &Path) -> Result<()> {
    staging
        .persist(target)
        .map_err(|e| eyre!("Failed to write {}: {}", target.display(), e.error))?;
    Ok(())
}

pub fn make_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}
