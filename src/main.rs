use clap::Parser;
use eyre::{Context, Result, eyre};
use keep_to_enex::archive::{ArchiveLayout, DEFAULT_NOTES_DIR};
use keep_to_enex::utils::{ExportConfig, resolve_export_path};
use keep_to_enex::{convert, logging};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert a Google Keep Takeout archive to an Evernote ENEX file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Google Takeout export file (.zip).
    #[arg(value_name = "IMPORT_FILE")]
    import_file: PathBuf,

    /// Output file. ".enex" is appended when missing.
    /// Defaults to GoogleKeep.enex if not set in config.
    #[arg(value_name = "EXPORT_FILE")]
    export_file: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/keep-to-enex/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Archive directory holding the note records (default: Takeout/Keep/).
    #[arg(long, value_name = "DIR")]
    notes_dir: Option<String>,

    /// Archive directory holding attachments (default: the notes directory).
    #[arg(long, value_name = "DIR")]
    attachments_dir: Option<String>,

    /// Also convert notes that are in the trash.
    #[arg(long)]
    include_trashed: bool,

    /// Abort on the first note record that cannot be parsed.
    #[arg(long)]
    strict: bool,

    /// Number of threads rendering notes.
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Log every note and skipped item.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress the progress bar and summary.
    #[arg(short, long)]
    quiet: bool,

    /// Log filter, e.g. "debug" or "keep_to_enex=trace".
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    output: Option<PathBuf>,
    notes_dir: Option<String>,
    attachments_dir: Option<String>,
    include_trashed: Option<bool>,
    jobs: Option<usize>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("keep-to-enex/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(cli.verbose, cli.log_level.as_deref())
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    if !cli.import_file.exists() {
        return Err(eyre!(
            "Takeout archive not found at: {}",
            cli.import_file.display()
        ));
    }

    // 2. Resolve output path (CLI > Config > Default)
    let requested = cli.export_file.or(file_cfg.output);
    let export_file = resolve_export_path(requested.as_deref());

    // 3. Resolve archive layout (CLI > Config > Default)
    let notes_dir = cli
        .notes_dir
        .or(file_cfg.notes_dir)
        .unwrap_or_else(|| DEFAULT_NOTES_DIR.to_string());
    let attachments_dir = cli.attachments_dir.or(file_cfg.attachments_dir);
    let layout = ArchiveLayout::new(&notes_dir, attachments_dir.as_deref());

    // 4. Build the Export Config
    let config = ExportConfig {
        import_file: cli.import_file,
        export_file,
        layout,
        include_trashed: cli.include_trashed || file_cfg.include_trashed.unwrap_or(false),
        strict: cli.strict,
        jobs: cli.jobs.or(file_cfg.jobs).unwrap_or(1),
        quiet: cli.quiet,
    };

    // 5. Run the conversion
    let report = convert(&config)?;

    if !config.quiet {
        eprintln!("{}", report.summary());
    }
    Ok(())
}
