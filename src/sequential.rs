use crate::exporter::EnexWriter;
use crate::process::{self, open_archive};
use crate::utils::{
    ExportConfig, ExportReport, create_staging_file, make_bar, persist_staging_file,
};
use eyre::{Context, Result};
use std::io::BufWriter;

/// Convert the archive one note at a time on the calling thread.
pub fn execute(config: &ExportConfig) -> Result<ExportReport> {
    let mut archive = open_archive(config)?;
    let entries = archive.note_entries();
    tracing::info!(
        notes = entries.len(),
        archive = %config.import_file.display(),
        "converting sequentially"
    );

    let pb = make_bar(entries.len() as u64, config.quiet);
    let staging = create_staging_file(&config.export_file)?;
    let mut report = ExportReport {
        output: config.export_file.clone(),
        ..ExportReport::default()
    };

    {
        let mut writer = EnexWriter::begin(BufWriter::new(staging.as_file()))
            .wrap_err("Failed to write ENEX header")?;

        for entry in &entries {
            let loaded = process::load_entry(&mut archive, entry, config.include_trashed);
            process::apply(
                process::render(loaded),
                &mut writer,
                &mut report,
                config.strict,
            )?;
            pb.inc(1);
        }

        writer.finish().wrap_err("Failed to write ENEX footer")?;
    }

    pb.finish_and_clear();
    persist_staging_file(staging, &config.export_file)?;
    Ok(report)
}
