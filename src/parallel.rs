use crate::exporter::EnexWriter;
use crate::process::{self, Loaded, Rendered, open_archive};
use crate::utils::{
    ExportConfig, ExportReport, create_staging_file, make_bar, persist_staging_file,
};
use crossbeam_channel::bounded;
use eyre::{Context, Result};
use std::collections::BTreeMap;
use std::io::BufWriter;

/// Convert the archive with rendering spread over `config.jobs` worker threads.
///
/// The archive is read by a single loader thread and notes are written by the
/// calling thread in archive order, so the output matches the sequential
/// driver byte for byte.
///
/// The loader takes a credit before loading each note and the writer returns
/// one per note written, so at most `window` loaded notes are in memory while
/// a slow render holds up the in-order writer.
pub fn execute(config: &ExportConfig) -> Result<ExportReport> {
    let mut archive = open_archive(config)?;
    let entries = archive.note_entries();
    let n_workers = config.jobs.max(1);
    tracing::info!(
        notes = entries.len(),
        workers = n_workers,
        archive = %config.import_file.display(),
        "converting in parallel"
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

        let window = n_workers * 4;
        let (job_tx, job_rx) = bounded::<(usize, Loaded)>(n_workers * 2);
        let (done_tx, done_rx) = bounded::<(usize, Rendered)>(n_workers * 2);
        let (credit_tx, credit_rx) = bounded::<()>(window);
        for _ in 0..window {
            credit_tx
                .send(())
                .wrap_err("Failed to prime the parallel pipeline")?;
        }

        std::thread::scope(|s| {
            for _ in 0..n_workers {
                let (job_rx, done_tx) = (job_rx.clone(), done_tx.clone());
                s.spawn(move || {
                    while let Ok((seq, loaded)) = job_rx.recv() {
                        if done_tx.send((seq, process::render(loaded))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(done_tx);

            let (archive, entries) = (&mut archive, &entries);
            let include_trashed = config.include_trashed;
            s.spawn(move || {
                for (seq, entry) in entries.iter().enumerate() {
                    if credit_rx.recv().is_err() {
                        break;
                    }
                    let loaded = process::load_entry(archive, entry, include_trashed);
                    if job_tx.send((seq, loaded)).is_err() {
                        break;
                    }
                }
            });

            // Owned here so an early return disconnects the workers and the
            // loader before the scope joins them.
            let (done_rx, credit_tx) = (done_rx, credit_tx);
            let mut pending = BTreeMap::new();
            let mut next = 0usize;
            for (seq, rendered) in done_rx.iter() {
                pending.insert(seq, rendered);
                debug_assert!(pending.len() <= window);
                while let Some(rendered) = pending.remove(&next) {
                    process::apply(rendered, &mut writer, &mut report, config.strict)?;
                    pb.inc(1);
                    next += 1;
                    // The loader is gone once every entry has been loaded.
                    let _ = credit_tx.send(());
                }
            }
            Ok::<_, eyre::Error>(())
        })
        .wrap_err("Parallel conversion failed")?;

        writer.finish().wrap_err("Failed to write ENEX footer")?;
    }

    pb.finish_and_clear();
    persist_staging_file(staging, &config.export_file)?;
    Ok(report)
}
