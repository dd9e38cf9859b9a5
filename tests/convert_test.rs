//! End-to-end conversions of small Takeout archives through the library API.

mod common;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use common::{note_json, png, text_note, write_takeout};
use keep_to_enex::archive::ArchiveLayout;
use keep_to_enex::exporter::{ENEX_FOOTER, ENEX_HEADER};
use keep_to_enex::{ExportConfig, Issue, convert};
use regex::Regex;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn run(dir: &TempDir, entries: &[(&str, &[u8])]) -> (String, keep_to_enex::ExportReport) {
    let archive = write_takeout(dir.path(), entries);
    let config = ExportConfig::new(archive, dir.path().join("out.enex"));
    let report = convert(&config).unwrap();
    let output = fs::read_to_string(dir.path().join("out.enex")).unwrap();
    (output, report)
}

fn notes_in(output: &str) -> usize {
    output.matches("<note>").count()
}

#[test]
fn document_is_wrapped_in_header_and_footer() {
    let dir = TempDir::new().unwrap();
    let (output, report) = run(
        &dir,
        &[("Takeout/Keep/A.json", &text_note("A", "hello"))],
    );
    assert!(output.starts_with(ENEX_HEADER));
    assert!(output.ends_with(ENEX_FOOTER));
    assert_eq!(notes_in(&output), 1);
    assert_eq!(report.written, 1);
    assert!(report.issues.is_empty());
}

#[test]
fn notes_follow_archive_order() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run(
        &dir,
        &[
            ("Takeout/Keep/Second.json", &text_note("Second", "2")),
            ("Takeout/Keep/First.json", &text_note("First", "1")),
            ("Takeout/Keep/Third.json", &text_note("Third", "3")),
        ],
    );
    let second = output.find("<title>Second</title>").unwrap();
    let first = output.find("<title>First</title>").unwrap();
    let third = output.find("<title>Third</title>").unwrap();
    assert!(second < first && first < third);
}

#[test]
fn trashed_notes_are_excluded_by_default() {
    let dir = TempDir::new().unwrap();
    let trashed = note_json(json!({
        "title": "A", "userEditedTimestampUsec": 0,
        "isTrashed": true, "isArchived": false, "isPinned": false,
        "textContent": "gone"
    }));
    let archive = write_takeout(
        dir.path(),
        &[
            ("Takeout/Keep/A.json", &trashed),
            ("Takeout/Keep/B.json", &text_note("B", "kept")),
        ],
    );

    let config = ExportConfig::new(&archive, dir.path().join("default.enex"));
    let report = convert(&config).unwrap();
    let output = fs::read_to_string(dir.path().join("default.enex")).unwrap();
    assert!(!output.contains("<title>A</title>"));
    assert_eq!((report.written, report.trashed), (1, 1));

    let mut config = ExportConfig::new(&archive, dir.path().join("all.enex"));
    config.include_trashed = true;
    let report = convert(&config).unwrap();
    let output = fs::read_to_string(dir.path().join("all.enex")).unwrap();
    assert!(output.contains("<title>A</title>"));
    assert_eq!((report.written, report.trashed), (2, 0));
}

#[test]
fn labels_then_archived_and_no_pinned() {
    let dir = TempDir::new().unwrap();
    let note = note_json(json!({
        "title": "T", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": true, "isPinned": false,
        "textContent": "x",
        "labels": [{"name": "Work"}]
    }));
    let (output, _) = run(&dir, &[("Takeout/Keep/T.json", &note)]);
    assert!(output.contains("    <tag>Work</tag>\n    <tag>Archived</tag>\n  </note>"));
    assert!(!output.contains("<tag>Pinned</tag>"));
}

#[test]
fn text_content_is_escaped_with_breaks() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run(
        &dir,
        &[(
            "Takeout/Keep/A.json",
            &text_note("Q&A", "a < b & c > d\nsecond line\nvisit https://rust-lang.org"),
        )],
    );
    assert!(output.contains("<title>Q&amp;A</title>"));
    assert!(output.contains(
        "a &lt; b &amp; c &gt; d<br/>\nsecond line<br/>\nvisit \
         <a href=\"https://rust-lang.org\">https://rust-lang.org</a>\n</en-note>"
    ));
}

#[test]
fn checklist_items_keep_order_and_state() {
    let dir = TempDir::new().unwrap();
    let note = note_json(json!({
        "title": "List", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": false, "isPinned": false,
        "listContent": [
            {"text": "one", "isChecked": true},
            {"text": "two", "isChecked": false},
            {"text": "three", "isChecked": true}
        ]
    }));
    let (output, _) = run(&dir, &[("Takeout/Keep/L.json", &note)]);

    let re = Regex::new(r#"<div><en-todo checked="(true|false)"/>([^<]*)</div>"#).unwrap();
    let items: Vec<(String, String)> = re
        .captures_iter(&output)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    assert_eq!(
        items,
        vec![
            ("true".to_string(), "one".to_string()),
            ("false".to_string(), "two".to_string()),
            ("true".to_string(), "three".to_string()),
        ]
    );
}

#[test]
fn attachments_round_trip_and_hashes_match() {
    let dir = TempDir::new().unwrap();
    let image = png(320, 200);
    let audio = b"not a recognisable format".to_vec();
    let note = note_json(json!({
        "title": "Media", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": false, "isPinned": false,
        "textContent": "see below",
        "attachments": [
            {"filePath": "pic.png", "mimetype": "image/png"},
            {"filePath": "memo.3gp", "mimetype": "audio/3gpp"}
        ]
    }));
    let (output, report) = run(
        &dir,
        &[
            ("Takeout/Keep/Media.json", &note),
            ("Takeout/Keep/pic.png", &image),
            ("Takeout/Keep/memo.3gp", &audio),
        ],
    );
    assert!(report.issues.is_empty());

    let data_re = Regex::new(r#"<data encoding="base64">([^<]*)</data><mime>([^<]*)</mime>"#).unwrap();
    let payloads: Vec<(Vec<u8>, String)> = data_re
        .captures_iter(&output)
        .map(|c| (STANDARD.decode(&c[1]).unwrap(), c[2].to_string()))
        .collect();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0], (image.clone(), "image/png".to_string()));
    assert_eq!(payloads[1], (audio.clone(), "audio/3gpp".to_string()));

    let media_re = Regex::new(r#"<en-media alt="" type="[^"]*" hash="([0-9a-f]{32})"/>"#).unwrap();
    let hashes: Vec<String> = media_re
        .captures_iter(&output)
        .map(|c| c[1].to_string())
        .collect();
    assert_eq!(
        hashes,
        vec![
            format!("{:x}", md5::compute(&payloads[0].0)),
            format!("{:x}", md5::compute(&payloads[1].0)),
        ]
    );

    assert!(output.contains("<width>320</width><height>200</height>"));
    assert!(output.contains("<file-name>memo.3gp</file-name>"));
}

#[test]
fn undecodable_image_is_embedded_without_dimensions() {
    let dir = TempDir::new().unwrap();
    let broken = png(1, 1)[..12].to_vec();
    let note = note_json(json!({
        "title": "B", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": false, "isPinned": false,
        "textContent": "",
        "attachments": [{"filePath": "broken.png"}]
    }));
    let (output, report) = run(
        &dir,
        &[
            ("Takeout/Keep/B.json", &note),
            ("Takeout/Keep/broken.png", &broken),
        ],
    );
    assert!(output.contains("<mime>image/png</mime><resource-attributes>"));
    assert!(!output.contains("<width>"));
    assert!(matches!(
        report.issues.as_slice(),
        [Issue::DimensionsUnavailable { attachment, .. }] if attachment == "broken.png"
    ));
}

#[test]
fn missing_attachment_does_not_interrupt_the_run() {
    let dir = TempDir::new().unwrap();
    let image = png(2, 2);
    let note = note_json(json!({
        "title": "M", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": false, "isPinned": false,
        "textContent": "body",
        "attachments": [{"filePath": "absent.jpg"}, {"filePath": "here.png"}]
    }));
    let (output, report) = run(
        &dir,
        &[
            ("Takeout/Keep/M.json", &note),
            ("Takeout/Keep/here.png", &image),
            ("Takeout/Keep/Z.json", &text_note("Z", "after")),
        ],
    );
    assert_eq!(output.matches("<resource>").count(), 1);
    assert_eq!(output.matches("<en-media").count(), 1);
    assert!(output.contains("<file-name>here.png</file-name>"));
    assert!(output.contains("<title>Z</title>"));
    assert_eq!(report.written, 2);
    assert_eq!(report.skipped_attachments(), 1);
}

#[test]
fn malformed_note_is_skipped_and_reported() {
    let dir = TempDir::new().unwrap();
    let (output, report) = run(
        &dir,
        &[
            ("Takeout/Keep/bad.json", b"{\"title\": 1}"),
            ("Takeout/Keep/good.json", &text_note("good", "ok")),
        ],
    );
    assert_eq!(notes_in(&output), 1);
    assert!(output.ends_with(ENEX_FOOTER));
    assert_eq!(report.skipped_notes(), 1);
    assert!(matches!(
        &report.issues[0],
        Issue::NoteSkipped { entry, .. } if entry == "Takeout/Keep/bad.json"
    ));
}

#[test]
fn strict_mode_leaves_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let archive = write_takeout(
        dir.path(),
        &[
            ("Takeout/Keep/good.json", &text_note("good", "ok")),
            ("Takeout/Keep/bad.json", b"not json"),
        ],
    );
    let out = dir.path().join("strict.enex");
    let mut config = ExportConfig::new(&archive, &out);
    config.strict = true;

    assert!(convert(&config).is_err());
    assert!(!out.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn custom_layout_and_attachment_fallback() {
    let dir = TempDir::new().unwrap();
    let image = png(5, 6);
    let note = note_json(json!({
        "title": "N", "userEditedTimestampUsec": 0,
        "isTrashed": false, "isArchived": false, "isPinned": false,
        "textContent": "x",
        "attachments": [{"filePath": "p.png"}]
    }));
    let archive = write_takeout(
        dir.path(),
        &[
            ("Takeout/Notizen/N.json", &note),
            ("Takeout/Notizen/p.png", &image),
            ("Takeout/Keep/Other.json", &text_note("Other", "ignored")),
        ],
    );
    let out = dir.path().join("layout.enex");
    let mut config = ExportConfig::new(&archive, &out);
    config.layout = ArchiveLayout::new("Takeout/Notizen", Some("Takeout/Media"));

    let report = convert(&config).unwrap();
    let output = fs::read_to_string(&out).unwrap();
    assert_eq!(report.written, 1);
    assert!(output.contains("<title>N</title>"));
    assert!(!output.contains("<title>Other</title>"));
    assert!(output.contains("<width>5</width><height>6</height>"));
}

#[test]
fn repeated_and_parallel_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let image = png(9, 9);
    let mut entries: Vec<(String, Vec<u8>)> = (0..25)
        .map(|i| {
            (
                format!("Takeout/Keep/note-{:02}.json", i),
                note_json(json!({
                    "title": format!("Note {}", i),
                    "userEditedTimestampUsec": 1_600_000_000_000_000i64 + i,
                    "isTrashed": i % 7 == 0,
                    "isArchived": i % 3 == 0,
                    "isPinned": i % 5 == 0,
                    "textContent": format!("body {}\nline", i),
                    "labels": [{"name": format!("L{}", i % 4)}],
                    "attachments": [{"filePath": "shared.png"}]
                })),
            )
        })
        .collect();
    entries.push(("Takeout/Keep/shared.png".to_string(), image));
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    let archive = write_takeout(dir.path(), &borrowed);

    let outputs: Vec<Vec<u8>> = [("a.enex", 1), ("b.enex", 1), ("c.enex", 4)]
        .iter()
        .map(|(name, jobs)| {
            let out = dir.path().join(name);
            let mut config = ExportConfig::new(&archive, &out);
            config.jobs = *jobs;
            convert(&config).unwrap();
            fs::read(&out).unwrap()
        })
        .collect();

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], outputs[2]);
}

fn numbered_notes(count: usize, malformed: &[usize]) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<(String, Vec<u8>)> = (0..count)
        .map(|i| {
            let name = format!("Takeout/Keep/note-{:03}.json", i);
            if malformed.contains(&i) {
                (name, b"{\"title\": ".to_vec())
            } else {
                (
                    name,
                    note_json(json!({
                        "title": format!("Note {}", i),
                        "userEditedTimestampUsec": 1_600_000_000_000_000i64 + i as i64,
                        "isTrashed": false, "isArchived": false, "isPinned": false,
                        "textContent": format!("body {}", i),
                        "attachments": [{"filePath": "shared.png"}]
                    })),
                )
            }
        })
        .collect();
    entries.push(("Takeout/Keep/shared.png".to_string(), png(4, 4)));
    entries
}

fn takeout_from(dir: &TempDir, entries: &[(String, Vec<u8>)]) -> std::path::PathBuf {
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    write_takeout(dir.path(), &borrowed)
}

fn tmp_files_in(dir: &TempDir) -> usize {
    fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count()
}

#[test]
fn parallel_strict_mode_leaves_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let archive = takeout_from(&dir, &numbered_notes(200, &[3]));
    let out = dir.path().join("strict.enex");
    let mut config = ExportConfig::new(&archive, &out);
    config.strict = true;
    config.jobs = 3;

    assert!(convert(&config).is_err());
    assert!(!out.exists());
    assert_eq!(tmp_files_in(&dir), 0);
}

#[test]
fn parallel_skips_report_in_archive_order() {
    let dir = TempDir::new().unwrap();
    let archive = takeout_from(&dir, &numbered_notes(120, &[2, 57, 58, 119]));

    let run_with = |name: &str, jobs: usize| {
        let out = dir.path().join(name);
        let mut config = ExportConfig::new(&archive, &out);
        config.jobs = jobs;
        let report = convert(&config).unwrap();
        (fs::read(&out).unwrap(), report)
    };
    let (sequential, seq_report) = run_with("seq.enex", 1);
    let (parallel, par_report) = run_with("par.enex", 3);

    assert_eq!(sequential, parallel);
    assert_eq!(seq_report.written, 116);
    assert_eq!(par_report.written, 116);
    assert_eq!(seq_report.issues, par_report.issues);
    let skipped: Vec<&str> = par_report
        .issues
        .iter()
        .filter_map(|i| match i {
            Issue::NoteSkipped { entry, .. } => Some(entry.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        skipped,
        vec![
            "Takeout/Keep/note-002.json",
            "Takeout/Keep/note-057.json",
            "Takeout/Keep/note-058.json",
            "Takeout/Keep/note-119.json",
        ]
    );
}

#[test]
fn parallel_run_larger_than_the_load_window() {
    let dir = TempDir::new().unwrap();
    let archive = takeout_from(&dir, &numbered_notes(300, &[]));
    let out = dir.path().join("window.enex");
    let mut config = ExportConfig::new(&archive, &out);
    config.jobs = 2;

    let report = convert(&config).unwrap();
    let output = fs::read_to_string(&out).unwrap();
    assert_eq!(report.written, 300);
    assert_eq!(notes_in(&output), 300);
    let first = output.find("<title>Note 0</title>").unwrap();
    let last = output.find("<title>Note 299</title>").unwrap();
    assert!(first < last);
    assert!(output.ends_with(ENEX_FOOTER));
}

#[cfg(unix)]
#[test]
fn output_file_gets_regular_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    run(&dir, &[("Takeout/Keep/A.json", &text_note("A", "x"))]);
    let reference = dir.path().join("reference.txt");
    fs::write(&reference, b"x").unwrap();

    let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&dir.path().join("out.enex")), mode(&reference));
}
