#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write a zip with the given entries to `dir/takeout.zip`.
pub fn write_takeout(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();
    let path = dir.join("takeout.zip");
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Header-only PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

pub fn text_note(title: &str, text: &str) -> Vec<u8> {
    serde_json::json!({
        "title": title,
        "userEditedTimestampUsec": 1_606_811_531_000_000i64,
        "isTrashed": false,
        "isArchived": false,
        "isPinned": false,
        "textContent": text,
    })
    .to_string()
    .into_bytes()
}

pub fn note_json(value: serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}
