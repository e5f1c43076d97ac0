//! Reassembly against a real output directory.

use qr_transfer::framing::tag_payload;
use qr_transfer::{PayloadReassembler, TransferError, WARMUP_SENTINEL};
use std::fs;
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Chunks as the decoder would hand them over: warmup, then fixed-size pieces.
fn chunked(payload: &str, size: usize) -> Vec<String> {
    let mut chunks = vec![WARMUP_SENTINEL.to_string()];
    chunks.extend(qr_transfer::wire::split_code_points(payload, size));
    chunks
}

#[test]
fn test_zip_slip_entry_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("nested/out");
    let bytes = archive(&[("readme.txt", "fine"), ("../../evil.sh", "#!/bin/sh\necho owned\n")]);
    let chunks = chunked(&tag_payload("application/zip", "bundle.zip", &bytes), 100);

    let err = PayloadReassembler::new(&out).reassemble(&chunks).unwrap_err();
    assert!(matches!(err, TransferError::UnsafeArchiveEntry { ref entry } if entry == "../../evil.sh"));

    // The archive itself is kept; nothing lands outside the extraction dir
    assert!(out.join("bundle.zip").is_file());
    assert_eq!(fs::read_to_string(out.join("bundle/readme.txt")).unwrap(), "fine");
    assert!(!out.join("evil.sh").exists());
    assert!(!tmp.path().join("nested/evil.sh").exists());
    assert!(!tmp.path().join("evil.sh").exists());
}

#[test]
fn test_zip_payload_extracts_to_sibling_dir() {
    let tmp = TempDir::new().unwrap();
    let bytes = archive(&[("docs/a.txt", "alpha"), ("b.txt", "beta")]);
    let chunks = chunked(&tag_payload("application/zip", "photos.zip", &bytes), 64);

    let reassembler = PayloadReassembler::new(tmp.path());
    let first = reassembler.reassemble(&chunks).unwrap();
    assert_eq!(first.extracted_dir, Some(tmp.path().join("photos")));
    assert_eq!(fs::read_to_string(tmp.path().join("photos/docs/a.txt")).unwrap(), "alpha");

    // A second transfer of the same file gets its own name and directory
    let second = reassembler.reassemble(&chunks).unwrap();
    assert_eq!(second.output_path, tmp.path().join("photos_1.zip"));
    assert_eq!(second.extracted_dir, Some(tmp.path().join("photos_1")));
    assert_eq!(fs::read_to_string(tmp.path().join("photos_1/b.txt")).unwrap(), "beta");
}

#[test]
fn test_report_pdf_collision() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("report.pdf"), b"first").unwrap();
    let chunks = chunked(&tag_payload("application/pdf", "report.pdf", b"%PDF-1.7 second"), 20);

    let result = PayloadReassembler::new(tmp.path()).reassemble(&chunks).unwrap();
    assert_eq!(result.output_path, tmp.path().join("report_1.pdf"));
    assert_eq!(result.chunk_count, chunks.len() - 1);
    assert_eq!(fs::read(tmp.path().join("report.pdf")).unwrap(), b"first");
}

#[test]
fn test_declared_windows_path_is_flattened() {
    let tmp = TempDir::new().unwrap();
    let chunks = chunked(&tag_payload("application/octet-stream", "C:\\Users\\ana\\scan", b"%PDF-1.3"), 2000);
    let result = PayloadReassembler::new(tmp.path()).reassemble(&chunks).unwrap();
    assert_eq!(result.output_path, tmp.path().join("scan.pdf"));
    assert_eq!(result.mime_type, "application/pdf");
}

#[test]
fn test_bad_base64_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    let chunks = vec![WARMUP_SENTINEL.to_string(), "QRFILE1|text/plain|YS50eHQ|%%%".to_string()];
    let err = PayloadReassembler::new(&out).reassemble(&chunks).unwrap_err();
    assert!(matches!(err, TransferError::MalformedPayload(_)));
    assert!(!out.exists());
}
