//! End-to-end encode → render → decode → reassemble on clean slide images.
//!
//! Slides are read back from the PNG files the deck writes, so the tests
//! cover the same bytes a viewer would show.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use image::{RgbImage, imageops};
use qr_transfer::tools::init_test_tracing;
use qr_transfer::{
    CHUNK_SIZE, CancelToken, PayloadFramer, RenderConfig, SlideDeck, WARMUP_SENTINEL, combine_chunks,
    decode_robust, reassemble,
};
use std::fs;
use tempfile::TempDir;

fn config(canvas_side: u32) -> RenderConfig {
    RenderConfig {
        canvas_side,
        ..RenderConfig::default()
    }
}

/// Render `chunks` and decode every slide file back to text.
fn render_and_read(chunks: &[String], canvas_side: u32) -> Vec<String> {
    let deck = SlideDeck::render(chunks, &config(canvas_side), None, &CancelToken::new()).unwrap();
    assert_eq!(deck.len(), chunks.len());
    deck.slides()
        .iter()
        .map(|slide| {
            let image = image::open(&slide.path).unwrap().to_rgb8();
            decode_robust(&image).unwrap_or_else(|| panic!("{} did not decode", slide.title))
        })
        .collect()
}

#[test]
fn test_hello_qr_round_trip() {
    init_test_tracing();
    let chunks = PayloadFramer::default().frame_text("Hello QR").unwrap();
    assert_eq!(chunks, [WARMUP_SENTINEL, "Hello QR"]);

    let decoded = render_and_read(&chunks, 360);
    assert_eq!(decoded, chunks);
    assert_eq!(combine_chunks(&decoded), "Hello QR");

    let tmp = TempDir::new().unwrap();
    let result = reassemble(&decoded, tmp.path()).unwrap();
    assert_eq!(fs::read_to_string(&result.output_path).unwrap(), "Hello QR");
    assert_eq!(result.mime_type, "text/plain");
}

#[test]
fn test_multi_chunk_text_round_trip() {
    let text = "Grüße aus Zürich, 東京 and 🚀 launch notes. ".repeat(4);
    let framer = PayloadFramer::new(50);
    let chunks = framer.frame_text(&text).unwrap();
    assert_eq!(chunks.len(), 1 + text.chars().count().div_ceil(50));

    let decoded = render_and_read(&chunks, 400);
    assert_eq!(combine_chunks(&decoded), text);

    let tmp = TempDir::new().unwrap();
    let result = reassemble(&decoded, tmp.path()).unwrap();
    assert_eq!(fs::read_to_string(&result.output_path).unwrap(), text);
}

#[test]
fn test_chunk_count_includes_warmup() {
    let framer = PayloadFramer::default();
    for len in [1usize, 1999, 2000, 2001, 4000, 50_000] {
        let text = "ñ".repeat(len);
        let chunks = framer.frame_text(&text).unwrap();
        assert_eq!(chunks.len(), 1 + len.div_ceil(CHUNK_SIZE), "length {len}");
        assert_eq!(framer.chunk_count(&text), len.div_ceil(CHUNK_SIZE));
        assert!(chunks[1..].iter().all(|c| c.chars().count() <= CHUNK_SIZE));
    }
}

#[test]
fn test_ninety_percent_crop_still_decodes() {
    let chunks = PayloadFramer::default().frame_text("cropped capture").unwrap();
    let deck = SlideDeck::render(&chunks, &config(400), None, &CancelToken::new()).unwrap();
    let full: RgbImage = image::open(&deck.slides()[1].path).unwrap().to_rgb8();
    assert_eq!(decode_robust(&full).as_deref(), Some("cropped capture"));

    let side = 360;
    let offset = (400 - side) / 2;
    let cropped = imageops::crop_imm(&full, offset, offset, side, side).to_image();
    assert_eq!(decode_robust(&cropped).as_deref(), Some("cropped capture"));
}

#[test]
fn test_zip_file_transfer_extracts_archive() {
    let tmp = TempDir::new().unwrap();
    let bytes = b"PK\x03\x04\x00\x00\x00\x00\x00\x00";
    let source = tmp.path().join("a.zip");
    fs::write(&source, bytes).unwrap();

    let chunks = PayloadFramer::default().frame_file(&source).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(
        chunks[1],
        format!(
            "QRFILE1|application/zip|{}|{}",
            URL_SAFE_NO_PAD.encode("a.zip"),
            STANDARD.encode(bytes)
        )
    );

    let decoded = render_and_read(&chunks, 360);
    let out = tmp.path().join("received");
    let result = reassemble(&decoded, &out).unwrap();
    assert_eq!(result.output_path, out.join("a.zip"));
    assert_eq!(fs::read(&result.output_path).unwrap(), bytes);
    assert_eq!(result.mime_type, "application/zip");
    assert_eq!(result.original_file_name.as_deref(), Some("a.zip"));
    assert_eq!(result.extracted_dir, Some(out.join("a")));
    assert!(out.join("a").is_dir());
}

#[test]
fn test_binary_file_transfer_is_byte_exact() {
    let tmp = TempDir::new().unwrap();
    let bytes: Vec<u8> = (0..1200u32).map(|i| (i.wrapping_mul(73) ^ (i >> 3)) as u8).collect();
    let source = tmp.path().join("blob.bin");
    fs::write(&source, &bytes).unwrap();

    let chunks = PayloadFramer::new(400).frame_file(&source).unwrap();
    assert!(chunks.len() > 3);

    let decoded = render_and_read(&chunks, 600);
    let result = reassemble(&decoded, &tmp.path().join("out")).unwrap();
    assert_eq!(fs::read(&result.output_path).unwrap(), bytes);
    assert_eq!(result.output_path.file_name().unwrap(), "blob.bin");
    assert_eq!(result.mime_type, "application/octet-stream");
    assert_eq!(result.chunk_count, chunks.len() - 1);
    assert_eq!(result.extracted_dir, None);
}

#[test]
fn test_sniffed_type_names_unnamed_payload() {
    // A bare base64 payload carries no name; the PNG signature picks the extension
    let tmp = TempDir::new().unwrap();
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    let chunks = vec![WARMUP_SENTINEL.to_string(), STANDARD.encode(png)];
    let result = reassemble(&chunks, tmp.path()).unwrap();
    assert_eq!(result.mime_type, "image/png");
    assert!(result.output_path.to_string_lossy().ends_with(".png"));
    assert_eq!(result.original_file_name, None);
}
