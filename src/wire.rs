//! Wire format shared by the encoder and the decoder.
//!
//! This is the only bit-exact contract of the protocol: the warmup sentinel,
//! the per-chunk code point budget and the tagged file payload layout
//! `QRFILE1|<mime>|<base64url-no-pad(file name)>|<base64(bytes)>`.

/// First chunk of every transfer; lets the capturing camera settle.
pub const WARMUP_SENTINEL: &str = "__WARMUP__";

/// Maximum number of Unicode code points carried by one data chunk.
pub const CHUNK_SIZE: usize = 2000;

/// Field separator inside a file payload.
pub const FILE_PAYLOAD_SEPARATOR: char = '|';

/// Tag that opens a file payload, separator included.
pub const FILE_PAYLOAD_PREFIX: &str = "QRFILE1|";

/// MIME type used when nothing better is known.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// File name put in the tag when the source path has none.
pub const DEFAULT_FILE_NAME: &str = "payload.bin";

/// Type given to an untagged payload that is not base64.
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// True when `text` is the warmup sentinel, ignoring surrounding whitespace.
pub fn is_warmup(text: &str) -> bool {
    text.trim() == WARMUP_SENTINEL
}

/// Split `text` into pieces of at most `max_code_points` code points.
///
/// Splits only on `char` boundaries; the last piece may be shorter. Returns an
/// empty vector for empty input.
pub fn split_code_points(text: &str, max_code_points: usize) -> Vec<String> {
    let max = max_code_points.max(1);
    let mut chunks = Vec::with_capacity(text.len() / max + 1);
    let mut start = 0usize;
    let mut count = 0usize;

    for (offset, _) in text.char_indices() {
        if count == max {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }
    chunks
}

/// Number of data chunks `text` needs (the warmup chunk is not counted).
pub fn data_chunk_count(text: &str, max_code_points: usize) -> usize {
    let max = max_code_points.max(1);
    text.chars().count().div_ceil(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_detection_trims() {
        assert!(is_warmup("__WARMUP__"));
        assert!(is_warmup("  __WARMUP__\n"));
        assert!(!is_warmup("__warmup__"));
        assert!(!is_warmup("__WARMUP__x"));
    }

    #[test]
    fn test_split_exact_multiple() {
        let text = "a".repeat(4000);
        let chunks = split_code_points(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 2000));
    }

    #[test]
    fn test_split_never_cuts_a_code_point() {
        // 3-byte and 4-byte characters mixed with ASCII
        let text = "añ€😀".repeat(5);
        let chunks = split_code_points(&text, 3);
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), 7);
        assert!(chunks[..6].iter().all(|c| c.chars().count() == 3));
        assert_eq!(chunks[6].chars().count(), 2);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_code_points("", 10).is_empty());
        assert_eq!(data_chunk_count("", 10), 0);
    }

    #[test]
    fn test_chunk_count_matches_split() {
        for len in [1usize, 1999, 2000, 2001, 50_000] {
            let text = "é".repeat(len);
            assert_eq!(
                data_chunk_count(&text, CHUNK_SIZE),
                split_code_points(&text, CHUNK_SIZE).len()
            );
            assert_eq!(data_chunk_count(&text, CHUNK_SIZE), len.div_ceil(CHUNK_SIZE));
        }
    }
}
