//! Chunk concatenation and tagged payload parsing.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::error::{Result, TransferError};
use crate::framing::mime::{normalize_declared_mime, sniff_mime};
use crate::wire::{
    DEFAULT_MIME_TYPE, FILE_PAYLOAD_PREFIX, FILE_PAYLOAD_SEPARATOR, TEXT_MIME_TYPE, is_warmup,
};

/// Padding is optional on the decode side.
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Bytes plus what is known about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayload {
    /// Decoded file contents.
    pub bytes: Vec<u8>,
    /// Declared type after normalization, or the sniffed type.
    pub mime_type: String,
    /// File name carried in the tag, as decoded (not sanitized).
    pub file_name: Option<String>,
}

/// Concatenate chunk texts in order, skipping warmup sentinels.
///
/// For a text transfer this is the original text.
pub fn combine_chunks<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    chunks
        .into_iter()
        .filter(|c| !is_warmup(c.as_ref()))
        .fold(String::new(), |mut acc, c| {
            acc.push_str(c.as_ref());
            acc
        })
}

/// Parse the concatenated chunk text.
///
/// Whitespace is removed first. A `QRFILE1|` prefix selects the tagged
/// layout, where bad base64 is an error. Anything else is decoded as bare
/// base64 with a sniffed type; when that fails the payload is a text
/// transfer and the combined text is kept verbatim as `text/plain`.
pub fn decode_payload(combined: &str) -> Result<ParsedPayload> {
    let compact: String = combined.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    if let Some(rest) = compact.strip_prefix(FILE_PAYLOAD_PREFIX) {
        return decode_tagged(rest);
    }

    match decode_data(&compact) {
        Ok(bytes) => {
            let mime_type = sniff_mime(&bytes).unwrap_or(DEFAULT_MIME_TYPE).to_string();
            Ok(ParsedPayload {
                bytes,
                mime_type,
                file_name: None,
            })
        }
        Err(_) => {
            debug!(chars = combined.chars().count(), "untagged payload is plain text");
            Ok(ParsedPayload {
                bytes: combined.as_bytes().to_vec(),
                mime_type: TEXT_MIME_TYPE.to_string(),
                file_name: None,
            })
        }
    }
}

fn decode_tagged(rest: &str) -> Result<ParsedPayload> {
    let mut fields = rest.splitn(3, FILE_PAYLOAD_SEPARATOR);
    let (Some(mime), Some(name_token), Some(data)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(TransferError::MalformedPayload(
            "tagged payload is missing a field delimiter".into(),
        ));
    };
    if mime.is_empty() {
        return Err(TransferError::MalformedPayload("tagged payload has no MIME type".into()));
    }
    if name_token.is_empty() {
        return Err(TransferError::MalformedPayload("tagged payload has no file name".into()));
    }

    let bytes = decode_data(data)?;
    let file_name = decode_file_name(name_token)?;
    let mime_type = normalize_declared_mime(Some(mime), &bytes);
    Ok(ParsedPayload {
        bytes,
        mime_type,
        file_name: Some(file_name),
    })
}

fn decode_data(data: &str) -> Result<Vec<u8>> {
    STANDARD_LENIENT
        .decode(data)
        .map_err(|e| TransferError::MalformedPayload(format!("payload is not valid base64: {e}")))
}

/// URL-safe first, standard alphabet as a fallback.
fn decode_file_name(token: &str) -> Result<String> {
    let bytes = URL_SAFE_LENIENT
        .decode(token)
        .or_else(|_| STANDARD_LENIENT.decode(token))
        .map_err(|_| TransferError::MalformedPayload("file name is not valid base64".into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
