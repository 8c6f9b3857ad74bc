//! Byte-to-text decoding for captured list frames.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How far into a frame to look for a `<meta charset>` declaration.
const META_SNIFF_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode frame as {encoding}")]
    Malformed { encoding: String },
}

/// Decode a captured frame: BOM -> caller hint -> meta charset -> chardetng guess.
pub fn decode_frame(bytes: &[u8], charset_hint: Option<&str>) -> Result<DecodedFrame, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = charset_hint.and_then(|label| Encoding::for_label(label.trim().as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = sniff_meta_charset(bytes) {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| !matches!(c, '"' | '\'' | ';' | '>' | '/') && !c.is_whitespace())
        .collect();
    Encoding::for_label(label.as_bytes())
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedFrame, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(DecodedFrame {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}
