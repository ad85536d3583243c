/// Text encoding detection so files load and save in the encoding they came in.
use std::fmt;

use anyhow::{Context, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Supported text encodings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// Any other encoding known to `encoding_rs`, by its WHATWG name.
    Legacy(&'static str),
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Utf8Bom => f.write_str("UTF-8 BOM"),
            Self::Utf16Le => f.write_str("UTF-16 LE"),
            Self::Utf16Be => f.write_str("UTF-16 BE"),
            Self::Legacy(name) => f.write_str(name),
        }
    }
}

impl TextEncoding {
    /// Sniffs the encoding of raw file content.
    ///
    /// A byte order mark wins; then valid UTF-8; otherwise `chardetng` guesses.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(UTF8_BOM) {
            Self::Utf8Bom
        } else if bytes.starts_with(UTF16_LE_BOM) {
            Self::Utf16Le
        } else if bytes.starts_with(UTF16_BE_BOM) {
            Self::Utf16Be
        } else if std::str::from_utf8(bytes).is_ok() {
            Self::Utf8
        } else {
            let mut detector =
                chardetng::EncodingDetector::new(chardetng::Iso2022JpDetection::Deny);
            detector.feed(bytes, true);
            let guess = detector.guess(None, chardetng::Utf8Detection::Allow);
            Self::Legacy(guess.name())
        }
    }

    /// Decodes `bytes`, dropping any byte order mark.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).context("invalid UTF-8 content"),
            Self::Utf8Bom => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(body.to_vec()).context("invalid UTF-8 content")
            }
            Self::Utf16Le => {
                let body = bytes.strip_prefix(UTF16_LE_BOM).unwrap_or(bytes);
                decode_utf16(body, u16::from_le_bytes)
            }
            Self::Utf16Be => {
                let body = bytes.strip_prefix(UTF16_BE_BOM).unwrap_or(bytes);
                decode_utf16(body, u16::from_be_bytes)
            }
            Self::Legacy(name) => {
                let encoding = lookup(name)?;
                let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
                if had_errors {
                    anyhow::bail!("content is not valid {name}");
                }
                Ok(text.into_owned())
            }
        }
    }

    /// Encodes `text`, writing a byte order mark where the encoding has one.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` has characters this encoding cannot represent.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Utf8Bom => Ok([UTF8_BOM, text.as_bytes()].concat()),
            Self::Utf16Le => Ok(encode_utf16(text, UTF16_LE_BOM, u16::to_le_bytes)),
            Self::Utf16Be => Ok(encode_utf16(text, UTF16_BE_BOM, u16::to_be_bytes)),
            Self::Legacy(name) => {
                let encoding = lookup(name)?;
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    anyhow::bail!("text cannot be represented as {name}");
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

fn lookup(name: &str) -> Result<&'static encoding_rs::Encoding> {
    encoding_rs::Encoding::for_label(name.as_bytes())
        .with_context(|| format!("unknown encoding: {name}"))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        anyhow::bail!("UTF-16 content has an odd number of bytes");
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).context("invalid UTF-16 content")
}

fn encode_utf16(text: &str, bom: &[u8], bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
    let mut out = bom.to_vec();
    out.extend(text.encode_utf16().flat_map(bytes));
    out
}
