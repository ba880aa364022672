//! Text decoding for dataset files.
//!
//! The donation exports come out of spreadsheet tools in whatever code page
//! the coordinator's machine used, so the encoding is configuration rather
//! than a constant. UTF-8 decoding is strict: a bad byte is an error, not a
//! replacement character.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::DataLoadError;

/// Windows-1252 code points for bytes 0x80..=0x9F. `None` marks the five
/// bytes the code page leaves undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Declared text encoding of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[default]
    Latin1,
    Windows1252,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin1",
            Self::Windows1252 => "windows-1252",
        }
    }

    /// Decode raw file bytes into a string.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DataLoadError> {
        match self {
            Self::Utf8 => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body)
                    .map(str::to_string)
                    .map_err(|e| DataLoadError::Encoding {
                        encoding: self.as_str(),
                        offset: e.valid_up_to() + (bytes.len() - body.len()),
                    })
            }
            Self::Latin1 => {
                if looks_like_multibyte_utf8(bytes) {
                    warn!(
                        encoding = self.as_str(),
                        "dataset contains UTF-8 sequences; non-ASCII text will be mangled, consider --encoding utf-8"
                    );
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            Self::Windows1252 => {
                let mut out = String::with_capacity(bytes.len());
                for (offset, &b) in bytes.iter().enumerate() {
                    let ch = match b {
                        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize].ok_or(
                            DataLoadError::Encoding {
                                encoding: self.as_str(),
                                offset,
                            },
                        )?,
                        _ => b as char,
                    };
                    out.push(ch);
                }
                Ok(out)
            }
        }
    }
}

impl FromStr for TextEncoding {
    type Err = DataLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Self::Latin1),
            "cp1252" | "windows-1252" | "win-1252" => Ok(Self::Windows1252),
            other => Err(DataLoadError::UnknownEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the bytes are valid UTF-8 and contain at least one multi-byte sequence.
fn looks_like_multibyte_utf8(bytes: &[u8]) -> bool {
    !bytes.is_ascii() && std::str::from_utf8(bytes).is_ok()
}
