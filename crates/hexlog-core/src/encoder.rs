//! Byte-to-hex transcription for binary segments.

use crate::protocol::constants::{
    DEFAULT_BYTE_SEPARATOR, DEFAULT_HEADER_SEPARATOR, SEGMENT_HEADER,
};
use thiserror::Error;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HexDecodeError {
    #[error("Missing separator {separator:?} at offset {offset}")]
    MissingSeparator { separator: String, offset: usize },
    #[error("Truncated hex pair at offset {offset}")]
    Truncated { offset: usize },
    #[error("Invalid hex digit 0x{byte:02X} at offset {offset}")]
    InvalidDigit { byte: u8, offset: usize },
}

/// Encodes binary bytes as separator-prefixed uppercase hex pairs.
///
/// Without a custom separator the header is followed by `,` and bytes are
/// packed (`;$POSMSK,0102`). A custom separator precedes every byte and
/// the header separator is dropped (`;$POSMSK,01,02` for `","`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexEncoder {
    header_separator: String,
    byte_separator: String,
}

impl Default for HexEncoder {
    fn default() -> Self {
        Self {
            header_separator: DEFAULT_HEADER_SEPARATOR.to_string(),
            byte_separator: DEFAULT_BYTE_SEPARATOR.to_string(),
        }
    }
}

impl HexEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `separator` before every byte, and none after the header.
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            header_separator: String::new(),
            byte_separator: separator.into(),
        }
    }

    pub fn from_separator(separator: Option<&str>) -> Self {
        match separator {
            Some(sep) => Self::with_separator(sep),
            None => Self::new(),
        }
    }

    /// Header text that opens a binary segment.
    pub fn segment_header(&self) -> String {
        format!("{}{}", SEGMENT_HEADER, self.header_separator)
    }

    /// Transcribe one byte, separator first.
    pub fn encode(&self, byte: u8) -> String {
        let mut out = String::with_capacity(self.byte_separator.len() + 2);
        out.push_str(&self.byte_separator);
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
        out
    }
}

/// Value of a hex digit, case-insensitive.
///
/// Other bytes go through the same arithmetic and are masked to 4 bits, so
/// the result is always in `0..=15`.
pub fn nibble_value(c: u8) -> u8 {
    let lower = c | 0x20;
    let value = if lower > b'9' {
        lower.wrapping_sub(b'a').wrapping_add(10)
    } else {
        lower.wrapping_sub(b'0')
    };
    value & 0x0F
}

fn strict_nibble(byte: u8, offset: usize) -> Result<u8, HexDecodeError> {
    if byte.is_ascii_hexdigit() {
        Ok(nibble_value(byte))
    } else {
        Err(HexDecodeError::InvalidDigit { byte, offset })
    }
}

/// Decode a segment body produced with `separator` back into raw bytes.
///
/// `text` is the transcript between the header separator and the `*`
/// trailer, e.g. `,01,02` for `","` or `0102` for the packed default.
pub fn decode_hex(text: &str, separator: &str) -> Result<Vec<u8>, HexDecodeError> {
    let bytes = text.as_bytes();
    let sep = separator.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / (sep.len() + 2));
    let mut pos = 0;

    while pos < bytes.len() {
        if !bytes[pos..].starts_with(sep) {
            return Err(HexDecodeError::MissingSeparator {
                separator: separator.to_string(),
                offset: pos,
            });
        }
        pos += sep.len();
        if pos + 2 > bytes.len() {
            return Err(HexDecodeError::Truncated { offset: pos });
        }
        let hi = strict_nibble(bytes[pos], pos)?;
        let lo = strict_nibble(bytes[pos + 1], pos + 1)?;
        out.push((hi << 4) | lo);
        pos += 2;
    }

    Ok(out)
}
