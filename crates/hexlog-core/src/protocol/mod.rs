//! Capture format definitions.

pub mod constants;

pub use constants::*;

/// `\n` and `\r` are interchangeable line ends.
pub fn is_line_end(byte: u8) -> bool {
    byte == LF || byte == CR
}

/// Byte that opens an NMEA or AIS sentence.
pub fn is_sentence_start(byte: u8) -> bool {
    byte == NMEA_START || byte == AIS_START
}

/// Channel tag letter.
pub fn is_channel_tag(byte: u8) -> bool {
    matches!(byte, CHANNEL_BINARY | CHANNEL_NMEA | CHANNEL_INTERNAL)
}
