//! Lexical constants of the logger capture format.
//!
//! A logged entry looks like `00:00:34.596;I;$POSMVCC,5143,4943*5E`:
//! timestamp, channel tag, then an NMEA/AIS sentence or raw binary.

// ============================================================================
// Line and sentence delimiters
// ============================================================================

pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';

/// NMEA sentence start.
pub const NMEA_START: u8 = b'$';
/// AIS (encapsulated) sentence start.
pub const AIS_START: u8 = b'!';
/// Separates the sentence body from its checksum digits.
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Lowest byte value that can appear inside a sentence body.
pub const FIRST_PRINTABLE: u8 = 0x20;

// ============================================================================
// Timestamp and channel field
// ============================================================================

pub const HOUR_DELIMITER: u8 = b':';
pub const MINUTE_DELIMITER: u8 = b':';
pub const SECOND_DELIMITER: u8 = b'.';
/// Terminates both the timestamp and the channel tag.
pub const FIELD_DELIMITER: u8 = b';';

/// Raw/binary channel (Seatalk port logged without the text flag).
pub const CHANNEL_BINARY: u8 = b'A';
/// Textual NMEA channel.
pub const CHANNEL_NMEA: u8 = b'B';
/// Logger-internal channel (`$POSM...` sentences).
pub const CHANNEL_INTERNAL: u8 = b'I';

// ============================================================================
// Binary segment transcription
// ============================================================================

/// Synthesized sentence header that replaces a binary channel payload.
pub const SEGMENT_HEADER: &str = ";$POSMSK";

/// Checksum seed for a binary segment.
///
/// Equals `b';' ^ b'$'`, so folding the header leaves the plain NMEA
/// checksum of `POSMSK...`.
pub const SEGMENT_SEED: u32 = 0x1F;

/// Checksum seed for a text sentence.
pub const SENTENCE_SEED: u32 = 0;

/// Separator between the segment header and the first hex byte.
pub const DEFAULT_HEADER_SEPARATOR: &str = ",";
/// Separator before every hex byte when none is configured.
pub const DEFAULT_BYTE_SEPARATOR: &str = "";

// ============================================================================
// Inline annotations
// ============================================================================

/// Line ended inside a sentence body.
pub const MARK_LINE_END: &str = "##";
/// Control byte inside a sentence body, likely corruption.
pub const MARK_CONTROL_BYTE: &str = "###";
/// Prefix of the checksum mismatch annotation.
pub const MARK_CHECKSUM_ERROR: &str = " # checksum error, residual: ";
