//! Output instructions produced by the recognizer for one input byte.

use std::fmt;
use std::io::{self, Write};

use crate::protocol::constants::{MARK_CHECKSUM_ERROR, MARK_CONTROL_BYTE, MARK_LINE_END};

/// Inline annotation written into the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// Line ended inside a sentence body (`##`).
    LineEndInBody,
    /// Control byte inside a sentence body (`###`).
    ControlByteInBody,
    /// Both checksum digits consumed, residual nonzero.
    ChecksumMismatch { residual: u32 },
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::LineEndInBody => write!(f, "{}", MARK_LINE_END),
            Annotation::ControlByteInBody => write!(f, "{}", MARK_CONTROL_BYTE),
            Annotation::ChecksumMismatch { residual } => {
                write!(f, "{}{:02X}", MARK_CHECKSUM_ERROR, residual)
            }
        }
    }
}

/// One piece of output, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit {
    /// Input byte copied verbatim.
    Echo(u8),
    Annotation(Annotation),
    /// Synthesized header opening a binary segment.
    SegmentHeader(String),
    /// One transcribed binary byte, separator included.
    HexByte(String),
    /// `*CC\n` closing a binary segment.
    SegmentTrailer(u32),
    /// Bare line end flushed at end of stream.
    Newline,
}

impl Emit {
    /// Render into `w`, returning the number of bytes written.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        match self {
            Emit::Echo(b) => {
                w.write_all(&[*b])?;
                Ok(1)
            }
            Emit::SegmentHeader(text) | Emit::HexByte(text) => {
                w.write_all(text.as_bytes())?;
                Ok(text.len())
            }
            Emit::Annotation(_) | Emit::SegmentTrailer(_) | Emit::Newline => {
                let text = self.to_string();
                w.write_all(text.as_bytes())?;
                Ok(text.len())
            }
        }
    }
}

impl fmt::Display for Emit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Bytes above 0x7F show as their Latin-1 char; `write_to` stays raw.
            Emit::Echo(b) => write!(f, "{}", char::from(*b)),
            Emit::Annotation(a) => write!(f, "{}", a),
            Emit::SegmentHeader(text) | Emit::HexByte(text) => f.write_str(text),
            Emit::SegmentTrailer(csum) => writeln!(f, "*{:02X}", csum),
            Emit::Newline => f.write_str("\n"),
        }
    }
}
