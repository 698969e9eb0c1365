//! Byte-level recognizer for logger captures.

use std::fmt;

use tracing::trace;

use crate::checksum::Checksum;
use crate::encoder::HexEncoder;
use crate::protocol::constants::LF;

use super::emit::Emit;
use super::handlers::handle_byte;

/// Expected lexical position of the next byte.
///
/// `00:00:34.596;I;$POSMVCC,5143,4943*5E` walks through `Hour` .. `Checksum`;
/// a binary channel jumps from `Channel` to `Binary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognizerState {
    /// Waiting for a line start.
    #[default]
    Sync,
    Hour,
    Minute,
    Second,
    Millis,
    /// Reading the channel tag letter.
    Channel,
    /// Expecting `$` or `!`.
    SentenceStart,
    /// Folding body bytes into the checksum.
    SentenceBody,
    /// Consuming the checksum digits.
    Checksum,
    /// Transcribing raw binary to hex.
    Binary,
}

impl fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognizerState::Sync => write!(f, "SYNC"),
            RecognizerState::Hour => write!(f, "TS_HOUR"),
            RecognizerState::Minute => write!(f, "TS_MINUTE"),
            RecognizerState::Second => write!(f, "TS_SECOND"),
            RecognizerState::Millis => write!(f, "TS_MILLIS"),
            RecognizerState::Channel => write!(f, "CHANNEL"),
            RecognizerState::SentenceStart => write!(f, "SENTENCE_START"),
            RecognizerState::SentenceBody => write!(f, "SENTENCE_BODY"),
            RecognizerState::Checksum => write!(f, "CHECKSUM"),
            RecognizerState::Binary => write!(f, "BINARY"),
        }
    }
}

impl RecognizerState {
    /// Numeric code shown in the debug trailer.
    pub fn code(&self) -> u8 {
        match self {
            RecognizerState::Sync => 0,
            RecognizerState::Hour => 1,
            RecognizerState::Minute => 2,
            RecognizerState::Second => 3,
            RecognizerState::Millis => 4,
            RecognizerState::Channel => 5,
            RecognizerState::SentenceStart => 6,
            RecognizerState::SentenceBody => 7,
            RecognizerState::Checksum => 8,
            RecognizerState::Binary => 10,
        }
    }

    /// States whose input is copied to the output.
    pub fn echoes(&self) -> bool {
        !matches!(self, RecognizerState::Sync | RecognizerState::Binary)
    }
}

/// Recognizer options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizerOptions {
    /// Treat channel `A` as text instead of binary.
    pub ascii_channel_a: bool,
    /// Custom per-byte separator for binary transcription.
    pub separator: Option<String>,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub from: RecognizerState,
    pub to: RecognizerState,
    pub emits: Vec<Emit>,
}

impl Step {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Single-pass recognizer: state, previous byte and running checksum.
#[derive(Debug, Clone)]
pub struct Recognizer {
    pub(super) state: RecognizerState,
    pub(super) prev: u8,
    pub(super) checksum: Checksum,
    pub(super) encoder: HexEncoder,
    pub(super) ascii_channel_a: bool,
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new(RecognizerOptions::default())
    }
}

impl Recognizer {
    /// The stream is treated as if it followed a line end.
    pub fn new(options: RecognizerOptions) -> Self {
        Self {
            state: RecognizerState::Sync,
            prev: LF,
            checksum: Checksum::default(),
            encoder: HexEncoder::from_separator(options.separator.as_deref()),
            ascii_channel_a: options.ascii_channel_a,
        }
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    pub fn prev(&self) -> u8 {
        self.prev
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Consume one byte and return what to emit for it.
    pub fn step(&mut self, byte: u8) -> Step {
        let from = self.state;
        let mut emits = Vec::with_capacity(2);

        let to = handle_byte(self, byte, &mut emits);
        if to != from {
            trace!(from = %from, to = %to, byte = %format!("{:02X}", byte), "State transition");
        }
        self.state = to;

        if to.echoes() && byte >= LF {
            emits.push(Emit::Echo(byte));
        }
        self.prev = byte;

        Step { from, to, emits }
    }

    /// End of stream: close an open binary segment, otherwise end the line.
    pub fn finish(&mut self) -> Vec<Emit> {
        let emit = if self.state == RecognizerState::Binary {
            Emit::SegmentTrailer(self.checksum.value())
        } else {
            Emit::Newline
        };
        self.state = RecognizerState::Sync;
        self.prev = LF;
        vec![emit]
    }
}
