//! Event system for UI decoupling.
//!
//! Lets the CLI (or any other front end) follow what the recognizer finds
//! in the stream without parsing the transcript back.

use std::fmt;
use std::sync::Mutex;

/// Notable findings while transcribing, tagged with the input byte offset
/// of the byte that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeEvent {
    /// Checksum digits consumed and matching.
    SentenceVerified { offset: u64 },
    /// Checksum digits consumed with a nonzero residual.
    ChecksumMismatch { offset: u64, residual: u32 },
    /// Line ended inside a sentence body.
    LineEndInBody { offset: u64 },
    /// Control byte inside a sentence body.
    ControlByteInBody { offset: u64, byte: u8 },
    /// Binary channel entry started.
    SegmentOpened { offset: u64 },
    /// Binary segment closed with its trailer.
    SegmentClosed {
        offset: u64,
        bytes: u64,
        checksum: u32,
    },
}

impl fmt::Display for TranscodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeEvent::SentenceVerified { offset } => {
                write!(f, "@{}: sentence verified", offset)
            }
            TranscodeEvent::ChecksumMismatch { offset, residual } => {
                write!(f, "@{}: checksum error, residual {:02X}", offset, residual)
            }
            TranscodeEvent::LineEndInBody { offset } => {
                write!(f, "@{}: line end inside sentence body", offset)
            }
            TranscodeEvent::ControlByteInBody { offset, byte } => {
                write!(f, "@{}: control byte 0x{:02X} inside sentence body", offset, byte)
            }
            TranscodeEvent::SegmentOpened { offset } => {
                write!(f, "@{}: binary segment opened", offset)
            }
            TranscodeEvent::SegmentClosed {
                offset,
                bytes,
                checksum,
            } => write!(
                f,
                "@{}: binary segment closed, {} bytes, checksum {:02X}",
                offset, bytes, checksum
            ),
        }
    }
}

/// Observer trait for receiving transcoding events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait TranscodeObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &TranscodeEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl TranscodeObserver for NullObserver {
    fn on_event(&self, _event: &TranscodeEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl TranscodeObserver for TracingObserver {
    fn on_event(&self, event: &TranscodeEvent) {
        match event {
            TranscodeEvent::SentenceVerified { offset } => {
                tracing::trace!(offset, "Sentence verified");
            }
            TranscodeEvent::ChecksumMismatch { offset, residual } => {
                tracing::warn!(
                    offset,
                    residual = %format!("{:02X}", residual),
                    "Checksum mismatch"
                );
            }
            TranscodeEvent::LineEndInBody { offset } => {
                tracing::debug!(offset, "Line end inside sentence body");
            }
            TranscodeEvent::ControlByteInBody { offset, byte } => {
                tracing::debug!(
                    offset,
                    byte = %format!("0x{:02X}", byte),
                    "Control byte inside sentence body"
                );
            }
            TranscodeEvent::SegmentOpened { offset } => {
                tracing::debug!(offset, "Binary segment opened");
            }
            TranscodeEvent::SegmentClosed {
                offset,
                bytes,
                checksum,
            } => {
                tracing::debug!(
                    offset,
                    bytes,
                    checksum = %format!("{:02X}", checksum),
                    "Binary segment closed"
                );
            }
        }
    }
}

/// Observer that keeps every event in memory.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TranscodeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<TranscodeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl TranscodeObserver for RecordingObserver {
    fn on_event(&self, event: &TranscodeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
