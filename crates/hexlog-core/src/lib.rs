//! hexlog-core: recover readable text from mixed NMEA/binary logger captures.
//!
//! OpenSeaMap-style data loggers write lines such as
//! `00:00:34.596;I;$POSMVCC,5143,4943*5E`. When a port is misconfigured the
//! logger stores raw binary under channel `A` as if it were text. This crate
//! turns such a capture into a printable transcript: text sentences are
//! echoed and checksum-verified, binary runs become `;$POSMSK,...*CC` hex
//! sentences, and damage is marked inline instead of aborting.
//!
//! # Architecture
//!
//! - **Protocol**: Delimiters, channel tags, annotation text
//! - **Checksum**: Running XOR accumulator
//! - **Encoder**: Byte-to-hex transcription and its inverse
//! - **State**: Byte-at-a-time recognizer returning emit instructions
//! - **Events**: Observer pattern for UI decoupling
//! - **Session**: Stream driver, configuration and summary
//!
//! # Example
//!
//! ```no_run
//! use hexlog_core::session::{TranscodeConfig, Transcoder};
//!
//! let config = TranscodeConfig {
//!     separator: Some(",".to_string()),
//!     ..Default::default()
//! };
//!
//! let transcoder = Transcoder::new(config);
//! let stdin = std::io::stdin();
//! let stdout = std::io::stdout();
//! transcoder.run(stdin.lock(), stdout.lock()).expect("transcoding failed");
//! ```

pub mod checksum;
pub mod encoder;
pub mod events;
pub mod protocol;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use checksum::Checksum;
pub use encoder::{HexDecodeError, HexEncoder, decode_hex, nibble_value};
pub use events::{
    NullObserver, RecordingObserver, TracingObserver, TranscodeEvent, TranscodeObserver,
};
pub use session::{TranscodeConfig, TranscodeError, TranscodeSummary, Transcoder};
pub use state::{Annotation, Emit, Recognizer, RecognizerOptions, RecognizerState, Step};
