//! Transcoding session - drives the recognizer over a byte stream.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::events::{TracingObserver, TranscodeEvent, TranscodeObserver};
use crate::protocol::constants::FIRST_PRINTABLE;
use crate::protocol::is_line_end;
use crate::state::{Annotation, Emit, Recognizer, RecognizerOptions, RecognizerState, Step};

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Read failed at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Write failed: {0}")]
    Write(#[source] io::Error),
}

/// Configuration for a transcoding session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Treat channel `A` as text instead of binary.
    pub ascii_channel_a: bool,
    /// Append a state trailer to the output after every input byte.
    pub debug_level: u8,
    /// Per-byte separator for binary segments.
    pub separator: Option<String>,
}

impl TranscodeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TranscodeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn recognizer_options(&self) -> RecognizerOptions {
        RecognizerOptions {
            ascii_channel_a: self.ascii_channel_a,
            separator: self.separator.clone(),
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub sentences_verified: u64,
    pub checksum_errors: u64,
    pub line_end_marks: u64,
    pub control_byte_marks: u64,
    pub segments: u64,
    pub segment_bytes: u64,
}

impl TranscodeSummary {
    /// Number of inline annotations written.
    pub fn annotations(&self) -> u64 {
        self.checksum_errors + self.line_end_marks + self.control_byte_marks
    }
}

/// Transcoding session - one input stream to one output stream.
pub struct Transcoder<O: TranscodeObserver> {
    config: TranscodeConfig,
    observer: Arc<O>,
}

impl Transcoder<TracingObserver> {
    /// Create a new session with default tracing observer.
    pub fn new(config: TranscodeConfig) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }
}

impl<O: TranscodeObserver> Transcoder<O> {
    /// Create a new session with a custom observer.
    pub fn with_observer(config: TranscodeConfig, observer: Arc<O>) -> Self {
        Self { config, observer }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Transcribe `input` to `output` until end of stream.
    ///
    /// Malformed input never fails the run; only I/O errors do.
    #[instrument(skip_all, fields(debug_level = self.config.debug_level))]
    pub fn run<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<TranscodeSummary, TranscodeError> {
        let mut recognizer = Recognizer::new(self.config.recognizer_options());
        let mut out = BufWriter::new(output);
        let mut summary = TranscodeSummary::default();
        let mut segment_bytes = 0u64;

        for (offset, byte) in BufReader::new(input).bytes().enumerate() {
            let offset = offset as u64;
            let byte = byte.map_err(|source| TranscodeError::Read { offset, source })?;
            let prev = recognizer.prev();

            let step = recognizer.step(byte);
            summary.bytes_in += 1;
            self.report(&step, offset, byte, &mut segment_bytes, &mut summary);
            summary.bytes_out += write_emits(&mut out, &step.emits)?;
            let segment_edge = step
                .emits
                .iter()
                .any(|e| matches!(e, Emit::SegmentHeader(_) | Emit::SegmentTrailer(_)));

            if self.config.debug_level > 0 {
                let trailer =
                    debug_trailer(step.to, prev, byte, recognizer.checksum().value());
                out.write_all(&trailer).map_err(TranscodeError::Write)?;
                summary.bytes_out += trailer.len() as u64;
            }

            if is_line_end(byte) || segment_edge {
                out.flush().map_err(TranscodeError::Write)?;
            }
        }

        let tail = recognizer.finish();
        for emit in &tail {
            if let Emit::SegmentTrailer(checksum) = emit {
                self.observer.on_event(&TranscodeEvent::SegmentClosed {
                    offset: summary.bytes_in,
                    bytes: segment_bytes,
                    checksum: *checksum,
                });
            }
        }
        summary.bytes_out += write_emits(&mut out, &tail)?;
        out.flush().map_err(TranscodeError::Write)?;

        debug!(?summary, "Transcoding finished");
        Ok(summary)
    }

    /// Transcribe an in-memory capture.
    pub fn transcode_bytes(&self, input: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let mut output = Vec::with_capacity(input.len() * 2);
        self.run(input, &mut output)?;
        Ok(output)
    }

    fn report(
        &self,
        step: &Step,
        offset: u64,
        byte: u8,
        segment_bytes: &mut u64,
        summary: &mut TranscodeSummary,
    ) {
        let mut mismatch = false;

        for emit in &step.emits {
            let event = match emit {
                Emit::Annotation(Annotation::LineEndInBody) => {
                    summary.line_end_marks += 1;
                    TranscodeEvent::LineEndInBody { offset }
                }
                Emit::Annotation(Annotation::ControlByteInBody) => {
                    summary.control_byte_marks += 1;
                    TranscodeEvent::ControlByteInBody { offset, byte }
                }
                Emit::Annotation(Annotation::ChecksumMismatch { residual }) => {
                    mismatch = true;
                    summary.checksum_errors += 1;
                    TranscodeEvent::ChecksumMismatch {
                        offset,
                        residual: *residual,
                    }
                }
                Emit::SegmentHeader(_) => {
                    *segment_bytes = 0;
                    summary.segments += 1;
                    TranscodeEvent::SegmentOpened { offset }
                }
                Emit::HexByte(_) => {
                    *segment_bytes += 1;
                    summary.segment_bytes += 1;
                    continue;
                }
                Emit::SegmentTrailer(checksum) => TranscodeEvent::SegmentClosed {
                    offset,
                    bytes: *segment_bytes,
                    checksum: *checksum,
                },
                Emit::Echo(_) | Emit::Newline => continue,
            };
            self.observer.on_event(&event);
        }

        if step.from == RecognizerState::Checksum && step.changed() && !mismatch {
            summary.sentences_verified += 1;
            self.observer
                .on_event(&TranscodeEvent::SentenceVerified { offset });
        }
    }
}

fn write_emits<W: Write>(out: &mut W, emits: &[Emit]) -> Result<u64, TranscodeError> {
    let mut written = 0u64;
    for emit in emits {
        written += emit.write_to(out).map_err(TranscodeError::Write)? as u64;
    }
    Ok(written)
}

/// In-band trace line: state code, previous and current byte, low checksum byte.
fn debug_trailer(state: RecognizerState, prev: u8, curr: u8, checksum: u32) -> Vec<u8> {
    let mut line = format!("  state: {:2}", state.code()).into_bytes();
    if curr >= FIRST_PRINTABLE {
        line.extend_from_slice(b"   ");
        line.push(prev);
        line.extend_from_slice(b"  ");
        line.push(curr);
        line.extend_from_slice(format!("      {:02x}\n", checksum & 0xFF).as_bytes());
    } else {
        line.extend_from_slice(format!("  {:02x} {:02x}\n", prev, curr).as_bytes());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::decode_hex;
    use crate::events::RecordingObserver;

    fn recording(config: TranscodeConfig) -> (Transcoder<RecordingObserver>, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        (Transcoder::with_observer(config, observer.clone()), observer)
    }

    #[test]
    fn test_valid_sentence_roundtrips() {
        let transcoder = Transcoder::new(TranscodeConfig::default());
        let out = transcoder
            .transcode_bytes(b"$GPVTG,,T,247.3,M,0.0,N*07\n")
            .unwrap();
        assert_eq!(out, b"$GPVTG,,T,247.3,M,0.0,N*07\n\n");
    }

    #[test]
    fn test_summary_and_events() {
        let (transcoder, observer) = recording(TranscodeConfig {
            separator: Some(",".into()),
            ..Default::default()
        });
        let input = b"00:00:34.592;A;\x01\x02\x03\n\
00:00:34.596;I;$POSMVCC,5143,4943*5E\n\
00:00:34.597;I;$POSMACC,16644,-200,2024*00\n\
00:00:34.598;B;$GPGGA,1\n";
        let mut out = Vec::new();
        let summary = transcoder.run(&input[..], &mut out).unwrap();

        assert_eq!(summary.bytes_in, input.len() as u64);
        assert_eq!(summary.bytes_out, out.len() as u64);
        assert_eq!(summary.segments, 1);
        assert_eq!(summary.segment_bytes, 4);
        assert_eq!(summary.sentences_verified, 1);
        assert_eq!(summary.checksum_errors, 1);
        assert_eq!(summary.line_end_marks, 1);
        assert_eq!(summary.control_byte_marks, 0);
        assert_eq!(summary.annotations(), 2);

        let events = observer.events();
        assert_eq!(events[0], TranscodeEvent::SegmentOpened { offset: 14 });
        assert_eq!(
            events[1],
            TranscodeEvent::SegmentClosed {
                offset: 19,
                bytes: 4,
                checksum: 0x68,
            }
        );
        assert!(matches!(events[2], TranscodeEvent::SentenceVerified { .. }));
        assert!(matches!(
            events[3],
            TranscodeEvent::ChecksumMismatch { residual: 0x46, .. }
        ));
        assert!(matches!(events[4], TranscodeEvent::LineEndInBody { .. }));
        assert_eq!(events.len(), 5);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(";$POSMSK,01,02,03,0A*68\n"));
        assert!(text.contains("*00 # checksum error, residual: 46\n"));
        assert!(text.contains("$GPGGA,1##\n"));
    }

    #[test]
    fn test_segment_closed_at_end_of_stream() {
        let (transcoder, observer) = recording(TranscodeConfig::default());
        let out = transcoder
            .transcode_bytes(b"00:00:34.592;A;\x01\x02\x03")
            .unwrap();
        assert_eq!(out, b"00:00:34.592;A;$POSMSK,010203*35\n");
        assert_eq!(
            observer.events().last(),
            Some(&TranscodeEvent::SegmentClosed {
                offset: 18,
                bytes: 3,
                checksum: 0x35,
            })
        );
    }

    #[test]
    fn test_hex_transcript_decodes_to_original() {
        let payload: Vec<u8> = (0u8..=255).filter(|b| *b != b'\n' && *b != b'\r').collect();
        let mut input = b"12:34:56.789;A;".to_vec();
        input.extend_from_slice(&payload);

        for sep in [",", " ", ""] {
            let transcoder = Transcoder::with_observer(
                TranscodeConfig {
                    separator: Some(sep.to_string()),
                    ..Default::default()
                },
                Arc::new(crate::events::NullObserver),
            );
            let out = String::from_utf8(transcoder.transcode_bytes(&input).unwrap()).unwrap();
            let body = out
                .strip_prefix("12:34:56.789;A;$POSMSK")
                .and_then(|rest| rest.split_once('*'))
                .map(|(body, _)| body)
                .unwrap();
            assert_eq!(decode_hex(body, sep).unwrap(), payload);
        }
    }

    #[test]
    fn test_output_is_printable_for_binary_channel() {
        let mut input = b"00:00:00.000;A;".to_vec();
        input.extend((0u8..=255).rev());
        let out = Transcoder::new(TranscodeConfig::default())
            .transcode_bytes(&input)
            .unwrap();
        assert!(out.iter().all(|b| b.is_ascii_graphic() || *b == b'\n'));
    }

    #[test]
    fn test_debug_trailer_lines() {
        let transcoder = Transcoder::new(TranscodeConfig {
            debug_level: 1,
            ..Default::default()
        });
        let out = transcoder.transcode_bytes(b"$A*41\n").unwrap();
        let expected = "$  state:  7   \n  $      00\n\
A  state:  7   $  A      41\n\
*  state:  8   A  *      41\n\
4  state:  8   *  4      10\n\
1  state:  8   4  1      00\n\
\n  state:  1  31 0a\n\
\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_debug_trailer_format() {
        assert_eq!(
            debug_trailer(RecognizerState::Binary, b'\n', 0x01, 0x1F),
            b"  state: 10  0a 01\n".to_vec()
        );
        assert_eq!(
            debug_trailer(RecognizerState::Checksum, b'*', b'5', 0x150),
            b"  state:  8   *  5      50\n".to_vec()
        );
    }

    #[test]
    fn test_empty_input() {
        let transcoder = Transcoder::new(TranscodeConfig::default());
        assert_eq!(transcoder.transcode_bytes(b"").unwrap(), b"\n");
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = TranscodeConfig {
            ascii_channel_a: true,
            debug_level: 2,
            separator: Some(", ".into()),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: TranscodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let partial: TranscodeConfig = toml::from_str("ascii_channel_a = true").unwrap();
        assert!(partial.ascii_channel_a);
        assert_eq!(partial.separator, None);
    }

    #[test]
    fn test_config_file() {
        let path = std::env::temp_dir().join(format!("hexlog-config-{}.toml", std::process::id()));
        let config = TranscodeConfig {
            separator: Some(";".into()),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = TranscodeConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    /// Keeps a copy of the data seen at every flush.
    #[derive(Default)]
    struct FlushRecorder {
        data: Vec<u8>,
        flushed: Vec<Vec<u8>>,
    }

    impl Write for FlushRecorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed.push(self.data.clone());
            Ok(())
        }
    }

    #[test]
    fn test_segment_edges_are_flushed() {
        let transcoder = Transcoder::new(TranscodeConfig::default());
        let mut sink = FlushRecorder::default();
        transcoder
            .run(&b"00:00:34.592;A;\x01\x02\x03"[..], &mut sink)
            .unwrap();

        // header flushed before any payload byte is read
        assert_eq!(sink.flushed[0], b"00:00:34.592;A;$POSMSK,".to_vec());
        assert_eq!(
            sink.flushed.last(),
            Some(&b"00:00:34.592;A;$POSMSK,010203*35\n".to_vec())
        );
    }

    #[test]
    fn test_segment_trailer_flushed_with_next_line_start() {
        let transcoder = Transcoder::new(TranscodeConfig::default());
        let mut sink = FlushRecorder::default();
        transcoder
            .run(&b"00:00:34.592;A;\x01\n0"[..], &mut sink)
            .unwrap();

        assert!(
            sink.flushed
                .iter()
                .any(|snap| snap.as_slice() == b"00:00:34.592;A;$POSMSK,010A*45\n0")
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_error_propagates() {
        let transcoder = Transcoder::new(TranscodeConfig::default());
        let err = transcoder
            .run(&b"$GPVTG,,T,247.3,M,0.0,N*07\n"[..], FailingWriter)
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Write(_)));
    }
}
