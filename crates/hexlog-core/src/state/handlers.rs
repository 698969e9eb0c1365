//! Per-state byte handlers.
//!
//! Each handler sees the previous and the current byte, updates the
//! checksum, pushes state-specific output and returns the next state.
//! Echoing is applied afterwards by the recognizer.

use crate::encoder::nibble_value;
use crate::protocol::constants::*;
use crate::protocol::{is_channel_tag, is_line_end, is_sentence_start};
use crate::state::emit::{Annotation, Emit};
use crate::state::machine::{Recognizer, RecognizerState};

/// Dispatch `curr` to the handler of the current state.
pub(super) fn handle_byte(
    ctx: &mut Recognizer,
    curr: u8,
    emits: &mut Vec<Emit>,
) -> RecognizerState {
    let prev = ctx.prev;
    match ctx.state {
        RecognizerState::Sync => handle_sync(ctx, prev, curr),
        RecognizerState::Hour => handle_hour(prev, curr),
        RecognizerState::Minute => handle_timestamp_field(
            prev,
            curr,
            MINUTE_DELIMITER,
            RecognizerState::Minute,
            RecognizerState::Second,
        ),
        RecognizerState::Second => handle_timestamp_field(
            prev,
            curr,
            SECOND_DELIMITER,
            RecognizerState::Second,
            RecognizerState::Millis,
        ),
        RecognizerState::Millis => handle_timestamp_field(
            prev,
            curr,
            FIELD_DELIMITER,
            RecognizerState::Millis,
            RecognizerState::Channel,
        ),
        RecognizerState::Channel => handle_channel(ctx, prev, curr, emits),
        RecognizerState::SentenceStart => handle_sentence_start(ctx, curr),
        RecognizerState::SentenceBody => handle_body(ctx, curr, emits),
        RecognizerState::Checksum => handle_checksum(ctx, curr, emits),
        RecognizerState::Binary => handle_binary(ctx, prev, curr, emits),
    }
}

fn begin_sentence(ctx: &mut Recognizer) -> RecognizerState {
    ctx.checksum.reset(SENTENCE_SEED);
    RecognizerState::SentenceBody
}

// ============================================================================
// Line start and timestamp
// ============================================================================

/// Only a digit or `$`/`!` right after a line end leaves sync.
fn handle_sync(ctx: &mut Recognizer, prev: u8, curr: u8) -> RecognizerState {
    if !is_line_end(prev) {
        return RecognizerState::Sync;
    }
    if curr.is_ascii_digit() {
        RecognizerState::Hour
    } else if is_sentence_start(curr) {
        begin_sentence(ctx)
    } else {
        RecognizerState::Sync
    }
}

/// Hour digits; also the resting state after a completed line.
fn handle_hour(prev: u8, curr: u8) -> RecognizerState {
    if prev.is_ascii_digit() && curr == HOUR_DELIMITER {
        RecognizerState::Minute
    } else if curr.is_ascii_digit() || is_line_end(prev) {
        RecognizerState::Hour
    } else {
        RecognizerState::Sync
    }
}

fn handle_timestamp_field(
    prev: u8,
    curr: u8,
    delimiter: u8,
    current: RecognizerState,
    next: RecognizerState,
) -> RecognizerState {
    if prev.is_ascii_digit() && curr == delimiter {
        next
    } else if curr.is_ascii_digit() {
        current
    } else {
        RecognizerState::Sync
    }
}

// ============================================================================
// Channel tag
// ============================================================================

fn handle_channel(
    ctx: &mut Recognizer,
    prev: u8,
    curr: u8,
    emits: &mut Vec<Emit>,
) -> RecognizerState {
    if is_channel_tag(curr) {
        return RecognizerState::Channel;
    }
    if curr != FIELD_DELIMITER {
        return RecognizerState::Sync;
    }

    match prev {
        CHANNEL_NMEA | CHANNEL_INTERNAL => RecognizerState::SentenceStart,
        CHANNEL_BINARY if ctx.ascii_channel_a => RecognizerState::SentenceStart,
        CHANNEL_BINARY => {
            let header = ctx.encoder.segment_header();
            ctx.checksum.reset(SEGMENT_SEED);
            ctx.checksum.update(header.as_bytes());
            emits.push(Emit::SegmentHeader(header));
            RecognizerState::Binary
        }
        _ => RecognizerState::Sync,
    }
}

// ============================================================================
// Text sentence
// ============================================================================

fn handle_sentence_start(ctx: &mut Recognizer, curr: u8) -> RecognizerState {
    if is_sentence_start(curr) {
        begin_sentence(ctx)
    } else {
        ctx.checksum.reset(SENTENCE_SEED);
        RecognizerState::Sync
    }
}

fn handle_body(ctx: &mut Recognizer, curr: u8, emits: &mut Vec<Emit>) -> RecognizerState {
    if curr == CHECKSUM_DELIMITER {
        RecognizerState::Checksum
    } else if is_line_end(curr) {
        // Assume the next line carries a fresh timestamp.
        emits.push(Emit::Annotation(Annotation::LineEndInBody));
        RecognizerState::Hour
    } else if curr < FIRST_PRINTABLE {
        emits.push(Emit::Annotation(Annotation::ControlByteInBody));
        RecognizerState::Sync
    } else {
        ctx.checksum.update_byte(curr);
        RecognizerState::SentenceBody
    }
}

fn handle_checksum(ctx: &mut Recognizer, curr: u8, emits: &mut Vec<Emit>) -> RecognizerState {
    if is_line_end(curr) {
        if !ctx.checksum.is_zero() {
            emits.push(Emit::Annotation(Annotation::ChecksumMismatch {
                residual: ctx.checksum.residual(),
            }));
        }
        RecognizerState::Hour
    } else {
        ctx.checksum.fold_nibble(nibble_value(curr));
        RecognizerState::Checksum
    }
}

// ============================================================================
// Binary segment
// ============================================================================

/// Transcribe until a timestamp digit or `$` opens the next line.
fn handle_binary(
    ctx: &mut Recognizer,
    prev: u8,
    curr: u8,
    emits: &mut Vec<Emit>,
) -> RecognizerState {
    if is_line_end(prev) && (curr.is_ascii_digit() || curr == NMEA_START) {
        emits.push(Emit::SegmentTrailer(ctx.checksum.value()));
        return RecognizerState::Hour;
    }

    let hex = ctx.encoder.encode(curr);
    ctx.checksum.update(hex.as_bytes());
    emits.push(Emit::HexByte(hex));
    RecognizerState::Binary
}
