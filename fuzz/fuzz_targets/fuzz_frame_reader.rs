//! Fuzz target: `FrameReader::push`
//!
//! Drives arbitrary byte sequences through the streaming frame reader and
//! asserts that it never panics, never yields an oversized payload, and
//! never yields a payload holding an end marker.
//!
//! cargo fuzz run fuzz_frame_reader

#![no_main]

use libfuzzer_sys::fuzz_target;
use uartpwm::serial::codec::{END_MARKER, FrameReader, MAX_PAYLOAD};

fuzz_target!(|data: &[u8]| {
    let mut reader = FrameReader::new();

    for &b in data {
        if let Some(payload) = reader.push(b) {
            assert!(payload.len() <= MAX_PAYLOAD, "payload exceeds buffer");
            assert!(!payload.contains(&END_MARKER), "end marker leaked into payload");
        }
    }

    // After a reset the reader must accept bytes cleanly again.
    reader.reset();
    assert!(!reader.in_frame());
    for &b in data {
        let _ = reader.push(b);
    }
});
