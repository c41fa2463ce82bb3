//! Delimited text frame reader.
//!
//! Wire format:
//! ```text
//! ┌─────┬──────────────────────────┬─────┐
//! │ '#' │ payload (≤ 15 bytes)     │ '$' │
//! └─────┴──────────────────────────┴─────┘
//! ```
//!
//! Bytes before a start marker are line noise and are dropped.  The
//! payload buffer holds [`FRAME_CAPACITY`] bytes including the end marker;
//! a frame that fills it without a `$` is discarded and the reader goes
//! back to hunting for the next `#`.  If the byte that overflows is itself
//! a `#`, it opens the next frame.  Every frame that does close gets
//! exactly one [`ACK`] byte written back, whether or not its payload later
//! parses.

use heapless::Vec;
use log::{debug, warn};

use super::transport::Transport;

/// Start-of-frame marker.
pub const START_MARKER: u8 = b'#';

/// End-of-frame marker.
pub const END_MARKER: u8 = b'$';

/// Acknowledgement byte sent for every delimited frame.
pub const ACK: u8 = 0x06;

/// Frame buffer size, end marker included.
pub const FRAME_CAPACITY: usize = 16;

/// Longest payload that still leaves room for the end marker.
pub const MAX_PAYLOAD: usize = FRAME_CAPACITY - 1;

/// A delimited frame body with both markers stripped.
pub type Payload = Vec<u8, MAX_PAYLOAD>;

/// Reader state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Dropping bytes until a start marker.
    Hunting,
    /// Start marker seen, accumulating payload.
    Collecting,
}

/// Running counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames delivered (and acknowledged).
    pub delivered: u32,
    /// Frames discarded for exceeding the buffer.
    pub overflowed: u32,
}

/// Streaming frame reader, fed one byte at a time.
pub struct FrameReader {
    state: ReaderState,
    buf: Payload,
    stats: FrameStats,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Hunting,
            buf: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    /// Advance the state machine by one byte.
    ///
    /// Returns the payload when `byte` closes a frame.  Acknowledgement is
    /// the caller's job; [`next_frame`](Self::next_frame) does it.
    pub fn push(&mut self, byte: u8) -> Option<Payload> {
        match self.state {
            ReaderState::Hunting => {
                if byte == START_MARKER {
                    self.buf.clear();
                    self.state = ReaderState::Collecting;
                }
                None
            }
            ReaderState::Collecting => {
                if byte == END_MARKER {
                    self.state = ReaderState::Hunting;
                    self.stats.delivered = self.stats.delivered.wrapping_add(1);
                    return Some(core::mem::take(&mut self.buf));
                }

                // The end marker needs the last slot; a full payload
                // followed by anything else cannot close in time.
                if self.buf.push(byte).is_err() {
                    debug!("frame exceeded {} bytes, resynchronising", FRAME_CAPACITY);
                    self.buf.clear();
                    self.stats.overflowed = self.stats.overflowed.wrapping_add(1);
                    if byte != START_MARKER {
                        self.state = ReaderState::Hunting;
                    }
                }
                None
            }
        }
    }

    /// Pull pending bytes from `transport` until a frame closes or the
    /// link runs dry.
    ///
    /// A closed frame is acknowledged with a single [`ACK`] before it is
    /// returned.  `None` means "no complete frame yet"; a partial frame is
    /// kept and continued on the next call.
    pub fn next_frame<T: Transport>(&mut self, transport: &mut T) -> Option<Payload> {
        loop {
            let byte = match transport.read_byte() {
                Ok(Some(b)) => b,
                Ok(None) => return None,
                Err(e) => {
                    warn!("serial read failed: {:?}", e);
                    return None;
                }
            };

            if let Some(payload) = self.push(byte) {
                if let Err(e) = transport.write(&[ACK]).and_then(|_| transport.flush()) {
                    warn!("ACK write failed: {:?}", e);
                }
                return Some(payload);
            }
        }
    }

    /// Drop any partial frame and return to hunting.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ReaderState::Hunting;
    }

    /// True while a start marker has been seen but the frame is still open.
    pub fn in_frame(&self) -> bool {
        self.state == ReaderState::Collecting
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
