//! Actuation channels and their shared commanded duty.
//!
//! The board has two fixed PWM channels.  Each one carries a
//! [`DutyCell`]: written by the dispatcher, read every cycle by the
//! channel's actuation task.  The cell stores the `f32` bit pattern in an
//! `AtomicU32`, so a reader always sees a value that some writer stored
//! in full.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// One of the two independently driven outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Led1,
    Led2,
}

impl Channel {
    /// Number of channels on the board.
    pub const COUNT: usize = 2;

    /// Every channel, in index order.
    pub const ALL: [Channel; Self::COUNT] = [Channel::Led1, Channel::Led2];

    /// Stable array index for per-channel tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Led1 => 0,
            Self::Led2 => 1,
        }
    }

    /// Wire keyword that commands this channel.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Led1 => "LED1",
            Self::Led2 => "LED2",
        }
    }

    /// Case-sensitive keyword lookup.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ch| ch.keyword() == keyword)
    }

    /// Null-terminated task name, as the FreeRTOS pthread config expects.
    pub const fn task_name(self) -> &'static str {
        match self {
            Self::Led1 => "pwm-led1\0",
            Self::Led2 => "pwm-led2\0",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Lock-free single-writer/single-reader duty fraction.
#[derive(Debug)]
pub struct DutyCell(AtomicU32);

impl DutyCell {
    pub fn new(fraction: f32) -> Self {
        Self(AtomicU32::new(fraction.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, fraction: f32) {
        self.0.store(fraction.to_bits(), Ordering::Release);
    }
}

impl Default for DutyCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Map a commanded percentage onto a `[0, 1]` duty fraction.
///
/// Returns the fraction and whether the input had to be clamped into
/// `[0, 100]` first.
pub fn percent_to_fraction(percent: f32) -> (f32, bool) {
    let clamped = percent.clamp(0.0, 100.0);
    (clamped / 100.0, clamped != percent)
}
