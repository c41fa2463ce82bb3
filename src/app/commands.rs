//! Structured commands produced by the serial parser.
//!
//! These are the only requests the outside world can make of the
//! controller; the [`Dispatcher`](super::service::Dispatcher) interprets
//! them against the channel task registry.

use heapless::String;

use crate::channel::Channel;
use crate::serial::codec::MAX_PAYLOAD;

/// Unrecognized keyword, kept for diagnostics.  Never longer than a
/// frame payload, so nothing is lost in practice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyword(String<MAX_PAYLOAD>);

impl Keyword {
    /// Copy `raw`, cutting it at the payload limit on a char boundary.
    pub fn truncated(raw: &str) -> Self {
        let mut s = String::new();
        for c in raw.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A parsed `index:keyword:data` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Leading sequence field.  Validated, echoed, otherwise unused.
    pub index: u32,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// `LED1`/`LED2`: drive `channel` at `percent` (not yet clamped).
    SetDuty { channel: Channel, percent: f32 },

    /// `RES`: stop every actuation task and zero both outputs.
    Reset,

    /// Structurally valid frame with a keyword nobody handles.
    Unrecognized(Keyword),
}

impl CommandKind {
    /// Keyword as it appeared on the wire.
    pub fn keyword(&self) -> &str {
        match self {
            Self::SetDuty { channel, .. } => channel.keyword(),
            Self::Reset => crate::serial::parser::RESET_KEYWORD,
            Self::Unrecognized(k) => k.as_str(),
        }
    }
}
