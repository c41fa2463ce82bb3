//! Command parser for `index:keyword:data` frame payloads.
//!
//! Arity is checked before anything else: exactly three `:`-separated
//! fields, empty fields included.  Keywords are matched case-sensitively;
//! an unknown keyword still parses and is left for the dispatcher to
//! ignore.  Only `LED1`/`LED2` require numeric data.

use crate::app::commands::{Command, CommandKind, Keyword};
use crate::channel::Channel;
use crate::error::ParseError;

/// Field separator inside a frame payload.
pub const SEPARATOR: char = ':';

/// Keyword of the reset command.
pub const RESET_KEYWORD: &str = "RES";

/// Parse a frame payload into a [`Command`].
pub fn parse(payload: &[u8]) -> Result<Command, ParseError> {
    let text = core::str::from_utf8(payload).map_err(|_| ParseError::MalformedFrame)?;

    let mut fields = text.split(SEPARATOR);
    let (Some(index), Some(keyword), Some(data), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(ParseError::MalformedFrame);
    };

    let index = parse_index(index)?;
    let data = trim_data(data);

    let kind = if let Some(channel) = Channel::from_keyword(keyword) {
        CommandKind::SetDuty {
            channel,
            percent: parse_percent(data)?,
        }
    } else if keyword == RESET_KEYWORD {
        CommandKind::Reset
    } else {
        CommandKind::Unrecognized(Keyword::truncated(keyword))
    };

    Ok(Command { index, kind })
}

fn parse_index(field: &str) -> Result<u32, ParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidIndex);
    }
    field.parse().map_err(|_| ParseError::InvalidIndex)
}

/// Strip one trailing end marker left over from raw slicing, then any
/// line-ending whitespace a terminal may add.
fn trim_data(field: &str) -> &str {
    field
        .strip_suffix(char::from(super::codec::END_MARKER))
        .unwrap_or(field)
        .trim_matches(|c: char| c.is_ascii_whitespace())
}

fn parse_percent(field: &str) -> Result<f32, ParseError> {
    let value: f32 = field.parse().map_err(|_| ParseError::InvalidData)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidData)
    }
}
