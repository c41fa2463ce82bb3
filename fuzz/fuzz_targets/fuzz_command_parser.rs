//! Fuzz target: `parser::parse`
//!
//! Feeds arbitrary payloads to the command parser.  It must never panic,
//! and any duty command it accepts must carry a finite percentage.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use uartpwm::app::commands::CommandKind;
use uartpwm::channel::percent_to_fraction;
use uartpwm::serial::parser::parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = parse(data) {
        if let CommandKind::SetDuty { percent, .. } = cmd.kind {
            assert!(percent.is_finite());
            let (fraction, _) = percent_to_fraction(percent);
            assert!((0.0..=1.0).contains(&fraction));
        }
    }
});
