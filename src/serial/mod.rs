//! Serial command protocol.
//!
//! ```text
//! ┌───────────┐  bytes  ┌─────────────┐ payload ┌──────────┐ Command
//! │ Transport │────────▶│ FrameReader │────────▶│  parse   │────────▶ Dispatcher
//! │  (trait)  │◀────────│   (codec)   │         │ (parser) │
//! └───────────┘   ACK   └─────────────┘         └──────────┘
//! ```

pub mod codec;
pub mod parser;
pub mod transport;
