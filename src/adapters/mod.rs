//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                 |
//! |------------|--------------|-----------------------------|
//! | `pwm`      | ActuatorPort | embedded-hal PWM outputs    |
//! | `uart`     | Transport    | ESP-IDF UART driver         |
//! | `log_sink` | EventSink    | Serial log output           |

pub mod log_sink;
pub mod pwm;
pub mod uart;
