//! GPIO / peripheral pin assignments for the UartPwm board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// PWM outputs (LEDC)
// ---------------------------------------------------------------------------

/// Channel LED1 output.
pub const LED1_GPIO: i32 = 4;
/// Channel LED2 output.
pub const LED2_GPIO: i32 = 5;

/// LEDC duty resolution (bits).  10-bit gives 0 – 1023 duty levels and
/// still reaches 100 Hz from the 80 MHz APB clock.
pub const PWM_RESOLUTION_BITS: u32 = 10;

// ---------------------------------------------------------------------------
// Command link (UART1)
// ---------------------------------------------------------------------------

/// UART peripheral carrying the command protocol.
pub const COMMAND_UART_PORT: i32 = 1;
pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
/// Driver-side RX ring buffer (bytes).  Must exceed the 128-byte hardware FIFO.
pub const UART_RX_BUFFER: i32 = 256;
