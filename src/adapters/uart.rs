//! UART transport adapter for the command link.
//!
//! - **`target_os = "espidf"`**: non-blocking reads and writes on the
//!   UART driver installed by [`hw_init::init_uart`].
//! - **`not(target_os = "espidf")`**: an idle link: never has data,
//!   swallows writes.
//!
//! [`hw_init::init_uart`]: crate::drivers::hw_init::init_uart

use crate::serial::transport::Transport;

/// Driver error code from the ESP-IDF UART API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartError(pub i32);

/// The command link on UART1.
pub struct UartTransport {
    port: i32,
}

impl UartTransport {
    /// Wrap a port whose driver is already installed.
    pub fn new(port: i32) -> Self {
        Self { port }
    }
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = UartError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        // SAFETY: buf is valid for buf.len() bytes; zero ticks = non-blocking.
        let n = unsafe {
            esp_idf_svc::sys::uart_read_bytes(
                self.port,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                0,
            )
        };
        if n < 0 {
            return Err(UartError(n));
        }
        Ok(n as usize)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        // SAFETY: data is valid for data.len() bytes; the driver copies it.
        let n = unsafe {
            esp_idf_svc::sys::uart_write_bytes(self.port, data.as_ptr().cast(), data.len())
        };
        if n < 0 {
            return Err(UartError(n));
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        // 10 ticks is ample for a few bytes at 9600 baud.
        // SAFETY: plain driver call on an installed port.
        let ret = unsafe { esp_idf_svc::sys::uart_wait_tx_done(self.port, 10) };
        if ret != esp_idf_svc::sys::ESP_OK {
            return Err(UartError(ret));
        }
        Ok(())
    }

    fn available(&self) -> bool {
        let mut len: usize = 0;
        // SAFETY: len is a valid out-pointer for the duration of the call.
        let ret = unsafe { esp_idf_svc::sys::uart_get_buffered_data_len(self.port, &mut len) };
        ret == esp_idf_svc::sys::ESP_OK && len > 0
    }
}

#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = UartError;

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, UartError> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), UartError> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}
