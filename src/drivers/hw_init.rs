//! One-shot hardware peripheral initialization.
//!
//! Configures the LEDC timer and both PWM channels, and installs the UART
//! driver for the command link, using raw ESP-IDF sys calls.  Called once
//! from `main()` before the dispatcher starts.  On host targets every
//! call is simulated in memory.

use core::time::Duration;

use crate::config::ControllerConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during peripheral initialization or reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
    /// Period outside what the LEDC timer can generate.
    PeriodOutOfRange,
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
            Self::PeriodOutOfRange => write!(f, "PWM period out of range"),
            Self::UartInitFailed(rc) => write!(f, "UART init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── Constants ─────────────────────────────────────────────────

pub const LEDC_CH_LED1: u32 = 0;
pub const LEDC_CH_LED2: u32 = 1;

/// Highest duty value at the configured resolution.
pub const LEDC_MAX_DUTY: u32 = (1 << crate::pins::PWM_RESOLUTION_BITS) - 1;

/// Slowest 10-bit timer from the 80 MHz APB clock: 80 MHz / (1024 * 1023),
/// about 76.4 Hz, rounded up.
pub const LEDC_MIN_HZ: u32 = 77;

/// Fastest 10-bit timer: 80 MHz / 1024, rounded down.
pub const LEDC_MAX_HZ: u32 = 78_000;

/// Timer frequency for a PWM period, if the LEDC can produce it.
///
/// Whole-millisecond periods from 1 to 12 ms are in range.
pub fn period_to_hz(period: Duration) -> Option<u32> {
    let micros = period.as_micros();
    if micros == 0 {
        return None;
    }
    let hz = 1_000_000 / micros;
    (u128::from(LEDC_MIN_HZ)..=u128::from(LEDC_MAX_HZ))
        .contains(&hz)
        .then_some(hz as u32)
}

/// Bring up every peripheral the controller needs: the LEDC timer and
/// both channels at the configured period, then the command UART.
pub fn init_peripherals(config: &ControllerConfig) -> crate::error::Result<()> {
    init_ledc(config.pwm_period())?;
    init_uart(config.baud_rate)?;
    Ok(())
}

// ── LEDC PWM ─────────────────────────────────────────────────

/// Configure timer 0 at `period` and attach both LED channels at 0 duty.
#[cfg(target_os = "espidf")]
pub fn init_ledc(period: Duration) -> Result<(), HwInitError> {
    let freq_hz = period_to_hz(period).ok_or(HwInitError::PeriodOutOfRange)?;

    // SAFETY: called once from the main task before any actuation task
    // exists; the config structs outlive the calls.
    unsafe {
        let timer = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: ledc_timer_t_LEDC_TIMER_0,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
            freq_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        let ret = ledc_timer_config(&timer);
        if ret != ESP_OK {
            return Err(HwInitError::LedcTimerFailed(ret));
        }

        for (channel, gpio) in [
            (LEDC_CH_LED1, pins::LED1_GPIO),
            (LEDC_CH_LED2, pins::LED2_GPIO),
        ] {
            let ret = ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel,
                timer_sel: ledc_timer_t_LEDC_TIMER_0,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            });
            if ret != ESP_OK {
                return Err(HwInitError::LedcChannelFailed(ret));
            }
        }
    }

    info!("hw_init: LEDC configured ({} Hz, led1=CH0, led2=CH1)", freq_hz);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_ledc(period: Duration) -> Result<(), HwInitError> {
    let freq_hz = period_to_hz(period).ok_or(HwInitError::PeriodOutOfRange)?;
    sim::FREQ_HZ.store(freq_hz, core::sync::atomic::Ordering::Relaxed);
    log::info!("hw_init(sim): LEDC at {} Hz", freq_hz);
    Ok(())
}

/// Write a raw duty value (0..=[`LEDC_MAX_DUTY`]) to one LEDC channel.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), i32> {
    // SAFETY: channel was configured in init_ledc().  The IDF LEDC driver
    // guards its registers with a spinlock, and each channel is written by
    // one owner at a time (see PwmAdapter).
    unsafe {
        let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
        if ret != ESP_OK {
            return Err(ret);
        }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), i32> {
    let slot = sim::DUTY.get(channel as usize).ok_or(-1)?;
    slot.store(duty, core::sync::atomic::Ordering::Relaxed);
    Ok(())
}

/// Re-program the shared LEDC timer for a new period.
#[cfg(target_os = "espidf")]
pub fn ledc_set_period(period: Duration) -> Result<(), HwInitError> {
    let freq_hz = period_to_hz(period).ok_or(HwInitError::PeriodOutOfRange)?;
    // SAFETY: timer 0 was configured in init_ledc().
    let ret = unsafe {
        ledc_set_freq(
            ledc_mode_t_LEDC_LOW_SPEED_MODE,
            ledc_timer_t_LEDC_TIMER_0,
            freq_hz,
        )
    };
    if ret != ESP_OK {
        return Err(HwInitError::LedcTimerFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set_period(period: Duration) -> Result<(), HwInitError> {
    let freq_hz = period_to_hz(period).ok_or(HwInitError::PeriodOutOfRange)?;
    sim::FREQ_HZ.store(freq_hz, core::sync::atomic::Ordering::Relaxed);
    Ok(())
}

/// Simulated LEDC registers for host builds.
#[cfg(not(target_os = "espidf"))]
pub mod sim {
    use core::sync::atomic::{AtomicU32, Ordering};

    pub(super) static DUTY: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];
    pub(super) static FREQ_HZ: AtomicU32 = AtomicU32::new(0);

    /// Last raw duty written to `channel`.
    pub fn duty(channel: u32) -> u32 {
        DUTY[channel as usize].load(Ordering::Relaxed)
    }

    /// Current simulated timer frequency.
    pub fn freq_hz() -> u32 {
        FREQ_HZ.load(Ordering::Relaxed)
    }
}

// ── UART ──────────────────────────────────────────────────────

/// Install the UART1 driver: `baud` 8N1, no flow control, RX buffering only.
#[cfg(target_os = "espidf")]
pub fn init_uart(baud: u32) -> Result<(), HwInitError> {
    // SAFETY: called once from the main task; the port is not used by
    // anything else.  A null queue handle means no event queue.
    unsafe {
        let cfg = uart_config_t {
            baud_rate: baud as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };
        let ret = uart_param_config(pins::COMMAND_UART_PORT, &cfg);
        if ret != ESP_OK {
            return Err(HwInitError::UartInitFailed(ret));
        }

        let ret = uart_set_pin(
            pins::COMMAND_UART_PORT,
            pins::UART_TX_GPIO,
            pins::UART_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        );
        if ret != ESP_OK {
            return Err(HwInitError::UartInitFailed(ret));
        }

        let ret = uart_driver_install(
            pins::COMMAND_UART_PORT,
            pins::UART_RX_BUFFER,
            0,
            0,
            core::ptr::null_mut(),
            0,
        );
        if ret != ESP_OK {
            return Err(HwInitError::UartInitFailed(ret));
        }
    }

    info!("hw_init: UART{} at {} baud", pins::COMMAND_UART_PORT, baud);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_uart(baud: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): UART at {} baud skipped", baud);
    Ok(())
}
