//! UartPwm Firmware: Main Entry Point
//!
//! Hexagonal layout: one dispatcher thread reads framed commands from
//! UART1, and one actuation thread per LED channel keeps its PWM output
//! at the last commanded duty.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartTransport      PwmAdapter<LedcOutput>    LogEventSink     │
//! │  (Transport)        (ActuatorPort)            (EventSink)      │
//! │  ThreadSpawner (TaskSpawner, core-pinned pthreads)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Dispatcher: FrameReader · parse · ChannelTaskRegistry │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use uartpwm::adapters::log_sink::LogEventSink;
use uartpwm::adapters::pwm::PwmAdapter;
use uartpwm::adapters::uart::UartTransport;
use uartpwm::app::service::Dispatcher;
use uartpwm::config::ControllerConfig;
use uartpwm::drivers::hw_init;
use uartpwm::drivers::ledc::LedcOutput;
use uartpwm::drivers::task_pin::ThreadSpawner;
use uartpwm::pins;
use uartpwm::tasks::registry::ChannelTaskRegistry;

/// Config baked in at build time, e.g.
/// `UARTPWM_CONFIG='{"baud_rate":115200,"echo_diagnostics":true}'`.
fn load_config() -> ControllerConfig {
    let Some(text) = option_env!("UARTPWM_CONFIG") else {
        return ControllerConfig::default();
    };
    match ControllerConfig::from_json(text) {
        Ok(cfg) => {
            info!("Config loaded from UARTPWM_CONFIG");
            cfg
        }
        Err(e) => {
            warn!("UARTPWM_CONFIG rejected ({}), using defaults", e);
            ControllerConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  UartPwm v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals(&config).context("peripheral bring-up")?;

    // ── 3. Adapters ───────────────────────────────────────────
    let pwm = Arc::new(PwmAdapter::new(
        LedcOutput::new(hw_init::LEDC_CH_LED1),
        LedcOutput::new(hw_init::LEDC_CH_LED2),
    ));
    let registry = ChannelTaskRegistry::new(
        pwm,
        ThreadSpawner::from_config(&config),
        config.pwm_period(),
        config.actuation_interval(),
    );
    let uart = UartTransport::new(pins::COMMAND_UART_PORT);

    // ── 4. Dispatch loop ──────────────────────────────────────
    info!("System ready. Listening on UART{}.", pins::COMMAND_UART_PORT);
    Dispatcher::new(&config, uart, registry, LogEventSink::new()).run()
}
