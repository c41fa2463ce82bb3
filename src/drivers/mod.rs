//! PWM output driver, hardware initialisation, and task helpers.

pub mod hw_init;
pub mod ledc;
pub mod task_pin;
