//! Integration tests for channel task lifecycle under real threads.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use uartpwm::channel::Channel;
use uartpwm::tasks::registry::{ChannelTaskRegistry, TaskStatus};

use super::mock_hw::{DoomedSpawner, MockActuator, StdSpawner, wait_for};

const PERIOD: Duration = Duration::from_millis(10);
const INTERVAL: Duration = Duration::from_millis(1);
const TORN_READ_SAMPLES: usize = 200;

fn registry() -> (ChannelTaskRegistry<MockActuator, StdSpawner>, Arc<MockActuator>) {
    let hw = Arc::new(MockActuator::new());
    let reg = ChannelTaskRegistry::new(Arc::clone(&hw), StdSpawner::default(), PERIOD, INTERVAL);
    (reg, hw)
}

#[test]
fn task_never_observes_a_torn_duty() {
    let (mut reg, hw) = registry();
    reg.ensure_running(Channel::Led1).unwrap();

    // Keep flipping until the task has sampled the cell many times.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut i = 0u32;
    while hw.write_count(Channel::Led1) < TORN_READ_SAMPLES && Instant::now() < deadline {
        reg.set_duty(Channel::Led1, if i % 2 == 0 { 0.25 } else { 0.75 });
        i = i.wrapping_add(1);
        if i % 64 == 0 {
            thread::yield_now();
        }
    }
    reg.terminate_all();

    let seen = hw.duties(Channel::Led1);
    assert!(
        seen.len() >= TORN_READ_SAMPLES,
        "only {} writes before the deadline",
        seen.len()
    );
    assert!(
        seen.iter().all(|d| [0.0, 0.25, 0.75].contains(d)),
        "unexpected duty in {:?}",
        seen
    );
}

#[test]
fn one_spawn_per_channel_while_alive() {
    let (mut reg, _hw) = registry();
    assert_eq!(reg.ensure_running(Channel::Led2), Ok(TaskStatus::Started));
    for _ in 0..10 {
        assert_eq!(reg.ensure_running(Channel::Led2), Ok(TaskStatus::AlreadyRunning));
    }
    assert_eq!(reg.running_count(), 1);
}

#[test]
fn task_survives_driver_write_failures() {
    let (mut reg, hw) = registry();
    hw.fail_writes.store(true, Ordering::Relaxed);
    reg.ensure_running(Channel::Led1).unwrap();

    let before = hw.write_count(Channel::Led1);
    assert!(wait_for(|| hw.write_count(Channel::Led1) > before + 5));
    assert_eq!(reg.ensure_running(Channel::Led1), Ok(TaskStatus::AlreadyRunning));
}

#[test]
fn dead_task_is_reaped_and_replaced() {
    let hw = Arc::new(MockActuator::new());
    let mut reg = ChannelTaskRegistry::new(Arc::clone(&hw), DoomedSpawner, PERIOD, INTERVAL);

    assert_eq!(reg.ensure_running(Channel::Led2), Ok(TaskStatus::Started));
    assert!(wait_for(|| {
        reg.ensure_running(Channel::Led2) == Ok(TaskStatus::Restarted)
    }));
    assert!(reg.is_running(Channel::Led2));
}

#[test]
fn dropping_the_registry_stops_and_zeroes_everything() {
    let (mut reg, hw) = registry();
    reg.set_duty(Channel::Led1, 0.5);
    reg.set_duty(Channel::Led2, 0.5);
    reg.ensure_running(Channel::Led1).unwrap();
    reg.ensure_running(Channel::Led2).unwrap();
    assert!(wait_for(|| {
        hw.last_duty(Channel::Led1) == Some(0.5) && hw.last_duty(Channel::Led2) == Some(0.5)
    }));

    drop(reg);

    let writes = hw.calls().len();
    thread::sleep(Duration::from_millis(10));
    assert_eq!(hw.calls().len(), writes);
    assert_eq!(hw.last_duty(Channel::Led1), Some(0.0));
    assert_eq!(hw.last_duty(Channel::Led2), Some(0.0));
}
