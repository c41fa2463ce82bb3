//! Integration tests for the link → frame reader → parser → registry
//! pipeline.
//!
//! A scripted in-memory link feeds raw bytes; the mock actuator records
//! what actually reaches the PWM outputs.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uartpwm::app::events::ControllerEvent;
use uartpwm::app::ports::TaskSpawner;
use uartpwm::app::service::{DispatchOutcome, Dispatcher};
use uartpwm::channel::Channel;
use uartpwm::config::ControllerConfig;
use uartpwm::error::{ParseError, TaskError};
use uartpwm::serial::codec::ACK;
use uartpwm::tasks::registry::{ChannelTaskRegistry, TaskStatus};

use super::mock_hw::{
    ActuatorCall, FailingSpawner, MockActuator, MockLink, RecordingSink, StdSpawner, wait_for,
};

type TestDispatcher<W = StdSpawner> = Dispatcher<MockLink, MockActuator, RecordingSink, W>;

fn test_config(echo: bool) -> ControllerConfig {
    ControllerConfig {
        echo_diagnostics: echo,
        actuation_interval_ms: 2,
        ..Default::default()
    }
}

fn make_with<W: TaskSpawner>(spawner: W, echo: bool) -> (TestDispatcher<W>, Arc<MockActuator>) {
    let config = test_config(echo);
    let hw = Arc::new(MockActuator::new());
    let registry = ChannelTaskRegistry::new(
        Arc::clone(&hw),
        spawner,
        config.pwm_period(),
        config.actuation_interval(),
    );
    let dispatcher = Dispatcher::new(&config, MockLink::new(), registry, RecordingSink::new());
    (dispatcher, hw)
}

fn make() -> (TestDispatcher, Arc<MockActuator>) {
    make_with(StdSpawner::default(), false)
}

fn send(d: &mut TestDispatcher<impl TaskSpawner>, bytes: &[u8]) -> Option<DispatchOutcome> {
    d.transport_mut().feed(bytes);
    d.poll()
}

// ── Startup ──────────────────────────────────────────────────

#[test]
fn registry_configures_and_zeroes_both_outputs_at_startup() {
    let (d, hw) = make();
    let period = test_config(false).pwm_period();
    assert_eq!(
        hw.calls(),
        vec![
            ActuatorCall::ConfigurePeriod(Channel::Led1, period),
            ActuatorCall::SetDuty(Channel::Led1, 0.0),
            ActuatorCall::ConfigurePeriod(Channel::Led2, period),
            ActuatorCall::SetDuty(Channel::Led2, 0.0),
        ]
    );
    assert_eq!(d.registry().running_count(), 0);
}

#[test]
fn start_emits_started_and_stays_silent_without_echo() {
    let (mut d, _hw) = make();
    d.start();
    assert_eq!(d.sink().events, vec![ControllerEvent::Started]);
    assert!(d.transport().tx.is_empty());
}

// ── Duty commands ─────────────────────────────────────────────

#[test]
fn led_command_starts_task_and_drives_output() {
    let (mut d, hw) = make();

    let outcome = send(&mut d, b"#0:LED1:75$");
    assert_eq!(
        outcome,
        Some(DispatchOutcome::DutySet {
            channel: Channel::Led1,
            fraction: 0.75,
            task: Ok(TaskStatus::Started),
        })
    );

    assert!(d.registry().is_running(Channel::Led1));
    assert!(!d.registry().is_running(Channel::Led2));
    assert_eq!(d.registry().commanded_duty(Channel::Led1), 0.75);
    assert!(wait_for(|| hw.last_duty(Channel::Led1) == Some(0.75)));
    assert_eq!(d.transport().tx, vec![ACK]);

    assert!(d.sink().contains(&ControllerEvent::DutyCommanded {
        channel: Channel::Led1,
        fraction: 0.75,
        clamped: false,
    }));
    assert!(d.sink().contains(&ControllerEvent::TaskStarted(Channel::Led1)));
}

#[test]
fn second_command_reuses_running_task() {
    let (mut d, hw) = make();
    send(&mut d, b"#0:LED2:20$");

    let outcome = send(&mut d, b"#1:LED2:60$");
    assert_eq!(
        outcome,
        Some(DispatchOutcome::DutySet {
            channel: Channel::Led2,
            fraction: 0.6,
            task: Ok(TaskStatus::AlreadyRunning),
        })
    );
    assert_eq!(d.registry().running_count(), 1);
    assert!(wait_for(|| hw.last_duty(Channel::Led2) == Some(0.6)));

    let started = d
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e, ControllerEvent::TaskStarted(_)))
        .count();
    assert_eq!(started, 1);
}

#[test]
fn repeating_a_command_is_idempotent() {
    let (mut d, _hw) = make();
    send(&mut d, b"#0:LED1:40$");
    send(&mut d, b"#0:LED1:40$");

    assert_eq!(d.registry().commanded_duty(Channel::Led1), 0.4);
    assert_eq!(d.registry().running_count(), 1);
    assert_eq!(d.transport().ack_count(), 2);
}

#[test]
fn channels_are_driven_independently() {
    let (mut d, hw) = make();
    send(&mut d, b"#0:LED1:10$");
    send(&mut d, b"#1:LED2:90$");

    assert_eq!(d.registry().running_count(), 2);
    assert!(wait_for(|| {
        hw.last_duty(Channel::Led1) == Some(0.1) && hw.last_duty(Channel::Led2) == Some(0.9)
    }));
}

#[test]
fn out_of_range_percentages_are_clamped() {
    let (mut d, _hw) = make();

    match send(&mut d, b"#0:LED2:150$") {
        Some(DispatchOutcome::DutySet { fraction, .. }) => assert_eq!(fraction, 1.0),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(d.sink().contains(&ControllerEvent::DutyCommanded {
        channel: Channel::Led2,
        fraction: 1.0,
        clamped: true,
    }));

    send(&mut d, b"#1:LED2:-5$");
    assert_eq!(d.registry().commanded_duty(Channel::Led2), 0.0);
}

#[test]
fn fractional_and_padded_data_is_accepted() {
    let (mut d, _hw) = make();
    send(&mut d, b"#7:LED1: 12.5 $");
    assert_eq!(d.registry().commanded_duty(Channel::Led1), 0.125);
}

// ── Rejected input ────────────────────────────────────────────

#[test]
fn malformed_frames_change_nothing_but_are_acknowledged() {
    let (mut d, hw) = make();
    let baseline = hw.calls();

    let cases: [(&[u8], ParseError); 5] = [
        (b"#junk$", ParseError::MalformedFrame),
        (b"#1:LED1$", ParseError::MalformedFrame),
        (b"#1:LED1:5:6$", ParseError::MalformedFrame),
        (b"#x:LED1:5$", ParseError::InvalidIndex),
        (b"#1:LED1:abc$", ParseError::InvalidData),
    ];
    for (frame, expected) in cases {
        assert_eq!(
            send(&mut d, frame),
            Some(DispatchOutcome::Rejected(expected)),
            "frame {:?}",
            String::from_utf8_lossy(frame)
        );
    }

    assert_eq!(d.transport().ack_count(), cases.len());
    assert_eq!(d.registry().running_count(), 0);
    for ch in Channel::ALL {
        assert_eq!(d.registry().commanded_duty(ch), 0.0);
    }
    assert_eq!(hw.calls(), baseline);
    assert!(
        d.sink()
            .events
            .iter()
            .all(|e| matches!(e, ControllerEvent::FrameRejected(_)))
    );
}

#[test]
fn non_finite_data_is_rejected() {
    let (mut d, _hw) = make();
    assert_eq!(
        send(&mut d, b"#1:LED1:NaN$"),
        Some(DispatchOutcome::Rejected(ParseError::InvalidData))
    );
    assert_eq!(
        send(&mut d, b"#1:LED2:inf$"),
        Some(DispatchOutcome::Rejected(ParseError::InvalidData))
    );
    assert_eq!(d.registry().running_count(), 0);
}

#[test]
fn unknown_keyword_is_acknowledged_and_ignored() {
    let (mut d, _hw) = make();
    assert_eq!(send(&mut d, b"#3:led1:50$"), Some(DispatchOutcome::Ignored));
    assert_eq!(send(&mut d, b"#3:FOO:1$"), Some(DispatchOutcome::Ignored));

    assert_eq!(d.transport().ack_count(), 2);
    assert_eq!(d.registry().running_count(), 0);
    assert!(matches!(
        d.sink().events.last(),
        Some(ControllerEvent::UnknownCommand(k)) if k.as_str() == "FOO"
    ));
}

// ── Framing ───────────────────────────────────────────────────

#[test]
fn idle_link_yields_nothing() {
    let (mut d, _hw) = make();
    assert_eq!(d.poll(), None);
    assert!(d.transport().tx.is_empty());
}

#[test]
fn partial_frame_is_continued_on_next_poll() {
    let (mut d, _hw) = make();
    assert_eq!(send(&mut d, b"#0:LE"), None);
    assert!(d.transport().tx.is_empty());

    assert!(matches!(
        send(&mut d, b"D1:5$"),
        Some(DispatchOutcome::DutySet { channel: Channel::Led1, .. })
    ));
    assert_eq!(d.transport().ack_count(), 1);
}

#[test]
fn noise_before_start_marker_is_dropped() {
    let (mut d, _hw) = make();
    send(&mut d, b"garbage$\r\n#0:LED2:20$");
    assert_eq!(d.registry().commanded_duty(Channel::Led2), 0.2);
    assert_eq!(d.transport().ack_count(), 1);
}

#[test]
fn overflow_resynchronises_on_next_start_marker() {
    let (mut d, _hw) = make();

    // Sixteen payload bytes with no end marker overflow the buffer.
    assert_eq!(send(&mut d, b"#0123456789ABCDEF"), None);
    assert_eq!(d.frame_stats().overflowed, 1);
    assert!(d.transport().tx.is_empty());

    send(&mut d, b"XYZ$#0:LED1:30$");
    assert_eq!(d.registry().commanded_duty(Channel::Led1), 0.3);
    assert_eq!(d.transport().ack_count(), 1);
    assert_eq!(d.frame_stats().delivered, 1);
}

#[test]
fn burst_of_frames_is_served_one_per_poll() {
    let (mut d, _hw) = make();
    d.transport_mut().feed(b"#0:LED1:10$#1:LED2:20$#2:RES:NULL$");

    assert!(matches!(d.poll(), Some(DispatchOutcome::DutySet { channel: Channel::Led1, .. })));
    assert_eq!(d.transport().ack_count(), 1);
    assert!(matches!(d.poll(), Some(DispatchOutcome::DutySet { channel: Channel::Led2, .. })));
    assert!(matches!(d.poll(), Some(DispatchOutcome::Reset { .. })));
    assert_eq!(d.poll(), None);
    assert_eq!(d.transport().ack_count(), 3);
}

// ── Reset ─────────────────────────────────────────────────────

#[test]
fn reset_stops_all_tasks_and_zeroes_outputs() {
    let (mut d, hw) = make();
    send(&mut d, b"#0:LED1:75$");
    send(&mut d, b"#1:LED2:25$");
    assert!(wait_for(|| {
        hw.last_duty(Channel::Led1) == Some(0.75) && hw.last_duty(Channel::Led2) == Some(0.25)
    }));

    match send(&mut d, b"#2:RES:NULL$") {
        Some(DispatchOutcome::Reset { stopped }) => {
            assert_eq!(stopped.as_slice(), &[Channel::Led1, Channel::Led2]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(d.registry().running_count(), 0);
    for ch in Channel::ALL {
        assert_eq!(d.registry().commanded_duty(ch), 0.0);
        assert_eq!(hw.last_duty(ch), Some(0.0));
    }

    // Nothing writes after the reset returns.
    let writes = hw.calls().len();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(hw.calls().len(), writes);

    assert!(matches!(
        d.sink().events.last(),
        Some(ControllerEvent::ChannelsReset(v)) if v.len() == 2
    ));
}

#[test]
fn reset_with_no_tasks_still_zeroes_outputs() {
    let (mut d, hw) = make();
    hw.clear();

    match send(&mut d, b"#0:RES:x$") {
        Some(DispatchOutcome::Reset { stopped }) => assert!(stopped.is_empty()),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        hw.calls(),
        vec![
            ActuatorCall::SetDuty(Channel::Led1, 0.0),
            ActuatorCall::SetDuty(Channel::Led2, 0.0),
        ]
    );
}

#[test]
fn channel_restarts_after_reset() {
    let (mut d, hw) = make();
    send(&mut d, b"#0:LED1:50$");
    send(&mut d, b"#1:RES:NULL$");

    assert_eq!(
        send(&mut d, b"#2:LED1:80$"),
        Some(DispatchOutcome::DutySet {
            channel: Channel::Led1,
            fraction: 0.8,
            task: Ok(TaskStatus::Started),
        })
    );
    assert!(wait_for(|| hw.last_duty(Channel::Led1) == Some(0.8)));
}

// ── Task failures ─────────────────────────────────────────────

#[test]
fn spawn_failure_is_reported_and_loop_continues() {
    let (mut d, _hw) = make_with(FailingSpawner, false);

    assert_eq!(
        send(&mut d, b"#0:LED1:50$"),
        Some(DispatchOutcome::DutySet {
            channel: Channel::Led1,
            fraction: 0.5,
            task: Err(TaskError::SpawnFailed(Channel::Led1)),
        })
    );
    assert!(!d.registry().is_running(Channel::Led1));
    assert_eq!(d.registry().commanded_duty(Channel::Led1), 0.5);
    assert!(d.sink().contains(&ControllerEvent::TaskFailed(TaskError::SpawnFailed(Channel::Led1))));

    // Still serving the link.
    assert!(matches!(send(&mut d, b"#1:RES:NULL$"), Some(DispatchOutcome::Reset { .. })));
    assert_eq!(d.transport().ack_count(), 2);
}

// ── Diagnostic echo ───────────────────────────────────────────

#[test]
fn echo_writes_banner_and_parsed_fields_after_ack() {
    let (mut d, _hw) = make_with(StdSpawner::default(), true);

    d.start();
    assert!(d.transport().text().contains("UartPwm"));
    d.transport_mut().tx.clear();

    send(&mut d, b"#4:LED1:75$");
    let tx = &d.transport().tx;
    assert_eq!(tx[0], ACK, "ACK precedes any echo");

    let text = d.transport().text();
    for line in [
        "4:LED1:75\n",
        "Number:  4\n",
        "Command: LED1\n",
        "Data:    75\n",
        "LED1 Value: 75.00%\n",
    ] {
        assert!(text.contains(line), "missing {:?} in {:?}", line, text);
    }
}

#[test]
fn echo_lists_stopped_tasks_on_reset() {
    let (mut d, _hw) = make_with(StdSpawner::default(), true);
    send(&mut d, b"#0:LED2:10$");
    d.transport_mut().tx.clear();

    send(&mut d, b"#1:RES:NULL$");
    let text = d.transport().text();
    assert!(text.contains("LED2 task stopped"));
    assert!(!text.contains("LED1 task stopped"));
}

#[test]
fn echo_reports_rejected_frame_payload_only() {
    let (mut d, _hw) = make_with(StdSpawner::default(), true);
    send(&mut d, b"#bad$");
    let text = d.transport().text();
    assert_eq!(text, "bad\n");
}
