// End-to-end behaviour of the servo core driven the way the binary drives it
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use joyservo_core::config::JoyservoConfig;
use joyservo_core::{ControllerKind, JoyservoError, JoyservoResult, ShutdownSignal, StopSource};
use joyservo_library::control::ExitPhase;
use joyservo_library::{
    Direction, ImuDriver, InputDriver, InputEvent, LogStore, ProbedHardware, ScriptedInputDriver,
    SensorSource, ServoCore,
};

const XBOX: &str = "Xbox Wireless Controller";
const PS3: &str = "Sony PLAYSTATION(R)3 Controller";

fn core() -> ServoCore {
    ServoCore::simulated(JoyservoConfig::default())
}

fn quiet_config() -> JoyservoConfig {
    let mut config = JoyservoConfig::default();
    config.runtime.console = false;
    config
}

fn pulse(core: &ServoCore, channel: u8) -> (u16, u16) {
    core.servos()
        .lock()
        .driver()
        .as_simulation()
        .and_then(|sim| sim.pulse(channel))
        .unwrap()
}

#[test]
fn test_startup_centers_everything() {
    let core = core();
    let status = core.get_status();
    assert_eq!(status.servos.channels.len(), 4);
    for servo in &status.servos.channels {
        assert_eq!(servo.angle, 90);
        assert_eq!(servo.direction, Direction::Neutral);
        assert!(!servo.hold);
        assert_eq!(pulse(&core, servo.channel), (0, 375));
    }
    assert!(!status.servos.lock);
    assert!((status.servos.speed - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_lock_blocks_presets_but_not_direct_moves() {
    let core = core();
    core.set_lock(true).unwrap();

    assert_eq!(core.set_all_angle(0).unwrap(), 0);
    assert!(core
        .get_status()
        .servos
        .channels
        .iter()
        .all(|s| s.angle == 90));

    let status = core.set_channel_angle(2, 30).unwrap();
    assert_eq!(status.angle, 30);
    assert_eq!(status.direction, Direction::Down);
    assert_eq!(pulse(&core, 2), (0, 225));
}

#[test]
fn test_move_all_to_zero_directions() {
    let core = core();
    core.set_hold(3, true).unwrap();
    assert_eq!(core.set_all_angle(0).unwrap(), 3);

    let channels = core.get_status().servos.channels;
    assert_eq!(channels[0].direction, Direction::Left);
    assert_eq!(channels[1].direction, Direction::Down);
    assert_eq!(channels[2].direction, Direction::Down);
    assert_eq!(channels[3].angle, 90);
    assert_eq!(channels[3].direction, Direction::Neutral);
    assert_eq!(pulse(&core, 0), (0, 150));
}

#[test]
fn test_api_validation_errors() {
    let core = core();
    assert!(matches!(
        core.set_all_angle(-1),
        Err(JoyservoError::AngleOutOfRange(-1))
    ));
    assert!(matches!(
        core.set_hold(9, true),
        Err(JoyservoError::UnknownChannel(9))
    ));
    assert!(core.set_channel_angle(0, 180).is_ok());
    assert!(core.set_channel_angle(0, 0).is_ok());
}

#[test]
fn test_controller_hold_scenario() {
    let core = core();
    let pad = ScriptedInputDriver::new(
        XBOX,
        [
            InputEvent::press(304),
            InputEvent::release(304),
            InputEvent::axis(0, 32767),
            InputEvent::axis(1, 32767),
        ],
    );
    core.run_controller_session(pad.into());

    let channels = core.get_status().servos.channels;
    assert!(channels[0].hold);
    assert_eq!(channels[0].angle, 90);
    assert_eq!(channels[1].angle, 180);
    assert_eq!(channels[1].direction, Direction::Up);
}

#[test]
fn test_ps3_presets_and_lock_toggle() {
    let core = core();
    let pad = ScriptedInputDriver::new(
        PS3,
        [
            InputEvent::press(303), // D-pad left: all to 0
            InputEvent::press(302), // D-pad down: lock
            InputEvent::press(301), // D-pad right: suppressed
            InputEvent::axis(0, 32767),
        ],
    );
    core.run_controller_session(pad.into());

    let status = core.get_status();
    assert!(status.servos.lock);
    assert!(status.servos.channels.iter().all(|s| s.angle == 0));
}

#[test]
fn test_speed_scales_axis_moves() {
    let mut config = quiet_config();
    config.servo.speed_scaling = true;
    let core = ServoCore::simulated(config);
    let pad = ScriptedInputDriver::new(
        XBOX,
        [
            InputEvent::press(310),
            InputEvent::press(310),
            InputEvent::axis(0, 32767),
        ],
    );
    core.run_controller_session(pad.into());

    let status = core.get_status();
    assert!((status.servos.speed - 0.8).abs() < 1e-6);
    assert_eq!(status.servos.channels[0].angle, 162);
}

#[test]
fn test_exit_double_press_stops_and_exits() {
    let core = core();
    let pad = ScriptedInputDriver::new(
        XBOX,
        [
            InputEvent::press(316),
            InputEvent::release(316),
            InputEvent::press(316),
            InputEvent::axis(0, 32767),
        ],
    );
    core.run_controller_session(pad.into());

    let signal = core.shutdown_signal();
    assert!(signal.is_exiting());
    assert_eq!(signal.source(), Some(StopSource::Controller));
    assert!(signal.has_rested());
    assert_eq!(pulse(&core, 0), (0, 0));

    let status = core.get_status();
    assert!(status.servos.stopped);
    assert_eq!(status.servos.channels[0].angle, 90);
    assert!(!status.hardware.controller.connected);
}

#[test]
fn test_single_exit_press_only_arms() {
    let core = core();
    let pad = ScriptedInputDriver::new(XBOX, [InputEvent::press(316)]);
    core.run_controller_session(pad.into());
    assert!(!core.is_stopping());

    // Session ended with the stream, so the armed state was discarded
    assert_eq!(core.get_status().hardware.controller.exit, ExitPhase::Idle);
}

#[test]
fn test_device_loss_keeps_core_running() {
    let core = core();
    let pad = ScriptedInputDriver::new(PS3, [InputEvent::axis(0, -32767)]).lose_at_end();
    core.run_controller_session(pad.into());

    let status = core.get_status();
    assert_eq!(status.servos.channels[0].angle, 0);
    assert!(!status.hardware.controller.connected);
    assert_eq!(status.hardware.controller.kind, ControllerKind::None);
    assert!(!core.is_stopping());
    assert!(core.set_channel_angle(0, 90).is_ok());
}

#[test]
fn test_controller_loop_reconnects_until_stopped() {
    let core = core();
    let attempts = Cell::new(0);
    let connect = || -> JoyservoResult<Option<InputDriver>> {
        attempts.set(attempts.get() + 1);
        match attempts.get() {
            1 => Ok(Some(
                ScriptedInputDriver::new(XBOX, [InputEvent::press(305)]).into(),
            )),
            2 => Err(JoyservoError::NotFound("/dev/input/event9".to_string())),
            _ => {
                core.request_stop(StopSource::Api);
                Ok(None)
            }
        }
    };
    core.run_controller_loop(connect, Some(Duration::from_millis(5)));

    assert_eq!(attempts.get(), 3);
    assert!(core.get_status().servos.channels[1].hold);
}

#[test]
fn test_stop_is_idempotent() {
    let core = core();
    let writes = || {
        core.servos()
            .lock()
            .driver()
            .as_simulation()
            .map(|sim| sim.write_count())
            .unwrap()
    };

    assert!(core.request_stop(StopSource::Api));
    let after_first = writes();
    assert!(!core.request_stop(StopSource::Api));
    assert!(!core.request_stop(StopSource::Signal));
    assert_eq!(writes(), after_first);

    assert_eq!(core.shutdown_signal().source(), Some(StopSource::Api));
    assert!(core.shutdown_signal().is_exiting());
    assert!(matches!(
        core.set_channel_angle(0, 10),
        Err(JoyservoError::Stopped)
    ));
}

#[test]
fn test_sensor_falls_back_after_repeated_failures() {
    let hardware = ProbedHardware {
        imu: Some(ImuDriver::simulation()),
        mpu_bus: Some(1),
        ..ProbedHardware::simulated()
    };
    let core = ServoCore::new(
        quiet_config(),
        hardware,
        None,
        Arc::new(ShutdownSignal::new()),
    );

    core.update_tick();
    let status = core.get_status();
    assert!(status.sensor.connected);
    assert_eq!(status.sensor.source, SensorSource::Device);
    assert_eq!(status.hardware.mpu.bus, Some(1));

    core.sampler()
        .lock()
        .device_mut()
        .and_then(|d| d.as_simulation_mut())
        .unwrap()
        .set_fail_reads(true);

    core.update_tick();
    let status = core.get_status();
    assert!(status.sensor.stale);
    assert!(status.sensor.connected);

    for _ in 0..9 {
        core.update_tick();
    }
    let status = core.get_status();
    assert!(!status.sensor.connected);
    assert!(!status.sensor.stale);
    assert_eq!(status.sensor.source, SensorSource::Synthetic);
    assert_eq!(status.hardware.mpu.bus, None);
}

#[test]
fn test_snapshots_persist_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = LogStore::open(dir.path().join("servo_log.jsonl")).unwrap();
    let core = ServoCore::new(
        quiet_config(),
        ProbedHardware::simulated(),
        Some(store),
        Arc::new(ShutdownSignal::new()),
    );

    core.persist_snapshot();
    core.set_channel_angle(0, 45).unwrap();
    core.persist_snapshot();

    let logs = core.recent_logs(Some(1)).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, 2);
    assert_eq!(logs[0].servos.channels[0].angle, 45);
    assert_eq!(core.recent_logs(None).unwrap().len(), 2);
}

#[test]
fn test_logs_unavailable_without_store() {
    let core = core();
    assert!(matches!(
        core.recent_logs(None),
        Err(JoyservoError::NotFound(_))
    ));
}

#[test]
fn test_update_loop_exits_on_stop() {
    let mut config = quiet_config();
    config.runtime.tick_ms = 5;
    let core = Arc::new(ServoCore::simulated(config));
    let handle = core.spawn_update_loop().unwrap();

    std::thread::sleep(Duration::from_millis(30));
    core.request_stop(StopSource::Signal);
    handle.join().unwrap();
    assert!(core.shutdown_signal().has_rested());
}
