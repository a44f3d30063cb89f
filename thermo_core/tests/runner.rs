use std::sync::atomic::AtomicBool;
use std::time::Duration;
use thermo_core::mocks::{FixedContact, RecordingActuator, ScriptedSensor};
use thermo_core::{Mode, Params, RoomSample, Trigger, ZoneController, ZoneRunner};
use thermo_sim::{SimParams, Simulation};
use thermo_traits::{Clock, ManualClock};

fn controller() -> ZoneController {
    ZoneController::new(Params::default()).unwrap()
}

#[test]
fn heats_a_cold_simulated_room_without_a_send_storm() {
    let clock = ManualClock::new();
    let sim = Simulation::new(SimParams::default(), clock.clone());
    let mut runner = ZoneRunner::new(controller(), sim.sensor(), sim.actuator(), clock, 21.0)
        .with_contact(Box::new(sim.window()));

    for _ in 0..(6 * 60) {
        runner.handle(Trigger::Tick).unwrap();
        sim.advance(Duration::from_secs(60)).unwrap();
    }

    let room = sim.room_c().unwrap();
    assert!(room > 19.5, "room only reached {room}");
    let stats = runner.stats();
    assert_eq!(stats.cycles, 360);
    assert_eq!(stats.send_failures, 0);
    assert!(stats.commands_sent > 0);
    assert!(stats.commands_sent < stats.cycles / 2, "{stats:?}");
}

#[test]
fn window_trigger_reaches_the_controller() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new((0..20).map(|i| Some(RoomSample::new(21.0, i * 60_000))));
    let mut p = Params::default();
    p.window.open_delay_ms = 0;
    let ctl = ZoneController::new(p).unwrap();
    let mut runner = ZoneRunner::new(ctl, sensor, RecordingActuator::default(), clock.clone(), 21.0);

    runner.handle(Trigger::Tick).unwrap();
    clock.advance(Duration::from_secs(60));
    let d = runner.handle(Trigger::WindowChanged(true)).unwrap().unwrap();
    assert!(d.diagnostics.window_forced);
    assert_eq!(runner.actuator().sent.last().copied(), Some(5.0));
}

#[test]
fn polled_contact_overrides_trigger_state() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new([Some(RoomSample::new(21.0, 0))]);
    let mut p = Params::default();
    p.window.open_delay_ms = 0;
    let ctl = ZoneController::new(p).unwrap();
    let mut runner = ZoneRunner::new(ctl, sensor, RecordingActuator::default(), clock, 21.0)
        .with_contact(Box::new(FixedContact(true)));
    let d = runner.handle(Trigger::Tick).unwrap().unwrap();
    assert!(d.diagnostics.window_forced);
}

#[test]
fn actuator_failures_are_counted_not_fatal() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new([Some(RoomSample::new(19.0, 0))]);
    let actuator = RecordingActuator {
        fail: true,
        ..RecordingActuator::default()
    };
    let mut runner = ZoneRunner::new(controller(), sensor, actuator, clock, 21.0);
    let d = runner.handle(Trigger::Tick).unwrap().unwrap();
    assert!(d.command.is_some());
    assert_eq!(runner.stats().send_failures, 1);
    assert_eq!(runner.stats().commands_sent, 0);
}

#[test]
fn setpoint_and_hvac_triggers_update_inputs() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new([Some(RoomSample::new(20.0, 0)), None]);
    let mut runner = ZoneRunner::new(controller(), sensor, RecordingActuator::default(), clock.clone(), 20.0);
    let d = runner.handle(Trigger::SetpointChanged(22.0)).unwrap().unwrap();
    assert_eq!(d.mode, Mode::Boost);
    clock.advance(Duration::from_secs(30));
    let d = runner.handle(Trigger::HvacChanged(false)).unwrap().unwrap();
    assert_eq!(d.mode, Mode::Coast);
    assert!(runner.handle(Trigger::Shutdown).unwrap().is_none());
}

#[test]
fn run_drains_channel_until_shutdown() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new((0..3).map(|i| Some(RoomSample::new(20.5, i))));
    let mut runner = ZoneRunner::new(controller(), sensor, RecordingActuator::default(), clock.clone(), 21.0);
    let (tx, rx) = crossbeam_channel::unbounded();
    for _ in 0..3 {
        tx.send(Trigger::Tick).unwrap();
    }
    tx.send(Trigger::Shutdown).unwrap();
    tx.send(Trigger::Tick).unwrap();
    let stats = runner.run(&rx, &AtomicBool::new(false));
    assert_eq!(stats.cycles, 3);
    assert_eq!(runner.now_ms(), clock.ms_since(clock.origin()));
}

#[test]
fn run_honours_shutdown_flag() {
    let clock = ManualClock::new();
    let mut runner = ZoneRunner::new(
        controller(),
        ScriptedSensor::default(),
        RecordingActuator::default(),
        clock,
        21.0,
    );
    let (tx, rx) = crossbeam_channel::unbounded();
    tx.send(Trigger::Tick).unwrap();
    let stats = runner.run(&rx, &AtomicBool::new(true));
    assert_eq!(stats.cycles, 0);
}
