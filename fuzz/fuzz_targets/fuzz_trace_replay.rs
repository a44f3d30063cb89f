#![no_main]
use libfuzzer_sys::fuzz_target;
use thermo_core::{CycleInputs, Params, RoomReading, RoomSample, ZoneController};

fuzz_target!(|data: &[u8]| {
    let Ok(rows) = thermo_config::parse_trace_csv(data) else {
        return;
    };
    let Ok(mut ctl) = ZoneController::new(Params::default()) else {
        return;
    };
    let p = ctl.params().clone();
    for row in rows {
        let room = row.room_c.map_or(RoomReading::Unavailable, |t| {
            RoomReading::Fresh(RoomSample::new(t, row.timestamp_ms))
        });
        let inp = CycleInputs::new(row.timestamp_ms, room, row.setpoint_c)
            .with_hvac(row.hvac_on)
            .with_window(row.window_open)
            .with_actuator(row.actuator_c);
        // Rejected cycles leave the controller usable.
        let Ok(d) = ctl.evaluate(&inp) else {
            continue;
        };
        if let Some(cmd) = d.command {
            assert!(cmd.target_c.is_finite());
            assert!(cmd.target_c >= p.actuator.min_c - 1e-9);
            assert!(cmd.target_c <= p.actuator.max_c + 1e-9);
        }
    }
});
