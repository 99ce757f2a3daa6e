use pretty_assertions::assert_eq;
use vkgl_cmd::Opcode;
use vkgl_gl::consts::{INVALID_OPERATION, OUT_OF_MEMORY};
use vkgl_gl::RecordingGl;
use vkgl_runtime::{CommandBuffer, Device, DeviceConfig, DriverError, Error, ReplayEvent};

fn device(check_errors: bool) -> (Device, RecordingGl) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let gl = RecordingGl::new();
    let config = DeviceConfig {
        check_errors,
        ..DeviceConfig::default()
    };
    (Device::new(Box::new(gl.clone()), config), gl)
}

fn line_width_change(device: &Device) -> CommandBuffer {
    let mut cb = device.create_command_buffer();
    cb.begin().unwrap();
    cb.set_line_width(2.0).unwrap();
    cb.set_line_width(3.0).unwrap();
    cb.end().unwrap();
    cb
}

#[test]
fn checked_replay_attributes_errors_to_instructions() {
    let (device, gl) = device(true);
    let cb = line_width_change(&device);
    gl.inject_error(INVALID_OPERATION);

    let report = device.queue().submit(&[&cb], None).unwrap();
    let raised = DriverError {
        code: INVALID_OPERATION,
        opcode: Some(Opcode::SetLineWidth),
        at: Some(0),
    };
    assert_eq!(report.replays[0].events, vec![ReplayEvent::DriverError(raised.clone())]);
    // The failing instruction does not stop the rest of the list.
    assert_eq!(report.instructions_replayed(), 2);

    assert_eq!(device.check_status(), Err(Error::Driver(raised)));
    assert_eq!(device.check_status(), Ok(()));
    assert_eq!(device.stats().driver_errors, 1);
}

#[test]
fn only_the_first_replay_error_stays_pending() {
    let (device, gl) = device(true);
    let cb = line_width_change(&device);
    gl.inject_error(INVALID_OPERATION);
    gl.inject_error(OUT_OF_MEMORY);

    let report = device.queue().submit(&[&cb], None).unwrap();
    assert_eq!(report.replays[0].events.len(), 2);
    assert_eq!(device.stats().driver_errors, 2);

    match device.check_status() {
        Err(Error::Driver(err)) => assert_eq!(err.code, INVALID_OPERATION),
        other => panic!("unexpected status {other:?}"),
    }
}

#[test]
fn unchecked_replay_defers_errors_to_status_queries() {
    let (device, gl) = device(false);
    let cb = line_width_change(&device);
    gl.inject_error(OUT_OF_MEMORY);

    let report = device.queue().submit(&[&cb], None).unwrap();
    assert!(report.is_ok(), "{report:?}");

    assert_eq!(
        device.check_status(),
        Err(Error::Driver(DriverError {
            code: OUT_OF_MEMORY,
            opcode: None,
            at: None,
        }))
    );
    assert_eq!(device.stats().driver_errors, 1);
}

#[test]
fn fence_waits_surface_pending_errors() {
    let (device, gl) = device(true);
    let cb = line_width_change(&device);
    let fence = device.create_fence(false);
    gl.inject_error(INVALID_OPERATION);

    device.queue().submit(&[&cb], Some(&fence)).unwrap();
    assert!(matches!(
        device.wait_for_fence(&fence, u64::MAX),
        Err(Error::Driver(DriverError {
            code: INVALID_OPERATION,
            ..
        }))
    ));
    // The error is reported once; the fence itself still signals.
    assert!(device.wait_for_fence(&fence, u64::MAX).unwrap());
}

#[test]
fn driver_errors_render_with_their_instruction() {
    let err = DriverError {
        code: INVALID_OPERATION,
        opcode: Some(Opcode::SetLineWidth),
        at: Some(4),
    };
    assert_eq!(
        err.to_string(),
        "target error 0x0502 at instruction 4 (SetLineWidth)"
    );
    let bare = DriverError {
        code: OUT_OF_MEMORY,
        opcode: None,
        at: None,
    };
    assert_eq!(bare.to_string(), "target error 0x0505");
}
