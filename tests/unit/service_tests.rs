use std::{
    ffi::OsString,
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use master_backup::{
    service::{ServiceAction, ServiceControl, Systemctl},
    Error,
};
use tempfile::tempdir;

fn control_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-systemctl");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn default_control_program_is_systemctl() {
    let inv = Systemctl::default().invocation(ServiceAction::Stop, &["etcd", "kube-apiserver"]);
    let argv: Vec<OsString> = ["systemctl", "stop", "etcd", "kube-apiserver"]
        .iter()
        .map(OsString::from)
        .collect();
    assert_eq!(inv.argv(), argv.as_slice());
    assert_eq!(inv.display(), "systemctl stop etcd kube-apiserver");
}

#[test]
fn successful_action_passes_units_in_order() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let seen = dir.path().join("seen");
    let script = control_script(dir.path(), &format!("echo \"$@\" >> {}", seen.display()));

    let control = Systemctl::with_program(&script);
    control.apply(ServiceAction::Restart, &["postgresql"])?;
    control.apply(ServiceAction::Start, &["etcd", "kube-apiserver"])?;

    assert_eq!(
        fs::read_to_string(&seen)?,
        "restart postgresql\nstart etcd kube-apiserver\n"
    );
    Ok(())
}

#[test]
fn non_zero_exit_becomes_service_control_error() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let script = control_script(dir.path(), "exit 3");

    let err = Systemctl::with_program(&script)
        .apply(ServiceAction::Stop, &["etcd", "kube-apiserver"])
        .expect_err("control program failed");
    match err.downcast_ref::<Error>() {
        Some(Error::ServiceControl {
            action,
            units,
            status,
        }) => {
            assert_eq!(action, "stop");
            assert_eq!(units, "etcd kube-apiserver");
            assert!(status.contains('3'));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!Error::is_tool_failure(&err));
    Ok(())
}

#[test]
fn missing_control_program_is_an_io_error() {
    let err = Systemctl::with_program("/no/such/systemctl")
        .apply(ServiceAction::Start, &["nginx"])
        .expect_err("program missing");
    assert!(err.downcast_ref::<std::io::Error>().is_some());
}
