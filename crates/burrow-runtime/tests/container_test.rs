//! End-to-end tests for container creation, entry, and stop.
//!
//! Tests marked "privileged" need root with `CAP_SYS_ADMIN` and only run
//! when `BURROW_E2E=1`. The others run anywhere: without privileges the
//! helpers still fork and report their failures over the error channel.
//!
//! Covered scenarios:
//! - layout creation is idempotent across repeated creates
//! - unprivileged creation surfaces the helper's `unshare` report
//! - the anchor is `sleep infinity` with the requested hostname (privileged)
//! - a joined command only sees the container's processes (privileged)
//! - container writes land in `upper`, not in the host root (privileged)
//! - overlay failures name the failed step (privileged)
//! - exit codes and signals of joined commands
//! - stop removes the anchor and later joins fail

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use burrow_common::config::ContainerConfig;
use burrow_common::error::BurrowError;
use burrow_common::types::{AnchorPid, ContainerState};
use burrow_runtime::{Container, container, exec_in_container};

fn privileged() -> bool {
    nix::unistd::geteuid().is_root() && std::env::var_os("BURROW_E2E").is_some_and(|v| v == "1")
}

fn mode(path: &Path) -> u32 {
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

// ── Creation ─────────────────────────────────────────────────────────

#[test]
fn create_twice_reuses_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ContainerConfig::new(tmp.path().join("node"), "node");

    for _ in 0..2 {
        match Container::create(&config) {
            Ok(c) => c.stop().unwrap(),
            Err(err) => assert!(err.is_child_error(), "unexpected error: {err}"),
        }
        for name in ["rootfs", "upper", "work"] {
            let dir = config.base_dir.join(name);
            assert!(dir.is_dir(), "{} missing", dir.display());
            assert_eq!(mode(&dir), 0o755);
        }
    }
}

#[test]
fn unprivileged_create_reports_unshare_failure() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let err = Container::create(&ContainerConfig::new(tmp.path(), "node")).unwrap_err();
    let BurrowError::Child { message } = err else {
        panic!("expected a child error, got {err:?}");
    };
    assert!(message.starts_with("unshare failed: "), "{message}");
    assert!(message.len() > "unshare failed: ".len());
}

#[test]
fn anchor_is_placeholder_with_hostname() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let c = Container::create(&ContainerConfig::new(tmp.path(), "sat-1-2")).unwrap();

    let cmdline = std::fs::read(format!("/proc/{}/cmdline", c.pid())).unwrap();
    assert_eq!(cmdline, b"sleep\0infinity\0");
    assert_eq!(c.state(), ContainerState::Running);
    let code = c
        .exec(["sh", "-c", r#"test "$(cat /proc/sys/kernel/hostname)" = sat-1-2"#])
        .unwrap();
    assert_eq!(code, 0);

    c.stop().unwrap();
}

#[test]
fn overlay_failure_names_the_step() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("work"), b"not a directory").unwrap();

    let err = Container::create(&ContainerConfig::new(tmp.path(), "bad")).unwrap_err();
    let BurrowError::Child { message } = err else {
        panic!("expected a child error, got {err:?}");
    };
    assert!(message.starts_with("mount overlay failed: "), "{message}");
    assert!(message.len() > "mount overlay failed: ".len());
}

// ── Isolation ────────────────────────────────────────────────────────

#[test]
fn joined_commands_see_only_container_processes() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let c = Container::create(&ContainerConfig::new(tmp.path(), "pidns")).unwrap();

    // `sh` joins but stays outside the pid namespace; its children are inside.
    // Expected: the anchor, the substitution subshell, `ls`, and `grep`.
    let code = c
        .exec([
            "sh",
            "-c",
            "test -d /proc/1 && test $(ls /proc | grep -cE '^[0-9]+$') -le 4",
        ])
        .unwrap();
    assert_eq!(code, 0);

    // The anchor is pid 1 inside but has a host pid outside; neither it nor
    // this test process may appear under the container's /proc.
    for host_pid in [std::process::id(), c.pid().as_raw().unsigned_abs()] {
        if host_pid <= 4 {
            continue;
        }
        let script = format!("test ! -e /proc/{host_pid}");
        assert_eq!(
            c.exec(["sh", "-c", script.as_str()]).unwrap(),
            0,
            "host pid {host_pid} visible in the container"
        );
    }

    c.stop().unwrap();
}

#[test]
fn container_writes_stay_in_upper() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let c = Container::create(&ContainerConfig::new(tmp.path(), "fs")).unwrap();
    let name = format!("burrow-testfile-{}", std::process::id());
    let path = format!("/{name}");

    let script = format!("echo hi > {path}");
    assert_eq!(c.exec(["sh", "-c", script.as_str()]).unwrap(), 0);
    assert_eq!(c.exec(["test", "-f", path.as_str()]).unwrap(), 0);
    assert!(!Path::new(&path).exists());
    assert!(c.base_dir().join("upper").join(&name).is_file());

    c.stop().unwrap();
}

// ── Exec ─────────────────────────────────────────────────────────────

#[test]
fn exec_into_own_namespaces_returns_exit_code() {
    // Joining our own namespaces changes nothing, but needs CAP_SYS_ADMIN.
    let me = AnchorPid::new(i32::try_from(std::process::id()).unwrap()).unwrap();
    match exec_in_container(me, ["sh", "-c", "exit 7"]) {
        Ok(code) => assert_eq!(code, 7),
        Err(BurrowError::Child { message }) => {
            assert!(message.starts_with("failed to setns: "), "{message}");
        }
        Err(err) => panic!("unexpected error: {err:?}"),
    }
}

#[test]
fn exec_reports_signals_and_codes() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let c = Container::create(&ContainerConfig::new(tmp.path(), "codes")).unwrap();

    assert_eq!(c.exec(["sh", "-c", "exit 7"]).unwrap(), 7);
    let err = c.exec(["sh", "-c", "kill -9 $$"]).unwrap_err();
    assert!(matches!(err, BurrowError::AbnormalTermination { .. }), "{err:?}");
    let err = c.exec(["/definitely/not/a/binary"]).unwrap_err();
    assert!(
        matches!(err, BurrowError::Child { ref message } if message.starts_with("failed to execvp")),
        "{err:?}"
    );

    c.stop().unwrap();
}

// ── Stop ─────────────────────────────────────────────────────────────

#[test]
fn stopped_container_cannot_be_entered() {
    if !privileged() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    let c = Container::create(&ContainerConfig::new(tmp.path(), "gone")).unwrap();
    let pid = c.pid();

    container::stop(pid).unwrap();
    assert_eq!(container::state(pid), ContainerState::Stopped);

    let err = exec_in_container(pid, ["true"]).unwrap_err();
    assert!(err.is_child_error(), "{err:?}");
    assert!(tmp.path().join("upper").is_dir());
}
