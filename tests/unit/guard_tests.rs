use std::{
    panic,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use master_backup::{
    guard::{with_lock, ExclusivityGuard},
    Error,
};
use tempfile::tempdir;

#[test]
fn acquire_creates_empty_marker_and_drop_removes_it() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let lock = dir.path().join("run.lock");

    let guard = ExclusivityGuard::acquire(&lock)?;
    assert_eq!(guard.path(), lock.as_path());
    assert_eq!(std::fs::metadata(&lock)?.len(), 0);

    drop(guard);
    assert!(!lock.exists());
    Ok(())
}

#[test]
fn second_acquire_fails_fast_and_keeps_foreign_marker() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let lock = dir.path().join("run.lock");

    let _held = ExclusivityGuard::acquire(&lock)?;
    let err = ExclusivityGuard::acquire(&lock).expect_err("second run must be rejected");
    match err.downcast_ref::<Error>() {
        Some(Error::AlreadyRunning(path)) => assert!(path.ends_with("run.lock")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("remove"));

    // The rejected attempt must not have removed the holder's marker.
    assert!(lock.exists());
    Ok(())
}

#[test]
fn with_lock_releases_on_success_error_and_panic() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let lock = dir.path().join("run.lock");

    let value = with_lock(&lock, || {
        assert!(lock.exists());
        Ok(7)
    })?;
    assert_eq!(value, 7);
    assert!(!lock.exists());

    let err = with_lock(&lock, || -> master_backup::Result<()> {
        Err(Error::Cli("boom".into()).into())
    })
    .expect_err("inner error propagates");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Cli(_))));
    assert!(!lock.exists());

    let lock_for_panic = lock.clone();
    let outcome = panic::catch_unwind(move || {
        let _ = with_lock(&lock_for_panic, || -> master_backup::Result<()> {
            panic!("fault inside guarded run")
        });
    });
    assert!(outcome.is_err());
    assert!(!lock.exists());
    Ok(())
}

#[test]
fn missing_parent_directory_is_an_io_error() {
    let dir = tempdir().unwrap();
    let lock = dir.path().join("absent").join("run.lock");
    let err = ExclusivityGuard::acquire(&lock).expect_err("cannot create marker");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io(_))));
}

#[test]
fn concurrent_attempts_never_overlap() {
    let dir = tempdir().unwrap();
    let lock = Arc::new(dir.path().join("run.lock"));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let holders = Arc::new(AtomicUsize::new(0));
    let max_holders = Arc::new(AtomicUsize::new(0));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            let holders = Arc::clone(&holders);
            let max_holders = Arc::clone(&max_holders);
            let wins = Arc::clone(&wins);
            thread::spawn(move || {
                barrier.wait();
                if let Ok(_guard) = ExclusivityGuard::acquire(lock.as_path()) {
                    wins.fetch_add(1, Ordering::SeqCst);
                    let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                    max_holders.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    holders.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(wins.load(Ordering::SeqCst) >= 1);
    assert_eq!(max_holders.load(Ordering::SeqCst), 1);
    assert!(!lock.exists());
}
