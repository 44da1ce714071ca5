//! Coordination between processes sharing one storage root.

use std::{
    fs, thread,
    time::{Duration, Instant},
};

use crate::common::App;

#[test]
fn stale_lock_is_reclaimed_and_initialization_runs() {
    let app = App::with_key();
    app.hold_lock(Duration::from_secs(400));

    let started = Instant::now();
    let output = app.run(&[]);

    assert!(output.status.success(), "appinit exited with {}", output.status);
    assert!(
        started.elapsed() < Duration::from_secs(30),
        "stale lock must not be waited on"
    );
    assert_eq!(app.steps(), ["migrate", "optimize"]);
    assert!(app.dispatched().is_some());
    assert!(!app.lock_path().exists());
}

#[test]
fn waiting_process_dispatches_once_lock_is_released() {
    let app = App::with_key();
    app.hold_lock(Duration::ZERO);

    let mut child = app.spawn(&[]);
    thread::sleep(Duration::from_millis(500));
    assert_eq!(
        app.dispatched(),
        None,
        "must not dispatch while the lock is held"
    );

    fs::remove_file(app.lock_path()).unwrap();
    let status = child.0.wait().expect("failed to wait on appinit");

    assert!(status.success(), "appinit exited with {status}");
    assert!(app.dispatched().is_some(), "web server was not started");
    assert!(
        app.steps().is_empty(),
        "a waiting process must not run initialization itself"
    );
}

#[test]
fn waiting_queue_worker_is_started_too() {
    let app = App::with_key();
    app.hold_lock(Duration::ZERO);

    let mut child = app.spawn(&["queue", "--queue=emails", "--name=worker-2"]);
    thread::sleep(Duration::from_millis(300));
    fs::remove_file(app.lock_path()).unwrap();
    let status = child.0.wait().expect("failed to wait on appinit");

    assert!(status.success(), "appinit exited with {status}");
    let dispatched = app.dispatched().expect("queue worker was not started");
    assert!(dispatched.ends_with("queue emails worker-2"), "got {dispatched}");
}

#[test]
fn concurrent_replicas_initialize_once() {
    let app = App::with_key();
    // keeps the lock held until every replica has seen it
    app.write_config("sleep 2; echo migrate >> {base_path}/steps.log");

    let mut children: Vec<_> = (0..4).map(|_| app.spawn(&[])).collect();
    for child in &mut children {
        let status = child.0.wait().expect("failed to wait on appinit");
        assert!(status.success(), "appinit exited with {status}");
    }

    assert_eq!(app.steps(), ["migrate", "optimize"], "exactly one replica initializes");
    assert!(app.dispatched().is_some());
    assert!(!app.lock_path().exists(), "lock must end up released");
}
