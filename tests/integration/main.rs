//! Uses the single integration test approach.
//!
//! This improves parallelism when running the tests, and reduces the number of binaries that have to be built (and linked)
#![cfg(unix)]

mod common;
mod lock;

use std::process::Command;

use common::App;

#[test]
fn web_mode_initializes_then_replaces_itself_with_the_server() {
    let app = App::with_key();

    let mut child = app.spawn(&["--port=9000", "--workers=3"]);
    let pid = child.0.id();
    let status = child.0.wait().expect("failed to wait on appinit");

    assert!(status.success(), "appinit exited with {status}");
    assert_eq!(app.steps(), ["migrate", "optimize"]);
    assert_eq!(
        app.dispatched().as_deref(),
        Some(format!("{pid} web 0.0.0.0 9000 3").as_str()),
        "server should run in the appinit process itself"
    );
    assert!(!app.lock_path().exists(), "lock must be released");
    for dir in [
        "app/public",
        "framework/cache",
        "framework/sessions",
        "framework/testing",
        "framework/views",
        "logs",
    ] {
        assert!(app.path("storage").join(dir).is_dir(), "storage/{dir} missing");
    }
}

#[test]
fn queue_mode_hands_queue_and_worker_name_to_the_worker() {
    let app = App::with_key();

    let output = app.run(&["queue", "--queue=emails", "--name=worker-1"]);

    assert!(output.status.success(), "appinit exited with {}", output.status);
    let dispatched = app.dispatched().expect("queue worker was not started");
    assert!(
        dispatched.ends_with("queue emails worker-1"),
        "unexpected worker invocation: {dispatched}"
    );
    assert_eq!(app.steps(), ["migrate", "optimize"]);
}

#[test]
fn env_file_is_created_from_template() {
    let app = App::without_key();
    std::fs::write(app.path(".env.example"), "APP_KEY=base64:dGVzdA==\n").unwrap();

    let output = app.run(&[]);

    assert!(output.status.success(), "appinit exited with {}", output.status);
    assert_eq!(
        std::fs::read_to_string(app.path(".env")).unwrap(),
        "APP_KEY=base64:dGVzdA==\n"
    );
}

#[test]
fn missing_key_exits_with_one_and_shows_a_generated_key() {
    let app = App::without_key();

    let output = app.run(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("APP_KEY=base64:"),
        "generated key should be displayed, got: {stdout}"
    );
    assert!(app.steps().is_empty(), "nothing may run without a key");
    assert_eq!(app.dispatched(), None);
    assert!(!app.lock_path().exists(), "lock must be released on abort");
}

#[test]
fn key_from_process_environment_is_accepted() {
    let app = App::without_key();

    let status = app
        .command(&[])
        .env("APP_KEY", "base64:dGVzdA==")
        .status()
        .expect("failed to run appinit");

    assert!(status.success(), "appinit exited with {status}");
    assert_eq!(app.steps(), ["migrate", "optimize"]);
}

#[test]
fn failing_migration_propagates_its_exit_code() {
    let app = App::with_key();
    app.write_config("exit 5");

    let output = app.run(&[]);

    assert_eq!(output.status.code(), Some(5));
    assert!(app.steps().is_empty(), "cache build must not run");
    assert_eq!(app.dispatched(), None);
    assert!(!app.lock_path().exists(), "lock must be released on failure");
}

#[test]
fn rerun_on_initialized_storage_succeeds() {
    let app = App::with_key();

    assert!(app.run(&[]).status.success());
    assert!(app.run(&[]).status.success());

    assert_eq!(app.steps(), ["migrate", "optimize", "migrate", "optimize"]);
}

#[test]
fn key_generate_prints_a_key() {
    let output = Command::new(env!("CARGO_BIN_EXE_appinit"))
        .arg("key-generate")
        .output()
        .expect("failed to run appinit");

    assert!(output.status.success());
    let key = String::from_utf8(output.stdout).unwrap();
    assert!(key.trim().starts_with("base64:"), "unexpected key: {key}");
}
