//! Tests for `src/logging.rs`.

use mailgate::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber per process; a later install returns Err,
    // but the directory is created either way.
    let _result = mailgate::logging::init_production(&logs_dir, "debug");
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn init_production_fails_on_unusable_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, "file").expect("should write blocker file");

    let result = mailgate::logging::init_production(&blocker.join("logs"), "info");
    assert!(result.is_err());
}

#[test]
fn init_cli_is_idempotent() {
    mailgate::logging::init_cli("warn");
    mailgate::logging::init_cli("debug");
    tracing::info!("still logging after repeated init");
}
