use std::{fs, io::Write};

use master_backup::logging::{LogContext, LogLevel};
use tempfile::tempdir;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

#[test]
fn levels_map_to_filters() {
    assert_eq!(LogLevel::default(), LogLevel::Info);
    assert_eq!(LogLevel::Debug.as_filter(), LevelFilter::DEBUG);
    assert_eq!(LogLevel::Warn.as_filter(), LevelFilter::WARN);
    assert_eq!(LogContext::detached(LogLevel::Warn).level(), LogLevel::Warn);
}

#[test]
fn run_log_receives_output_only_while_attached() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("main.log");
    let log = LogContext::detached(LogLevel::Info);
    let sink = log.sink();

    sink.make_writer().write_all(b"before\n")?;
    assert!(!log.run_log_attached());

    {
        let guard = log.attach_run_log(&path)?;
        assert_eq!(guard.path(), path.as_path());
        assert!(log.run_log_attached());
        sink.make_writer().write_all(b"during\n")?;
    }

    assert!(!log.run_log_attached());
    sink.make_writer().write_all(b"after\n")?;
    assert_eq!(fs::read_to_string(&path)?, "during\n");
    Ok(())
}

#[test]
fn reattaching_appends_to_an_existing_log() -> master_backup::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("main.log");
    let log = LogContext::detached(LogLevel::Debug);

    for line in ["first run\n", "second run\n"] {
        let _guard = log.attach_run_log(&path)?;
        log.sink().make_writer().write_all(line.as_bytes())?;
    }
    assert_eq!(fs::read_to_string(&path)?, "first run\nsecond run\n");
    Ok(())
}
