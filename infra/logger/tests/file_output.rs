use kw_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_output_writes_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let log_dir = tmp.path().join("var").join("log");

    let logger = Logger::builder()
        .name("kuwaiba-file")
        .console(false)
        .level(LevelFilter::INFO)
        .path(&log_dir)
        .rotation_name("never")
        .json(true)
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(class = "Router", "object created");
    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should exist");

    let content = fs::read_to_string(log_file)?;
    let line = content.lines().find(|l| l.contains("object created")).expect("line written");
    assert!(line.trim_start().starts_with('{'));
    assert!(line.contains("Router"));
    Ok(())
}
