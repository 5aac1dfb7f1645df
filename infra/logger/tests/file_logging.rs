use cape_logger::{FileOutput, LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .without_console()
        .file(FileOutput::new(&log_dir).json(true))
        .level(LevelFilter::INFO)
        .init()?;

    tracing::info!(hero = "Kamala Khan", "hello from integration test");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents
        .lines()
        .find(|line| line.contains("hello from integration test"))
        .expect("event should be written");

    assert!(line.starts_with('{'), "file lines should be JSON: {line}");
    assert!(line.contains("Kamala Khan"));

    Ok(())
}
