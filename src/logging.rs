use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// `$HOME/.local/share/pulsestep/logs`
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("pulsestep")
        .join("logs"))
}

/// Logs at `level` to `app.log` in [`log_dir`], and warnings and errors to
/// the terminal. Fails if a logger is already installed.
pub fn init_logger(level: LevelFilter) -> Result<PathBuf, Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("app.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .build();

    CombinedLogger::init(vec![
        WriteLogger::new(level, file_config, log_file),
        TermLogger::new(
            LevelFilter::Warn,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    ])
    .map_err(|e| Error::new(ErrorKind::Other, format!("Logger initialization failed: {}", e)))?;

    Ok(log_path)
}
