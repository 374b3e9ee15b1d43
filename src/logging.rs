//! `log` backends for the binary: stderr, or append to a file.
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use log::{LevelFilter, Log, Metadata, Record};

pub struct FileLogHandler {
    file: File,
}

impl FileLogHandler {
    pub fn new<T>(path: T) -> io::Result<Self>
    where
        T: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                eprintln!("Failed to open log file: {}", e);
                e
            })?;

        Ok(Self { file })
    }
}

pub enum LogHandler {
    Stderr,
    File(FileLogHandler),
}

impl LogHandler {
    fn write(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            Self::Stderr => io::stderr().lock().write_all(line),
            Self::File(x) => x.file.write_all(line),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stderr => io::stderr().flush(),
            Self::File(x) => x.file.flush(),
        }
    }
}

pub struct Logger {
    level: LevelFilter,
    handler: Mutex<LogHandler>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{:<5} {}] {}\n",
            record.level(),
            record.target(),
            record.args()
        );
        if let Ok(mut handler) = self.handler.lock() {
            // Nowhere left to report a failed log write.
            let _ = handler.write(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut handler) = self.handler.lock() {
            let _ = handler.flush();
        }
    }
}

/// Install the process-wide logger. Logs go to `path` if given, else stderr.
pub fn init(level: LevelFilter, path: Option<&Path>) -> io::Result<()> {
    let handler = match path {
        Some(p) => LogHandler::File(FileLogHandler::new(p)?),
        None => LogHandler::Stderr,
    };
    let logger = Logger {
        level,
        handler: Mutex::new(handler),
    };
    log::set_logger(Box::leak(Box::new(logger)))
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;
    log::set_max_level(level);
    Ok(())
}
