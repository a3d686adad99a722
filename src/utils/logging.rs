//! Logger initialisation and timing helpers.

use color_eyre::eyre::{bail, Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Writer duplicating every log record to stderr and a file
pub struct Tee {
    file: File,
}

impl Tee {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Path of a configured log file inside the log directory
pub fn log_file_path(log_dir: &Path, file_name: &str) -> PathBuf {
    log_dir.join(file_name)
}

/// Create the log file, refusing to clobber an existing one unless `force`
pub fn open_log_file(path: &Path, force: bool) -> Result<File> {
    if path.exists() && !force {
        bail!(
            "Log file {} already exists, pass --force to overwrite it",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))
}

/// Initialise the global logger.
///
/// `RUST_LOG` takes precedence over `level`. With a log file, every record is
/// written to both stderr and the file.
pub fn init_logger(level: &str, log_file: Option<File>) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    if let Some(file) = log_file {
        builder.target(Target::Pipe(Box::new(Tee::new(file))));
    }
    builder.try_init().wrap_err("Failed to initialise logger")?;
    Ok(())
}

/// Run `f` and measure its wall-clock time
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tee_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tee.log");

        let mut tee = Tee::new(File::create(&path).unwrap());
        tee.write_all(b"round 1\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "round 1\n");
    }

    #[test]
    fn test_open_log_file_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = log_file_path(&dir.path().join("logs"), "run.log");

        open_log_file(&path, false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "previous").unwrap();

        let err = open_log_file(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");

        open_log_file(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_timed_returns_value() {
        let (value, elapsed) = timed(|| 6 * 7);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(5));
    }
}
