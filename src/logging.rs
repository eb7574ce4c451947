//! Log sink for the binary: every record goes to stderr and is appended to a
//! log file, formatted as `timestamp | LEVEL | message`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes each buffer to stderr and to the log file, flushing both so a
/// killed run keeps everything logged so far.
pub struct TeeWriter {
    stderr: io::Stderr,
    file: Option<File>,
}

impl TeeWriter {
    /// Opens `path` in append mode; `None` logs to stderr only.
    pub fn new(path: Option<&Path>) -> io::Result<Self> {
        let file = match path {
            Some(p) => Some(OpenOptions::new().create(true).append(true).open(p)?),
            None => None,
        };
        Ok(TeeWriter { stderr: io::stderr(), file })
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stderr.write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        self.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stderr.flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Installs the global logger. `RUST_LOG` overrides the default `info`
/// level. Fails if a logger is already installed.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let writer = TeeWriter::new(log_file)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    )
    .format(|buf, record| {
        writeln!(buf, "{} | {} | {}", buf.timestamp_millis(), record.level(), record.args())
    })
    .write_style(env_logger::WriteStyle::Never)
    .target(env_logger::Target::Pipe(Box::new(writer)))
    .try_init()
    .map_err(io::Error::other)
}
