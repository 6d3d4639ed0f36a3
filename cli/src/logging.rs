//! Logging initialization for the CLI.
//!
//! Reads `RUST_LOG` (filter) and `LOG_FILE` (path) from env, e.g. via `.env`.
//! With `LOG_FILE` set, logs are appended there as plain text; otherwise they go
//! to stderr so stdout carries only the search result.

use std::io::Write;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::log_format::RedactingText;

/// Installs the global subscriber.
///
/// - **RUST_LOG**: filter such as `info` or `fractal=debug`. Default: `info`.
/// - **LOG_FILE**: append target; ANSI escapes are stripped.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let writer = std::sync::Mutex::new(StripAnsiWriter::new(file));
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(RedactingText::new())
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).try_init()?;
        tracing::info!(path = %path, "fractal logging to file");
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .event_format(RedactingText::new())
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
    }
    Ok(())
}

/// Drops ANSI CSI sequences (`ESC [ ... final`) so file logs stay plain text.
struct StripAnsiWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> StripAnsiWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }

    fn feed(&mut self, b: u8) -> std::io::Result<()> {
        match self.pending.len() {
            0 if b == 0x1b => self.pending.push(b),
            0 => self.inner.write_all(&[b])?,
            1 if b == b'[' => self.pending.push(b),
            1 => {
                self.pending.push(b);
                self.inner.write_all(&self.pending)?;
                self.pending.clear();
            }
            _ if (0x40..=0x7e).contains(&b) => self.pending.clear(),
            _ if b.is_ascii_digit() || matches!(b, b';' | b'?' | b':') => {
                self.pending.push(b);
                if self.pending.len() > 64 {
                    self.inner.write_all(&self.pending)?;
                    self.pending.clear();
                }
            }
            _ => {
                self.pending.push(b);
                self.inner.write_all(&self.pending)?;
                self.pending.clear();
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut plain_start = 0;
        for (i, &b) in buf.iter().enumerate() {
            if self.pending.is_empty() && b != 0x1b {
                continue;
            }
            self.inner.write_all(&buf[plain_start..i])?;
            plain_start = i + 1;
            self.feed(b)?;
        }
        self.inner.write_all(&buf[plain_start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        self.inner.flush()
    }
}
