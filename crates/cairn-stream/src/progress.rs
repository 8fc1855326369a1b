//! Terminal progress indicator for long payload transfers.

use std::io::{self, Read, Write};

const BAR_WIDTH: usize = 20;

/// Format a byte count with a binary unit.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Single-line progress bar redrawn in place with `\r`.
///
/// Only redraws when the whole-number percentage changes. Failures writing
/// to the sink are ignored.
pub struct ProgressBar<W: Write> {
    sink: W,
    total: u64,
    current: u64,
    last_percent: Option<u8>,
    finished: bool,
}

impl<W: Write> ProgressBar<W> {
    pub fn new(sink: W, total: u64) -> Self {
        Self {
            sink,
            total,
            current: 0,
            last_percent: None,
            finished: false,
        }
    }

    /// Draw the initial 0% line.
    pub fn start(&mut self) {
        self.draw();
    }

    pub fn add(&mut self, n: u64) {
        self.current = self.current.saturating_add(n);
        self.draw();
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.current.min(self.total) * 100 / self.total) as u8
    }

    /// Draw the last state and end the line. Idempotent.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.draw();
        let _ = writeln!(self.sink);
        let _ = self.sink.flush();
    }

    fn draw(&mut self) {
        let percent = self.percent();
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        let filled = usize::from(percent) * BAR_WIDTH / 100;
        let _ = write!(
            self.sink,
            "\r[{}{}] {:>3}%  {} / {}",
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            percent,
            format_bytes(self.current),
            format_bytes(self.total),
        );
        let _ = self.sink.flush();
    }
}

impl<W: Write> Drop for ProgressBar<W> {
    fn drop(&mut self) {
        if self.last_percent.is_some() {
            self.finish();
        }
    }
}

/// Reader adapter that advances a [`ProgressBar`] as bytes pass through.
///
/// The bar is finished when the inner reader reports end of input.
pub struct ProgressReader<R: Read, W: Write> {
    inner: R,
    bar: ProgressBar<W>,
}

impl<R: Read, W: Write> ProgressReader<R, W> {
    /// Wrap `inner`, drawing the 0% line immediately.
    pub fn new(inner: R, total: u64, sink: W) -> Self {
        let mut bar = ProgressBar::new(sink, total);
        bar.start();
        Self { inner, bar }
    }

    pub fn bar(&self) -> &ProgressBar<W> {
        &self.bar
    }
}

impl<R: Read, W: Write> Read for ProgressReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.bar.finish();
        } else {
            self.bar.add(n as u64);
        }
        Ok(n)
    }
}
