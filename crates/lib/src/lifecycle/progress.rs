//! User-facing progress reporting.

use std::io::{self, Write};

use tracing::{debug, info};

/// Receives progress messages and the output of executed actions.
pub trait Emitter {
  /// Report a progress message.
  fn progress(&mut self, message: &str);

  /// Open a sink for the output of the work described by `message`.
  ///
  /// The sink is dropped once the work completes.
  fn open_stream(&mut self, message: &str) -> Box<dyn Write + '_>;
}

/// Emits progress as `info` events and action output as `debug` events, one
/// event per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl Emitter for TracingEmitter {
  fn progress(&mut self, message: &str) {
    info!("{}", message);
  }

  fn open_stream(&mut self, message: &str) -> Box<dyn Write + '_> {
    Box::new(LineLogger {
      label: message.to_string(),
      pending: Vec::new(),
    })
  }
}

struct LineLogger {
  label: String,
  pending: Vec<u8>,
}

impl LineLogger {
  fn emit_complete_lines(&mut self) {
    while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
      let line: Vec<u8> = self.pending.drain(..=pos).collect();
      let text = String::from_utf8_lossy(&line[..line.len() - 1]);
      debug!(action = %self.label, "{}", text.trim_end_matches('\r'));
    }
  }
}

impl Write for LineLogger {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.pending.extend_from_slice(buf);
    self.emit_complete_lines();
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl Drop for LineLogger {
  fn drop(&mut self) {
    if !self.pending.is_empty() {
      self.pending.push(b'\n');
      self.emit_complete_lines();
    }
  }
}
