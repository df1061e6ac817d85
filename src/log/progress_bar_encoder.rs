//! Log lines written while the progress bar is drawn would otherwise leave
//! the tail of the bar on screen.

use log::Record;
use log4rs::encode::{Encode, Write};

/// Clears the current terminal line before delegating to the inner encoder.
#[derive(Debug)]
pub struct ProgressBarSafeEncoder {
    inner: Box<dyn Encode>,
}

impl ProgressBarSafeEncoder {
    pub fn new(inner: Box<dyn Encode>) -> Self {
        Self { inner }
    }
}

impl Encode for ProgressBarSafeEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> Result<(), anyhow::Error> {
        // Erase line, carriage return.
        w.write_all(b"\x1B[2K\r")?;
        self.inner.encode(w, record)
    }
}
