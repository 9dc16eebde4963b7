use crate::domain::payment::PaymentStatusView;
use crate::error::Result;
use std::io::Write;

/// Writes payment status views as JSON, one document per line.
pub struct StatusWriter<W: Write> {
    writer: W,
}

impl<W: Write> StatusWriter<W> {
    /// Creates a new `StatusWriter` over any `Write` sink (e.g., Stdout, a Vec).
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_status(&mut self, status: &PaymentStatusView) -> Result<()> {
        serde_json::to_writer(&mut self.writer, status)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
