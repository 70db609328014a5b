//! Best-effort record sinks.

use crate::error::TransportError;
use crate::summary::SessionSummary;
use spanav_core::TrialRecord;
use std::io::Write;

/// Receives each completed trial (practice included) and the final summary.
/// Failures are logged by the session and never interrupt it.
pub trait Transport {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), TransportError>;

    fn persist_summary(&mut self, _summary: &SessionSummary) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn persist(&mut self, _record: &TrialRecord) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Keeps everything it is given.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    pub records: Vec<TrialRecord>,
    pub summaries: Vec<SessionSummary>,
}

impl Transport for MemoryTransport {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), TransportError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn persist_summary(&mut self, summary: &SessionSummary) -> Result<(), TransportError> {
        self.summaries.push(summary.clone());
        Ok(())
    }
}

/// One JSON object per line, flushed after each write.
pub struct JsonLinesTransport<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: serde::Serialize>(&mut self, value: &T) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Transport for JsonLinesTransport<W> {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), TransportError> {
        self.write_line(record)
    }

    fn persist_summary(&mut self, summary: &SessionSummary) -> Result<(), TransportError> {
        #[derive(serde::Serialize)]
        struct Tagged<'a> {
            summary: &'a SessionSummary,
        }
        self.write_line(&Tagged { summary })
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), TransportError> {
        (**self).persist(record)
    }

    fn persist_summary(&mut self, summary: &SessionSummary) -> Result<(), TransportError> {
        (**self).persist_summary(summary)
    }
}
