use crate::data::{HttpMethod, Parameters, ResponseFormat};
use chrono::{DateTime, FixedOffset, Local};
use std::{
    fmt::{self, Debug, Display},
    io::{self, Write},
    sync::Mutex,
};
use tracing::warn;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    Completed { status_code: u16 },
    Failed { reason: String },
}

/// What happened to one replayed request.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub method: HttpMethod,
    pub uri: String,
    pub host: String,
    pub timestamp: DateTime<FixedOffset>,
    pub format: ResponseFormat,
    pub parameters: Parameters,
    pub started_at: DateTime<Local>,
    pub completed_at: DateTime<Local>,
    pub elapsed_ms: u128,
    pub outcome: ReplayOutcome,
}

impl Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let ReplayOutcome::Failed { reason } = &self.outcome {
            writeln!(f, "Failed to perform request. Reason: {}", reason)?;
        }
        writeln!(
            f,
            "Replayed {} \"{}\" on \"{}\" at {}",
            self.method,
            self.uri,
            self.host,
            self.timestamp.format(TIME_FORMAT)
        )?;
        writeln!(f, "Processed as {}", self.format)?;
        writeln!(f, "Parameters: {}", serde_json::Value::Object(self.parameters.clone()))?;
        write!(
            f,
            "Started at {}. Completed at {}. Taken {} ms",
            self.started_at.format(TIME_FORMAT),
            self.completed_at.format(TIME_FORMAT),
            self.elapsed_ms
        )
    }
}

/// Receives the report of every replayed request. Reports arrive from many groups at once.
pub trait ReportSink: Debug {
    fn report(&self, report: &ReplayReport);
}

/// Renders `report` followed by a blank line and hands it to `writer` in one `write_all`.
pub fn write_report<W: Write>(writer: &mut W, report: &ReplayReport) -> io::Result<()> {
    let text = format!("{}\n\n", report);
    writer.write_all(text.as_bytes())?;
    writer.flush()
}

/// Writes reports to any writer. Reports from concurrent groups never interleave.
#[derive(Debug)]
pub struct WriterReportSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Debug> ReportSink for WriterReportSink<W> {
    fn report(&self, report: &ReplayReport) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        if let Err(e) = write_report(&mut *writer, report) {
            warn!("Couldn't write the replay report: {}", e);
        }
    }
}

/// Prints reports to stdout, one whole report per write.
#[derive(Debug, Default)]
pub struct StdoutReportSink;

impl StdoutReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for StdoutReportSink {
    fn report(&self, report: &ReplayReport) {
        if let Err(e) = write_report(&mut io::stdout().lock(), report) {
            warn!("Couldn't write the replay report: {}", e);
        }
    }
}
