use std::fs::{self, File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;

use engine_logging::{engine_debug, engine_trace, engine_warn, Verbosity};
use favlens_core::RunSummary;
use tokio::sync::mpsc;

use crate::JobResult;

/// Destination for matched URLs, written one per line as they arrive.
pub trait MatchSink: Send {
    fn label(&self) -> &str;
    fn report_match(&mut self, url: &str) -> io::Result<()>;
}

/// Line-oriented sink over any writer; flushed after every match.
pub struct WriterSink<W> {
    label: String,
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(label: impl Into<String>, writer: W) -> Self {
        Self {
            label: label.into(),
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MatchSink for WriterSink<W> {
    fn label(&self) -> &str {
        &self.label
    }

    fn report_match(&mut self, url: &str) -> io::Result<()> {
        writeln!(self.writer, "{url}")?;
        self.writer.flush()
    }
}

pub fn console_sink() -> WriterSink<Stdout> {
    WriterSink::new("stdout", io::stdout())
}

/// Opens `path` for appending, creating it and any missing parent directories.
pub fn open_output_file(path: &Path) -> io::Result<WriterSink<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(WriterSink::new(path.display().to_string(), file))
}

/// Consumes the result stream, counts outcomes and forwards matches.
pub struct Aggregator {
    sinks: Vec<Box<dyn MatchSink>>,
    verbosity: Verbosity,
    summary: RunSummary,
}

impl Aggregator {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            sinks: Vec::new(),
            verbosity,
            summary: RunSummary::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn MatchSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Drains `results` until every sender is gone.
    pub async fn consume(mut self, mut results: mpsc::Receiver<JobResult>) -> RunSummary {
        while let Some(result) = results.recv().await {
            self.record(&result);
        }
        self.summary
    }

    pub fn record(&mut self, result: &JobResult) {
        self.summary.record(result.kind());
        match &result.outcome {
            Err(err) => {
                if self.verbosity.shows_job_failures() {
                    engine_warn!("Error processing {}: {}", result.url, err);
                }
            }
            Ok(verdict) if verdict.is_match => {
                for sink in &mut self.sinks {
                    if let Err(err) = sink.report_match(&result.url) {
                        engine_debug!("Failed to write match to {}: {}", sink.label(), err);
                    }
                }
            }
            Ok(_) => engine_trace!("No match for {}", result.url),
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}
