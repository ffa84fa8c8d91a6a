use std::io::{self, Write};

use oracle_core::model::{Category, Verdict};
use oracle_core::services::oracle::AggregateReport;
use oracle_core::services::report::ReportSink;

/// Human-readable table, one row per verdict.
pub struct TextSink<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, header_written: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self) -> io::Result<()> {
        if !self.header_written {
            writeln!(
                self.out,
                "{:<20} {:<6} {:<28} {:<18} {:>6} {:>6}  RESULT",
                "FIXTURE", "ARCH", "EXPECTED", "OBSERVED", "RATIO", "MARGIN"
            )?;
            self.header_written = true;
        }
        Ok(())
    }
}

fn join_categories(categories: &[Category]) -> String {
    categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(",")
}

impl<W: Write> ReportSink for TextSink<W> {
    fn verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
        self.header()?;
        let observed = verdict.observed.map(|c| c.as_str()).unwrap_or("-");
        writeln!(
            self.out,
            "{:<20} {:<6} {:<28} {:<18} {:>6.3} {:>6.3}  {}",
            verdict.fixture,
            verdict.architecture,
            join_categories(&verdict.expected),
            observed,
            verdict.ratio,
            verdict.margin,
            verdict.result
        )?;
        if let Some(cause) = &verdict.cause {
            writeln!(self.out, "    cause: {cause}")?;
        }
        Ok(())
    }

    fn finish(&mut self, report: &AggregateReport) -> io::Result<()> {
        if !report.skipped.is_empty() {
            writeln!(self.out, "Skipped:")?;
            for cell in &report.skipped {
                writeln!(
                    self.out,
                    "  - {} [{}]: {}",
                    cell.fixture,
                    cell.architecture,
                    cell.reason.as_str()
                )?;
            }
        }
        let summary = report.summary();
        writeln!(
            self.out,
            "Summary: {} pass, {} fail, {} ambiguous, {} skipped{}",
            summary.pass,
            summary.fail,
            summary.ambiguous,
            summary.skipped,
            if report.aborted { " (aborted)" } else { "" }
        )?;
        self.out.flush()
    }
}

/// Writes the whole report as pretty JSON once the run is finished.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn verdict(&mut self, _verdict: &Verdict) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, report: &AggregateReport) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
