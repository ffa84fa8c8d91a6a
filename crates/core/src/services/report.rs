//! Report sink seam: the driver hands its finished report to a sink, which
//! sees every verdict in report order followed by the whole report.

use std::io;

use crate::model::Verdict;
use crate::services::oracle::AggregateReport;

/// Consumer of a finished run. Rendering lives with the implementor.
pub trait ReportSink {
    fn verdict(&mut self, verdict: &Verdict) -> io::Result<()>;

    /// Called once after every verdict has been delivered.
    fn finish(&mut self, _report: &AggregateReport) -> io::Result<()> {
        Ok(())
    }
}

/// Feed `report` to `sink` in order.
pub fn emit(report: &AggregateReport, sink: &mut dyn ReportSink) -> io::Result<()> {
    for verdict in &report.verdicts {
        sink.verdict(verdict)?;
    }
    sink.finish(report)
}

/// Sink that keeps the verdicts in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub verdicts: Vec<Verdict>,
    pub finished: bool,
}

impl ReportSink for CollectingSink {
    fn verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
        self.verdicts.push(verdict.clone());
        Ok(())
    }

    fn finish(&mut self, _report: &AggregateReport) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}
