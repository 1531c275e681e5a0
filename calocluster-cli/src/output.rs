//! Cluster record writers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use calocluster_core::ClusterRecord;

use crate::Result;

/// Output encoding, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Csv,
    JsonLines,
}

impl OutputFormat {
    /// CSV for a `.csv` extension (any case), JSON lines otherwise.
    pub(crate) fn from_path(path: Option<&Path>) -> Self {
        let is_csv = path
            .and_then(|p| p.extension())
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv
        } else {
            Self::JsonLines
        }
    }
}

const CSV_HEADER: &str = "event,kind,energy,x,y,z,x_rms,y_rms,z_rms,dxdz,dxdz_err,dydz,dydz_err,first_layer,last_layer,depth,n_hits";

#[derive(Serialize)]
struct Row<'a> {
    event: usize,
    #[serde(flatten)]
    record: &'a ClusterRecord,
}

/// Writes one row per cluster record, tagged with its event index.
pub(crate) struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    wrote_header: bool,
}

impl RecordWriter<Box<dyn Write>> {
    /// Opens `path` for writing, or stdout when no path is given.
    pub(crate) fn create(path: Option<&Path>) -> Result<Self> {
        let format = OutputFormat::from_path(path);
        let writer: Box<dyn Write> = match path {
            Some(p) => Box::new(BufWriter::new(File::create(p)?)),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        Ok(Self::new(writer, format))
    }
}

impl<W: Write> RecordWriter<W> {
    pub(crate) fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            wrote_header: false,
        }
    }

    /// Writes the records of one event.
    pub(crate) fn write_event(&mut self, event: usize, records: &[ClusterRecord]) -> Result<()> {
        match self.format {
            OutputFormat::Csv => self.write_csv(event, records)?,
            OutputFormat::JsonLines => self.write_json_lines(event, records)?,
        }
        Ok(())
    }

    fn write_csv(&mut self, event: usize, records: &[ClusterRecord]) -> io::Result<()> {
        if !self.wrote_header {
            writeln!(self.writer, "{CSV_HEADER}")?;
            self.wrote_header = true;
        }
        for r in records {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                event,
                if r.is_2d { "2d" } else { "3d" },
                r.energy,
                r.x,
                r.y,
                r.z,
                r.x_rms,
                r.y_rms,
                r.z_rms,
                r.dxdz,
                r.dxdz_err,
                r.dydz,
                r.dydz_err,
                r.first_layer,
                r.last_layer,
                r.depth,
                r.n_hits
            )?;
        }
        Ok(())
    }

    fn write_json_lines(&mut self, event: usize, records: &[ClusterRecord]) -> io::Result<()> {
        for record in records {
            serde_json::to_writer(&mut self.writer, &Row { event, record })?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub(crate) fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
