use std::io::{self, Stdout, Write};

use crate::error::Result;
use crate::format::Formatter;
use crate::model::AnnotatedDocument;

use super::Exporter;

/// Prints the formatted batch, followed by a single newline.
pub struct ConsoleExporter<W: Write = Stdout> {
    formatter: Box<dyn Formatter>,
    writer: W,
}

impl ConsoleExporter<Stdout> {
    /// Exporter writing to standard output.
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        Self::with_writer(formatter, io::stdout())
    }
}

impl<W: Write> ConsoleExporter<W> {
    pub fn with_writer(formatter: Box<dyn Formatter>, writer: W) -> Self {
        Self { formatter, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Exporter for ConsoleExporter<W> {
    fn export(&mut self, docs: &[AnnotatedDocument]) -> Result<()> {
        let output = self.formatter.format(docs);
        let output = output.trim_end_matches('\n');
        if output.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{output}")?;
        self.writer.flush()?;
        Ok(())
    }
}
