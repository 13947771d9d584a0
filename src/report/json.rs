//! JSON report: a pretty-printed array of per-file reports

use crate::analyzer::Report;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, reports: &[Report]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, reports)?;
    writeln!(writer)?;
    writer.flush()
}
