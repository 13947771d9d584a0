//! Report generation for analysis results
//!
//! Output formats, picked from the output file's extension:
//!
//! - **JSON**: array of reports, same shape as the per-file stdout output
//! - **CSV**: one row per file, for spreadsheets and bulk triage
//! - **HTML**: standalone page with summary cards and a findings table
//!
//! # Usage
//!
//! ```ignore
//! use sigsift::report;
//!
//! report::generate("findings.json", &reports)?;  // JSON
//! report::generate("findings.html", &reports)?;  // HTML
//! report::generate("findings.csv", &reports)?;   // CSV (also the fallback)
//! ```

pub mod csv;
pub mod html;
pub mod json;

use crate::analyzer::Report;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, reports: &[Report]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "html" | "htm" => html::write(&mut file, reports),
        "json" => json::write(&mut file, reports),
        _ => csv::write(&mut file, reports),
    }
}

/// Counts for a batch of reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub clean: usize,
    pub suspicious: usize,
}

impl Summary {
    pub fn from_reports(reports: &[Report]) -> Self {
        let suspicious = reports.iter().filter(|r| r.suspicious).count();
        Self {
            total: reports.len(),
            clean: reports.len() - suspicious,
            suspicious,
        }
    }
}
