//! Core analysis engine
//!
//! [`Analyzer`] reads a file once and runs three independent checks over it:
//!
//! - header detection against the signature table ([`SignatureDb::detect_header`])
//! - embedded signature scan over the whole content ([`SignatureDb::scan`])
//! - Shannon entropy of the whole content ([`entropy::shannon_entropy`])
//!
//! [`verdict::synthesize`] then folds the results and the claimed extension
//! into a [`Report`].
//!
//! Files smaller than the stream threshold are read into memory and the scan
//! and entropy passes run side by side on the shared buffer. Larger files are
//! read in chunks; the report is the same either way.

pub mod entropy;
pub mod verdict;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::signature::{Detection, ScanOutcome, SignatureDb, StreamScanner};
use entropy::Histogram;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use verdict::{Evidence, NO_EXTENSION};

/// Outcome of analyzing one file
///
/// Field names are part of the output format; downstream tools key on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub file: String,
    /// Claimed extension, lower-cased, or `"(none)"`
    pub extension: String,
    pub header_hex: String,
    pub detected_signature: Vec<String>,
    /// Every signature hit, including the header at offset 0
    pub embedded_signatures: Vec<Detection>,
    pub entropy: f64,
    pub suspicious: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    pub config: Config,
    db: &'static SignatureDb,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            db: SignatureDb::builtin(),
        }
    }

    pub fn with_header_len(mut self, len: usize) -> Self {
        self.config.header_len = len;
        self
    }

    pub fn with_entropy_threshold(mut self, threshold: f64) -> Self {
        self.config.entropy_threshold = threshold;
        self
    }

    pub fn with_max_embedded(mut self, max: Option<usize>) -> Self {
        self.config.max_embedded = max;
        self
    }

    pub fn with_stream_threshold(mut self, bytes: u64) -> Self {
        self.config.stream_threshold = bytes;
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    pub fn signatures(&self) -> &SignatureDb {
        self.db
    }

    /// Analyze a file on disk
    ///
    /// Fails when `path` is not a readable regular file, or when the
    /// configuration is out of range.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<Report> {
        self.config.validate()?;
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
        if !meta.is_file() {
            return Err(Error::not_found(path));
        }

        let report = if meta.len() >= self.config.stream_threshold {
            debug!(file = %path.display(), size = meta.len(), "streaming");
            self.analyze_stream(path)?
        } else {
            let data = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
            self.report_bytes(path, &data)
        };

        info!(
            file = %report.file,
            suspicious = report.suspicious,
            reasons = report.reasons.len(),
            "analyzed"
        );
        Ok(report)
    }

    /// Analyze content already in memory; `path` supplies the name and extension
    pub fn analyze_bytes<P: AsRef<Path>>(&self, path: P, data: &[u8]) -> Result<Report> {
        self.config.validate()?;
        Ok(self.report_bytes(path.as_ref(), data))
    }

    fn report_bytes(&self, path: &Path, data: &[u8]) -> Report {
        let header = &data[..data.len().min(self.config.header_len)];
        let (scan, entropy) = rayon::join(
            || self.db.scan_limited(data, self.config.max_embedded),
            || entropy::shannon_entropy(data),
        );
        self.build_report(path, header, scan, entropy)
    }

    fn analyze_stream(&self, path: &Path) -> Result<Report> {
        let mut file = File::open(path).map_err(|e| Error::unreadable(path, e))?;

        let chunk_size = self.config.chunk_size.max(self.db.max_signature_len()).max(1);
        let mut buf = vec![0u8; chunk_size];
        let mut header = Vec::with_capacity(self.config.header_len.min(chunk_size));
        let mut scanner = StreamScanner::with_limit(self.db, self.config.max_embedded);
        let mut histogram = Histogram::new();

        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::unreadable(path, e)),
            };
            let chunk = &buf[..n];

            if header.len() < self.config.header_len {
                let want = (self.config.header_len - header.len()).min(n);
                header.extend_from_slice(&chunk[..want]);
            }
            scanner.feed(chunk);
            histogram.update(chunk);
        }

        debug!(bytes = scanner.consumed(), "stream complete");
        let found = scanner.found();
        let scan = ScanOutcome {
            detections: scanner.finish(),
            found,
        };
        Ok(self.build_report(path, &header, scan, histogram.entropy()))
    }

    fn build_report(&self, path: &Path, header: &[u8], scan: ScanOutcome, entropy: f64) -> Report {
        let detected = self.db.detect_header(header);
        let embedded = scan.detections;

        if scan.found > embedded.len() as u64 {
            warn!(
                file = %path.display(),
                found = scan.found,
                kept = embedded.len(),
                "embedded detections truncated"
            );
        }

        let extension = declared_extension(path);
        let verdict = verdict::synthesize(&Evidence {
            extension: &extension,
            detected: &detected,
            embedded: &embedded,
            entropy,
            entropy_threshold: self.config.entropy_threshold,
        });
        debug!(
            detected = ?detected,
            embedded = embedded.len(),
            entropy,
            "evidence collected"
        );

        Report {
            file: path.display().to_string(),
            extension: if extension.is_empty() {
                NO_EXTENSION.to_string()
            } else {
                extension
            },
            header_hex: header_hex(header),
            detected_signature: detected,
            embedded_signatures: embedded,
            entropy,
            suspicious: verdict.suspicious,
            reasons: verdict.reasons,
        }
    }
}

/// Extension after the last dot, lower-cased; empty when there is none
pub fn declared_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Upper-case hex bytes separated by single spaces, e.g. `FF D8 FF`
pub fn header_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
