//! sigsift - find out what a file really is
//!
//! sigsift inspects a file's bytes rather than its name. It reports the type
//! the header claims, every other known signature hiding further in, and how
//! random the content looks, then says whether the combination is suspicious.
//!
//! # Overview
//!
//! Renaming `payload.exe` to `invoice.pdf` changes nothing about its content:
//! it still starts with `MZ`. Appending a ZIP archive to a JPEG still leaves a
//! `PK\x03\x04` in the middle of the image. Encrypting a file pushes its byte
//! distribution towards uniform. Each of these leaves a trace that does not
//! need a format parser to see.
//!
//! # Detection Methods
//!
//! 1. **Header signature**: the first 64 bytes are matched against a table of
//!    magic numbers. A mismatch with the extension, or no match at all, is
//!    suspicious.
//!
//! 2. **Embedded signatures**: the whole file is searched for every magic
//!    number at every offset. Hits past offset 0 point at concatenated,
//!    polyglot or hidden files.
//!
//! 3. **Entropy**: Shannon entropy above 7 bits per byte suggests encrypted,
//!    compressed or packed content.
//!
//! # Quick Start
//!
//! ```no_run
//! use sigsift::Analyzer;
//!
//! let analyzer = Analyzer::new();
//! let report = analyzer.analyze("invoice.pdf").expect("file exists");
//!
//! if report.suspicious {
//!     for reason in &report.reasons {
//!         println!("- {}", reason);
//!     }
//! }
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`signature`]: magic number table, header detection and embedded scanning
//! - [`analyzer`]: entropy, suspicion rules and the [`Analyzer`] itself
//! - [`report`]: output formatters (JSON, CSV, HTML)
//! - [`hashing`]: digest-based comparison of two files

pub mod analyzer;
pub mod batch;
pub mod config;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod report;
pub mod serve;
pub mod signature;

pub use analyzer::{Analyzer, Report};
pub use config::Config;
pub use error::{Error, Result};
pub use signature::{Detection, SignatureDb};
