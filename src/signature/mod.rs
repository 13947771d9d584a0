//! Magic number database and header detection
//!
//! The database is an ordered list of `(label, bytes)` signatures. Order
//! matters: it decides the order of detected labels and of embedded
//! detections, so output is deterministic run to run.
//!
//! # Built-in signatures
//!
//! | Label | Bytes |
//! |-------|-------|
//! | jpg | `FF D8 FF` |
//! | png | `89 50 4E 47` |
//! | gif | `GIF87a`, `GIF89a` |
//! | pdf | `%PDF` |
//! | zip | `PK 03 04` |
//! | exe | `MZ` |
//! | elf | `7F 45 4C 46` |
//! | mp4 | `00 00 00 18 ftyp`, `00 00 00 20 ftyp` |
//! | gz | `1F 8B 08` |
//!
//! A single [`AhoCorasick`] automaton over every signature is built with the
//! database; see [`scan`] for how it is used.

pub mod scan;

pub use scan::{ScanOutcome, StreamScanner};

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const BUILTIN: &[(&str, &[&[u8]])] = &[
    ("jpg", &[b"\xFF\xD8\xFF"]),
    ("png", &[b"\x89PNG"]),
    ("gif", &[b"GIF87a", b"GIF89a"]),
    ("pdf", &[b"%PDF"]),
    ("zip", &[b"PK\x03\x04"]),
    ("exe", &[b"MZ"]),
    ("elf", &[b"\x7FELF"]),
    ("mp4", &[b"\x00\x00\x00\x18ftyp", b"\x00\x00\x00\x20ftyp"]),
    ("gz", &[b"\x1F\x8B\x08"]),
];

/// One magic number and the file type it identifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub label: String,
    pub bytes: Vec<u8>,
}

/// Where a signature matched inside a buffer
///
/// Offset 0 is a header match; anything later is embedded or trailing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub label: String,
    pub offset: u64,
}

#[derive(Debug)]
pub struct SignatureDb {
    signatures: Vec<Signature>,
    /// Automaton pattern `i` is `signatures[i]`
    matcher: Option<AhoCorasick>,
    max_len: usize,
}

impl SignatureDb {
    /// The built-in table, constructed once per process
    pub fn builtin() -> &'static SignatureDb {
        static DB: OnceLock<SignatureDb> = OnceLock::new();
        DB.get_or_init(|| {
            Self::from_entries(BUILTIN.iter().map(|(label, sigs)| {
                (label.to_string(), sigs.iter().map(|s| s.to_vec()).collect())
            }))
        })
    }

    /// Build a database from `(label, signatures)` entries, keeping their order.
    ///
    /// Empty signatures are ignored since they would match at every offset.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Vec<u8>>)>,
    {
        let signatures: Vec<Signature> = entries
            .into_iter()
            .flat_map(|(label, sigs)| {
                sigs.into_iter()
                    .filter(|bytes| !bytes.is_empty())
                    .map(move |bytes| Signature {
                        label: label.clone(),
                        bytes,
                    })
            })
            .collect();

        let max_len = signatures.iter().map(|s| s.bytes.len()).max().unwrap_or(0);

        // Scanning falls back to a per-signature search if the automaton
        // cannot be built.
        let matcher = match AhoCorasick::new(signatures.iter().map(|s| &s.bytes)) {
            Ok(ac) => Some(ac),
            Err(e) => {
                tracing::warn!("signature automaton unavailable, using linear scan: {}", e);
                None
            }
        };

        Self {
            signatures,
            matcher,
            max_len,
        }
    }

    /// All signatures in database order
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Distinct labels in database order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for sig in &self.signatures {
            if !labels.contains(&sig.label.as_str()) {
                labels.push(&sig.label);
            }
        }
        labels
    }

    /// Every signature registered under `label`
    pub fn get(&self, label: &str) -> Vec<&[u8]> {
        self.signatures
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.bytes.as_slice())
            .collect()
    }

    /// Length of the longest signature, 0 for an empty database
    pub fn max_signature_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Labels whose signature is an exact prefix of `header`
    ///
    /// Every matching label is returned once, in database order. A short or
    /// empty header simply matches nothing.
    pub fn detect_header(&self, header: &[u8]) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for sig in &self.signatures {
            if header.starts_with(&sig.bytes) && !labels.iter().any(|l| *l == sig.label) {
                labels.push(sig.label.clone());
            }
        }
        labels
    }
}
