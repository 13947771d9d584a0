//! Embedded signature scanning
//!
//! Finds every signature at every offset, not only at offset 0. Overlapping
//! occurrences are all reported: after a match at offset `i` the search for
//! that signature resumes at `i + 1`.
//!
//! Output is signature-major: all hits of the first signature in ascending
//! offset order, then the second signature, and so on. The automaton yields
//! hits offset-major, so they are collected as `(signature index, offset)`
//! and sorted before being turned into [`Detection`]s.
//!
//! With a limit of `n`, at most `n` hits are stored per signature. Hits of one
//! signature always arrive in ascending offset order, so the first `n` of each
//! are enough to produce the first `n` entries of the signature-major list.
//!
//! [`StreamScanner`] produces the same list from a file read in chunks,
//! carrying `max_signature_len - 1` bytes over each chunk boundary.

use super::{Detection, SignatureDb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Hit {
    signature: usize,
    offset: u64,
}

/// Result of a limited scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub detections: Vec<Detection>,
    /// Hits seen before the limit was applied
    pub found: u64,
}

/// Hit store that keeps at most `limit` hits per signature
#[derive(Debug)]
struct Hits {
    items: Vec<Hit>,
    per_signature: Vec<usize>,
    limit: Option<usize>,
    found: u64,
}

impl Hits {
    fn new(signatures: usize, limit: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            per_signature: vec![0; signatures],
            limit,
            found: 0,
        }
    }

    fn push(&mut self, hit: Hit) {
        self.found += 1;
        if let Some(limit) = self.limit {
            let stored = &mut self.per_signature[hit.signature];
            if *stored >= limit {
                return;
            }
            *stored += 1;
        }
        self.items.push(hit);
    }
}

impl SignatureDb {
    /// All occurrences of every signature in `data`
    pub fn scan(&self, data: &[u8]) -> Vec<Detection> {
        self.scan_limited(data, None).detections
    }

    /// Like [`scan`](Self::scan), keeping only the first `limit` detections
    pub fn scan_limited(&self, data: &[u8], limit: Option<usize>) -> ScanOutcome {
        let mut hits = Hits::new(self.signatures.len(), limit);
        self.collect_hits(data, 0, 0, &mut hits);
        let found = hits.found;
        ScanOutcome {
            detections: self.resolve(hits),
            found,
        }
    }

    /// Push hits found in `haystack` that end after `skip_end_before`.
    ///
    /// `base` is the absolute offset of `haystack[0]`. Hits ending at or
    /// before `skip_end_before` were already reported for an earlier chunk.
    fn collect_hits(&self, haystack: &[u8], base: u64, skip_end_before: usize, out: &mut Hits) {
        match &self.matcher {
            Some(ac) => {
                for mat in ac.find_overlapping_iter(haystack) {
                    if mat.end() > skip_end_before {
                        out.push(Hit {
                            signature: mat.pattern().as_usize(),
                            offset: base + mat.start() as u64,
                        });
                    }
                }
            }
            None => {
                for (idx, sig) in self.signatures.iter().enumerate() {
                    let mut start = 0;
                    while let Some(pos) = find_from(haystack, &sig.bytes, start) {
                        if pos + sig.bytes.len() > skip_end_before {
                            out.push(Hit {
                                signature: idx,
                                offset: base + pos as u64,
                            });
                        }
                        start = pos + 1;
                    }
                }
            }
        }
    }

    fn resolve(&self, hits: Hits) -> Vec<Detection> {
        let Hits {
            items: mut hits,
            limit,
            ..
        } = hits;
        hits.sort_unstable();
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        hits.into_iter()
            .map(|hit| Detection {
                label: self.signatures[hit.signature].label.clone(),
                offset: hit.offset,
            })
            .collect()
    }
}

/// First occurrence of `needle` in `haystack` at or after `start`
fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| start + pos)
}

/// Incremental scanner for input that arrives in chunks
///
/// ```
/// use sigsift::signature::{SignatureDb, StreamScanner};
///
/// let db = SignatureDb::builtin();
/// let mut scanner = StreamScanner::new(db);
/// scanner.feed(b"%PDF-1.4 ... P");
/// scanner.feed(b"K\x03\x04 trailing zip");
/// let found = scanner.finish();
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[1].offset, 13);
/// ```
#[derive(Debug)]
pub struct StreamScanner<'a> {
    db: &'a SignatureDb,
    carry: Vec<u8>,
    /// Total bytes fed so far
    consumed: u64,
    hits: Hits,
}

impl<'a> StreamScanner<'a> {
    pub fn new(db: &'a SignatureDb) -> Self {
        Self::with_limit(db, None)
    }

    /// Scanner that stores at most `limit` hits per signature
    pub fn with_limit(db: &'a SignatureDb, limit: Option<usize>) -> Self {
        Self {
            db,
            carry: Vec::with_capacity(db.max_signature_len()),
            consumed: 0,
            hits: Hits::new(db.len(), limit),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        let carried = self.carry.len();
        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);

        let base = self.consumed - carried as u64;
        self.db.collect_hits(&window, base, carried, &mut self.hits);
        self.consumed += chunk.len() as u64;

        let keep = self.db.max_signature_len().saturating_sub(1).min(window.len());
        window.drain(..window.len() - keep);
        self.carry = window;
    }

    /// Bytes fed so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Hits seen so far, including those dropped by the limit
    pub fn found(&self) -> u64 {
        self.hits.found
    }

    /// Hits currently held in memory
    pub fn stored(&self) -> usize {
        self.hits.items.len()
    }

    pub fn finish(self) -> Vec<Detection> {
        self.db.resolve(self.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn db_of(entries: &[(&str, &[&[u8]])]) -> SignatureDb {
        SignatureDb::from_entries(entries.iter().map(|(label, sigs)| {
            (label.to_string(), sigs.iter().map(|s| s.to_vec()).collect())
        }))
    }

    fn pairs(found: &[Detection]) -> Vec<(&str, u64)> {
        found.iter().map(|d| (d.label.as_str(), d.offset)).collect()
    }

    /// Reference implementation: per signature, search from `i + 1` after each hit
    fn naive_scan(db: &SignatureDb, data: &[u8]) -> Vec<Detection> {
        let mut found = Vec::new();
        for sig in db.signatures() {
            let mut start = 0;
            while let Some(pos) = find_from(data, &sig.bytes, start) {
                found.push(Detection {
                    label: sig.label.clone(),
                    offset: pos as u64,
                });
                start = pos + 1;
            }
        }
        found
    }

    fn stream_scan(db: &SignatureDb, data: &[u8], chunk: usize) -> Vec<Detection> {
        let mut scanner = StreamScanner::new(db);
        for piece in data.chunks(chunk) {
            scanner.feed(piece);
        }
        scanner.finish()
    }

    // ==========================================================================
    // BASIC SCANNING
    // ==========================================================================

    #[test]
    fn test_empty_buffer() {
        assert!(SignatureDb::builtin().scan(&[]).is_empty());
    }

    #[test]
    fn test_no_signatures_present() {
        let data = vec![0x41u8; 4096];
        assert!(SignatureDb::builtin().scan(&data).is_empty());
    }

    #[test]
    fn test_header_match_included_at_offset_zero() {
        let db = SignatureDb::builtin();
        let data = b"\x7FELF\x02\x01\x01\x00";
        assert_eq!(pairs(&db.scan(data)), vec![("elf", 0)]);
    }

    #[test]
    fn test_pdf_with_trailing_zip() {
        // %PDF at 0, PK\x03\x04 100 bytes later
        let mut data = b"%PDF".to_vec();
        data.resize(100, b' ');
        data.extend_from_slice(b"PK\x03\x04");
        data.extend_from_slice(b" payload");

        let found = SignatureDb::builtin().scan(&data);
        assert_eq!(pairs(&found), vec![("pdf", 0), ("zip", 100)]);
    }

    // ==========================================================================
    // ORDERING AND OVERLAP
    // ==========================================================================
    //
    // Results are grouped by signature in database order, then by offset. A
    // zip at offset 10 is reported after a jpg at offset 500 because jpg comes
    // first in the table.
    // ==========================================================================

    #[test]
    fn test_signature_major_order() {
        let mut data = vec![0u8; 600];
        data[10..14].copy_from_slice(b"PK\x03\x04");
        data[300..302].copy_from_slice(b"MZ");
        data[500..503].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        data[550..554].copy_from_slice(b"PK\x03\x04");

        let found = SignatureDb::builtin().scan(&data);
        assert_eq!(
            pairs(&found),
            vec![("jpg", 500), ("zip", 10), ("zip", 550), ("exe", 300)]
        );
    }

    #[test]
    fn test_shared_label_follows_signature_order() {
        // GIF89a appears before GIF87a in the data, but GIF87a is listed first
        let mut data = b"xxGIF89axxxx".to_vec();
        data.extend_from_slice(b"GIF87a");

        let found = SignatureDb::builtin().scan(&data);
        assert_eq!(pairs(&found), vec![("gif", 12), ("gif", 2)]);
    }

    #[test]
    fn test_overlapping_occurrences_reported() {
        let db = db_of(&[("aa", &[b"aa"])]);
        assert_eq!(pairs(&db.scan(b"aaaa")), vec![("aa", 0), ("aa", 1), ("aa", 2)]);
    }

    #[test]
    fn test_nested_signatures_both_reported() {
        let db = db_of(&[("long", &[b"ABCD"]), ("short", &[b"BC"])]);
        assert_eq!(pairs(&db.scan(b"xABCDx")), vec![("long", 1), ("short", 2)]);
    }

    #[test]
    fn test_repetitive_data_matches_every_offset() {
        let data = vec![0xFFu8; 64];
        let db = db_of(&[("ff", &[b"\xFF\xFF"])]);
        assert_eq!(db.scan(&data).len(), 63);
    }

    // ==========================================================================
    // STREAMING
    // ==========================================================================
    //
    // Chunked input must give exactly the in-memory answer, including
    // signatures split across a chunk boundary.
    // ==========================================================================

    #[test]
    fn test_stream_split_signature() {
        let db = SignatureDb::builtin();
        let data = b"....\x89PNG....";
        for chunk in 1..data.len() {
            assert_eq!(
                stream_scan(db, data, chunk),
                db.scan(data),
                "chunk size {}",
                chunk
            );
        }
    }

    #[test]
    fn test_stream_no_duplicates_in_carry() {
        // A match fully inside the carried tail must not be reported twice
        let db = SignatureDb::builtin();
        let mut scanner = StreamScanner::new(db);
        scanner.feed(b"0123MZ");
        scanner.feed(b"abc");
        assert_eq!(scanner.consumed(), 9);
        assert_eq!(pairs(&scanner.finish()), vec![("exe", 4)]);
    }

    #[test]
    fn test_stream_empty_chunks_ignored() {
        let db = SignatureDb::builtin();
        let mut scanner = StreamScanner::new(db);
        scanner.feed(b"");
        scanner.feed(b"\x1F\x8B");
        scanner.feed(b"");
        scanner.feed(b"\x08");
        assert_eq!(pairs(&scanner.finish()), vec![("gz", 0)]);
    }

    // ==========================================================================
    // LIMITS
    // ==========================================================================

    #[test]
    fn test_limit_keeps_signature_major_prefix() {
        let mut data = vec![0u8; 600];
        data[10..14].copy_from_slice(b"PK\x03\x04");
        data[300..302].copy_from_slice(b"MZ");
        data[500..503].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        data[550..554].copy_from_slice(b"PK\x03\x04");

        let db = SignatureDb::builtin();
        for limit in 0..6 {
            let outcome = db.scan_limited(&data, Some(limit));
            let full = db.scan(&data);
            assert_eq!(outcome.found, 4);
            assert_eq!(outcome.detections, full[..limit.min(full.len())].to_vec());
        }
    }

    #[test]
    fn test_limited_stream_stays_bounded() {
        let db = SignatureDb::builtin();
        let data = b"MZ".repeat(100_000);

        let mut scanner = StreamScanner::with_limit(db, Some(10));
        for piece in data.chunks(4096) {
            scanner.feed(piece);
            assert!(scanner.stored() <= 10 * db.len());
        }
        assert_eq!(scanner.found(), 100_000);
        assert_eq!(scanner.stored(), 10);

        let found = scanner.finish();
        assert_eq!(found.len(), 10);
        assert_eq!(found[9].offset, 18);
    }

    #[test]
    fn test_limited_stream_matches_limited_scan() {
        let db = SignatureDb::builtin();
        let mut data = b"GIF89a".repeat(20);
        data.extend_from_slice(&b"PK\x03\x04".repeat(20));
        data.extend_from_slice(&b"MZ".repeat(20));

        for limit in [1, 7, 25, 100] {
            let mut scanner = StreamScanner::with_limit(db, Some(limit));
            for piece in data.chunks(5) {
                scanner.feed(piece);
            }
            assert_eq!(scanner.finish(), db.scan_limited(&data, Some(limit)).detections);
        }
    }

    #[test]
    fn test_linear_fallback_matches_automaton() {
        let db = SignatureDb::builtin();
        let linear = SignatureDb {
            signatures: db.signatures.clone(),
            matcher: None,
            max_len: db.max_len,
        };
        let data = b"MZ\x90\x00PK\x03\x04GIF89aMZ%PDF\xFF\xD8\xFF";
        assert_eq!(linear.scan(data), db.scan(data));
        assert_eq!(stream_scan(&linear, data, 3), db.scan(data));
    }

    // ==========================================================================
    // PROPERTIES
    // ==========================================================================

    /// Bytes drawn from an alphabet that makes signature hits likely
    fn signature_soup() -> impl Strategy<Value = Vec<u8>> {
        let pieces = prop_oneof![
            Just(b"MZ".to_vec()),
            Just(b"PK\x03\x04".to_vec()),
            Just(b"%PDF".to_vec()),
            Just(b"\xFF\xD8\xFF".to_vec()),
            Just(b"GIF89a".to_vec()),
            Just(b"\x00\x00\x00\x18ftyp".to_vec()),
            Just(b"\x1F\x8B\x08".to_vec()),
            proptest::collection::vec(any::<u8>(), 0..8),
        ];
        proptest::collection::vec(pieces, 0..40).prop_map(|p| p.concat())
    }

    proptest! {
        #[test]
        fn prop_automaton_equals_naive(data in signature_soup()) {
            let db = SignatureDb::builtin();
            prop_assert_eq!(db.scan(&data), naive_scan(db, &data));
        }

        #[test]
        fn prop_stream_equals_in_memory(data in signature_soup(), chunk in 1usize..32) {
            let db = SignatureDb::builtin();
            prop_assert_eq!(stream_scan(db, &data, chunk), db.scan(&data));
        }

        #[test]
        fn prop_header_hits_are_offset_zero_detections(data in signature_soup()) {
            let db = SignatureDb::builtin();
            let header = &data[..data.len().min(64)];
            let found = db.scan(&data);
            for label in db.detect_header(header) {
                prop_assert!(found.iter().any(|d| d.label == label && d.offset == 0));
            }
        }
    }
}
