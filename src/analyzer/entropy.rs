//! Shannon entropy of byte content
//!
//! Entropy is measured in bits per byte, so it always lies in `0.0..=8.0`:
//!
//! - 0.0: every byte has the same value (or there are no bytes)
//! - ~4-5: text and most uncompressed formats
//! - > 7: compressed, encrypted or packed data
//!
//! [`Histogram`] accumulates counts across chunks so a streamed file gets the
//! same value as one read in a single piece.

/// Entropy of `data` in bits per byte; 0.0 for an empty slice
pub fn shannon_entropy(data: &[u8]) -> f64 {
    let mut histogram = Histogram::new();
    histogram.update(data);
    histogram.entropy()
}

/// Byte frequency table, one bucket per byte value
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: [u64; 256],
    total: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            total: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.counts[byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let total = self.total as f64;
        let mut entropy = 0.0;
        for &count in &self.counts {
            if count == 0 {
                continue;
            }
            let p = count as f64 / total;
            entropy -= p * p.log2();
        }
        entropy
    }

    /// Bytes counted so far
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
