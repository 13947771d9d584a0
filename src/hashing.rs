//! File digests and byte-level comparison.
//!
//! Used by `sigsift compare`: two files are identical when their SHA-256
//! digests agree; otherwise the first differing offsets are listed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Most differences listed for one comparison
pub const DIFF_LIMIT: usize = 50;

const BLOCK_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

/// One differing byte; `None` past the end of the shorter file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteDifference {
    pub offset: u64,
    pub file1_byte: Option<String>,
    pub file2_byte: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub file1: String,
    pub file2: String,
    pub hashes_file1: FileHashes,
    pub hashes_file2: FileHashes,
    pub identical: bool,
    pub differences_found: usize,
    pub difference_preview: Vec<ByteDifference>,
}

fn open(path: &Path) -> Result<File> {
    if !path.is_file() {
        return Err(Error::not_found(path));
    }
    File::open(path).map_err(|e| Error::unreadable(path, e))
}

/// MD5, SHA-1 and SHA-256 of a file, read in 4 KiB blocks
pub fn compute_hashes<P: AsRef<Path>>(path: P) -> Result<FileHashes> {
    let path = path.as_ref();
    let mut file = open(path)?;

    let mut md5 = md5::Context::new();
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        let n = file.read(&mut block)?;
        if n == 0 {
            break;
        }
        md5.consume(&block[..n]);
        sha1.update(&block[..n]);
        sha256.update(&block[..n]);
    }

    Ok(FileHashes {
        md5: format!("{:x}", md5.compute()),
        sha1: format!("{:x}", sha1.finalize()),
        sha256: format!("{:x}", sha256.finalize()),
    })
}

/// Offsets where the two files differ, at most `limit` of them
pub fn compare_bytes<P: AsRef<Path>, Q: AsRef<Path>>(
    path1: P,
    path2: Q,
    limit: usize,
) -> Result<Vec<ByteDifference>> {
    let mut left = BufReader::new(open(path1.as_ref())?).bytes();
    let mut right = BufReader::new(open(path2.as_ref())?).bytes();

    let mut diffs = Vec::new();
    let mut offset = 0u64;
    while diffs.len() < limit {
        let a = left.next().transpose()?;
        let b = right.next().transpose()?;
        if a.is_none() && b.is_none() {
            break;
        }
        if a != b {
            diffs.push(ByteDifference {
                offset,
                file1_byte: a.map(|x| format!("{:02x}", x)),
                file2_byte: b.map(|x| format!("{:02x}", x)),
            });
        }
        offset += 1;
    }
    Ok(diffs)
}

pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(path1: P, path2: Q) -> Result<Comparison> {
    let (path1, path2) = (path1.as_ref(), path2.as_ref());
    let hashes_file1 = compute_hashes(path1)?;
    let hashes_file2 = compute_hashes(path2)?;

    let identical = hashes_file1.sha256 == hashes_file2.sha256;
    let difference_preview = if identical {
        Vec::new()
    } else {
        compare_bytes(path1, path2, DIFF_LIMIT)?
    };
    tracing::info!(identical, differences = difference_preview.len(), "compared");

    Ok(Comparison {
        file1: path1.display().to_string(),
        file2: path2.display().to_string(),
        hashes_file1,
        hashes_file2,
        identical,
        differences_found: difference_preview.len(),
        difference_preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_known_digests() {
        let file = temp_with(b"abc");
        let hashes = compute_hashes(file.path()).unwrap();
        assert_eq!(hashes.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(hashes.sha1, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            hashes.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_file_digests() {
        let file = temp_with(b"");
        let hashes = compute_hashes(file.path()).unwrap();
        assert_eq!(hashes.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hashes.sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            hashes.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_multi_block_file() {
        let data = vec![0x5Au8; BLOCK_SIZE * 3 + 17];
        let a = temp_with(&data);
        let b = temp_with(&data);
        let cmp = compare_files(a.path(), b.path()).unwrap();
        assert!(cmp.identical);
        assert_eq!(cmp.differences_found, 0);
        assert_eq!(cmp.hashes_file1, cmp.hashes_file2);
    }

    #[test]
    fn test_single_byte_difference() {
        let a = temp_with(b"hello world");
        let b = temp_with(b"hello World");
        let cmp = compare_files(a.path(), b.path()).unwrap();

        assert!(!cmp.identical);
        assert_eq!(
            cmp.difference_preview,
            vec![ByteDifference {
                offset: 6,
                file1_byte: Some("77".to_string()),
                file2_byte: Some("57".to_string()),
            }]
        );
    }

    #[test]
    fn test_length_difference_reports_missing_bytes() {
        let a = temp_with(b"abc");
        let b = temp_with(b"abcde");
        let diffs = compare_bytes(a.path(), b.path(), DIFF_LIMIT).unwrap();

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].offset, 3);
        assert_eq!(diffs[0].file1_byte, None);
        assert_eq!(diffs[1].file2_byte.as_deref(), Some("65"));
    }

    #[test]
    fn test_difference_preview_capped() {
        let a = temp_with(&[0u8; 200]);
        let b = temp_with(&[1u8; 200]);
        let cmp = compare_files(a.path(), b.path()).unwrap();
        assert_eq!(cmp.differences_found, DIFF_LIMIT);
        assert_eq!(cmp.difference_preview.last().unwrap().offset, 49);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let a = temp_with(b"x");
        let err = compare_files(a.path(), "/no/such/file").unwrap_err();
        assert!(err.is_not_found());
    }
}
