use std::io::{self, Read};

use ring::digest::{Context, SHA256};

use crate::error::StoreError;

/// Length of a hex-encoded SHA-256 content hash.
pub const HASH_LEN: usize = 64;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash everything the reader yields.
pub fn hash_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut context = Context::new(&SHA256);
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        context.update(&buf[..n]);
    }
    Ok(hex::encode(context.finish()))
}

pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(ring::digest::digest(&SHA256, data))
}

/// Whether `hash` looks like a content hash: 64 lowercase hex characters.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_LEN && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Fail with [`StoreError::InvalidHash`] on the first malformed hash.
pub fn check_hash<S: AsRef<str>>(hashes: &[S]) -> Result<(), StoreError> {
    match hashes.iter().map(AsRef::as_ref).find(|h| !is_valid_hash(h)) {
        Some(bad) => Err(StoreError::InvalidHash(bad.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let from_reader = hash_reader(&mut Cursor::new(&data)).unwrap();
        assert_eq!(from_reader, hash_bytes(&data));
        assert_eq!(from_reader, hash_reader(&mut Cursor::new(&data)).unwrap());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            hash_reader(&mut io::empty()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_format() {
        assert!(is_valid_hash(&hash_bytes(b"x")));
        assert!(!is_valid_hash(""));
        assert!(!is_valid_hash("abc"));
        assert!(!is_valid_hash(&"A".repeat(HASH_LEN)));
        assert!(!is_valid_hash(&"g".repeat(HASH_LEN)));
        assert!(!is_valid_hash(&"a".repeat(HASH_LEN + 1)));
    }

    #[test]
    fn test_check_hash_reports_first_bad_hash() {
        let good = hash_bytes(b"ok");
        assert!(check_hash(&[good.as_str()]).is_ok());
        match check_hash(&[good.as_str(), "nope", "also-bad"]) {
            Err(StoreError::InvalidHash(h)) => assert_eq!(h, "nope"),
            other => panic!("expected invalid hash, got {other:?}"),
        }
    }
}
