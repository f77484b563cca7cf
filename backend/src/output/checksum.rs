//! Input fingerprinting for reports.

use sha2::{Digest, Sha256};

/// SHA-256 of the raw input text, hex encoded.
///
/// Reports carry it so that a stacked light curve can be traced back to the
/// exact file it came from.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            calculate_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_content_different_checksum() {
        let a = calculate_checksum("2459000.5 ZTF_g 10.0 1.0");
        let b = calculate_checksum("2459000.5 ZTF_g 10.0 1.1");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
