use sha2::{Digest, Sha256};

/// Hash several parts with a NUL separator so that `["ab", "c"]` and
/// `["a", "bc"]` produce different digests.
pub fn sha256_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// First 16 hex characters of [`sha256_parts`], for display.
pub fn short_fingerprint(parts: &[&str]) -> String {
    let mut full = sha256_parts(parts);
    full.truncate(16);
    full
}
