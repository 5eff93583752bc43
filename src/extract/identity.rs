use sha2::{Digest, Sha256};

/// Computes the deduplication hash of a posting
///
/// Inputs are trimmed and lowercased, then joined with a separator that
/// cannot occur in listing text. Returns 64 lowercase hex characters.
pub fn hash_identity(title: &str, company: &str, location: &str) -> String {
    let mut hasher = Sha256::new();

    for (i, part) in [title, company, location].iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.trim().to_lowercase().as_bytes());
    }

    hex::encode(hasher.finalize())
}
