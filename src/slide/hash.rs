use sha2::{Digest, Sha256};

/// Running SHA-256 over the parts of a slide that identify its content.
///
/// Strings are hashed with a trailing NUL so that adjacent strings cannot
/// run together (`"ab" + "c"` and `"a" + "bc"` hash differently).
#[derive(Debug, Clone, Default)]
pub struct QuickHash {
    hasher: Sha256,
}

impl QuickHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn hash_string(&mut self, s: &str) {
        self.hasher.update(s.as_bytes());
        self.hasher.update([0u8]);
    }

    /// Lowercase hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
