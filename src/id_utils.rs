// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Opaque random identifiers.

use ring::rand::{SecureRandom, SystemRandom};

/// Bytes of entropy in record IDs (24 hex chars).
const RECORD_ID_BYTES: usize = 12;

/// Hex-encode `len` bytes from the system CSPRNG.
pub fn random_hex(len: usize) -> anyhow::Result<String> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("system random source unavailable"))?;
    Ok(hex::encode(bytes))
}

/// New document ID for users, questions and results.
pub fn new_record_id() -> anyhow::Result<String> {
    random_hex(RECORD_ID_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_unique_hex() {
        let a = new_record_id().unwrap();
        let b = new_record_id().unwrap();
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
