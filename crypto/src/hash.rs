//! Blake2b-256 digests for every identifier in the DAO.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use village_types::Hash32;

type Blake2b256 = Blake2b<U32>;

/// Digest of the concatenation of `parts`, fed to the hasher piecewise.
pub fn hash_parts(parts: &[&[u8]]) -> Hash32 {
    let digest = parts
        .iter()
        .fold(Blake2b256::new(), |hasher, part| hasher.chain_update(part))
        .finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash32::new(bytes)
}

pub fn hash_bytes(data: &[u8]) -> Hash32 {
    hash_parts(&[data])
}

/// Word id of a UTF-8 string, used for role ids and description hashes.
pub fn hash_text(text: &str) -> Hash32 {
    hash_bytes(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_hash_like_their_concatenation() {
        assert_eq!(hash_parts(&[b"village", b"square"]), hash_bytes(b"villagesquare"));
        assert_ne!(hash_parts(&[b"village"]), hash_bytes(b"villagesquare"));
    }

    #[test]
    fn role_names_map_to_distinct_ids() {
        assert_ne!(hash_text("PROPOSER_ROLE"), hash_text("EXECUTOR_ROLE"));
        assert_eq!(hash_text("PROPOSER_ROLE"), hash_text("PROPOSER_ROLE"));
    }
}
