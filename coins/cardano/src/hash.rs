use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};

/// Blake2b-224, used for key hashes, script hashes and policy ids.
pub fn blake2b_224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut hash = [0u8; 28];
    hash.copy_from_slice(&result);
    hash
}

/// Blake2b-256, used for transaction ids, datum hashes and the script integrity hash.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
