//! Fixed FNV-1a hashing, stable across platforms and toolchains.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub fn stable_hash_bytes<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> u64 {
    chunks
        .into_iter()
        .flatten()
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
}

/// Hash `seed` (little-endian) followed by the UTF-8 bytes of `value`.
pub fn stable_hash_str(seed: u64, value: &str) -> u64 {
    stable_hash_bytes([seed.to_le_bytes().as_slice(), value.as_bytes()])
}
