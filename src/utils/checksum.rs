use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of `data`.
///
/// # Examples
/// ```
/// use dirbundle::utils::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
