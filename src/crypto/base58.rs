//! Base58Check encoding
//!
//! `base58(version || payload || checksum)` where the checksum is the first
//! four bytes of the double SHA-256 of `version || payload`.

use thiserror::Error;

use super::hash::double_sha256;

/// Number of checksum bytes appended before base58 encoding
pub const CHECKSUM_LEN: usize = 4;

/// Errors that can occur while decoding a base58check string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Base58Error {
    #[error("Invalid base58 character")]
    InvalidCharacter,
    #[error("Decoded data too short: {0} bytes")]
    TooShort(usize),
    #[error("Checksum mismatch")]
    ChecksumMismatch,
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = double_sha256(data);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a version byte and payload as a base58check string
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let check = checksum(&bytes);
    bytes.extend_from_slice(&check);
    bs58::encode(bytes).into_string()
}

/// Decode a base58check string into its version byte and payload
pub fn base58check_decode(encoded: &str) -> Result<(u8, Vec<u8>), Base58Error> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| Base58Error::InvalidCharacter)?;

    if bytes.len() < 1 + CHECKSUM_LEN {
        return Err(Base58Error::TooShort(bytes.len()));
    }

    let (data, check) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if checksum(data) != check {
        return Err(Base58Error::ChecksumMismatch);
    }

    Ok((data[0], data[1..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_address() {
        let hash = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let address = base58check_encode(0x00, &hash);
        assert_eq!(address, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let (version, payload) = base58check_decode(&address).unwrap();
        assert_eq!(version, 0x00);
        assert_eq!(payload, hash);
    }

    #[test]
    fn test_checksum_mismatch() {
        // Last character altered
        let result = base58check_decode("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ");
        assert_eq!(result, Err(Base58Error::ChecksumMismatch));
    }

    #[test]
    fn test_invalid_character() {
        // '0' is not in the base58 alphabet
        let result = base58check_decode("0BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(result, Err(Base58Error::InvalidCharacter));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(base58check_decode("1"), Err(Base58Error::TooShort(1)));
    }
}
