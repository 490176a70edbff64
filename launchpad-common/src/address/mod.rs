//! Bech32 address helpers.
//!
//! Chains in a launch share key material but not address prefixes: the same
//! account is `cosmos1...` on the launched chain and `spn1...` on the
//! coordination chain. These helpers translate between the two without
//! touching the underlying bytes.

use bech32::{decode, encode, FromBase32, ToBase32, Variant};

pub mod errors;

pub use errors::AddressError;

fn decode_address(address: &str) -> Result<(String, Vec<bech32::u5>, Variant), AddressError> {
    decode(address).map_err(|source| AddressError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Returns the human-readable prefix of a bech32 address.
pub fn address_prefix(address: &str) -> Result<String, AddressError> {
    let (hrp, _, _) = decode_address(address)?;
    Ok(hrp)
}

/// Returns the raw bytes encoded in a bech32 address.
pub fn address_bytes(address: &str) -> Result<Vec<u8>, AddressError> {
    let (_, data, _) = decode_address(address)?;
    Vec::<u8>::from_base32(&data).map_err(|source| AddressError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Encodes raw bytes as a classic bech32 address under `prefix`.
pub fn address_from_bytes(bytes: &[u8], prefix: &str) -> Result<String, AddressError> {
    encode(prefix, bytes.to_base32(), Variant::Bech32).map_err(|source| {
        AddressError::EncodingFailed {
            prefix: prefix.to_string(),
            source,
        }
    })
}

/// Re-encodes `address` under `prefix`.
///
/// The payload and the checksum variant are preserved, so the result decodes
/// to exactly the same bytes as the input.
pub fn change_address_prefix(address: &str, prefix: &str) -> Result<String, AddressError> {
    let (_, data, variant) = decode_address(address)?;
    encode(prefix, data, variant).map_err(|source| AddressError::EncodingFailed {
        prefix: prefix.to_string(),
        source,
    })
}
