use bech32::Error as Bech32Error;
use thiserror::Error;

/// Errors related specifically to address formatting and encoding.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The address is not a well-formed bech32 string.
    ///
    /// Covers bad checksums, mixed case, invalid characters and a missing separator.
    #[error("Invalid address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: Bech32Error,
    },

    /// Failed to encode the address under the requested prefix.
    #[error("Failed to encode address with prefix {prefix}: {source}")]
    EncodingFailed {
        prefix: String,
        #[source]
        source: Bech32Error,
    },
}
