pub mod hash;

pub use hash::{checksum_strings, digest, file_digest};
