pub mod address;
pub mod coin;
pub mod crypto;
pub mod peer;
pub mod utils;

pub use address::AddressError;
pub use coin::{Coin, CoinError, Coins};
pub use peer::{verify_peer_format, Peer, PeerFormatError};
