//! Peer strings: `<node-id>@<host>[:<port>]`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("the peer address {0} doesn't match the peer format <node-id>@<host>")]
pub struct PeerFormatError(pub String);

/// Returns whether `peer` is `<id>@<host>[:<port>]` with a single `@`, a
/// non-blank id and a non-blank host.
pub fn verify_peer_format(peer: &str) -> bool {
    let Some((id, address)) = peer.split_once('@') else {
        return false;
    };
    let (id, address) = (id.trim(), address.trim());
    if id.is_empty() || address.is_empty() || address.contains('@') {
        return false;
    }

    let host = address.rsplit_once(':').map_or(address, |(host, _port)| host);
    !host.trim().is_empty()
}

/// A node's dialable P2P address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Peer {
    pub id: String,
    pub address: String,
}

impl Peer {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Result<Self, PeerFormatError> {
        format!("{}@{}", id.into(), address.into()).parse()
    }
}

impl FromStr for Peer {
    type Err = PeerFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !verify_peer_format(s) {
            return Err(PeerFormatError(s.to_string()));
        }
        let (id, address) = s
            .split_once('@')
            .ok_or_else(|| PeerFormatError(s.to_string()))?;
        Ok(Self {
            id: id.trim().to_string(),
            address: address.trim().to_string(),
        })
    }
}

impl TryFrom<String> for Peer {
    type Error = PeerFormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Peer> for String {
    fn from(peer: Peer) -> Self {
        peer.to_string()
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}

/// Joins peers into the flat comma-separated form used by `persistent_peers`.
pub fn join_peers<I, S>(peers: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    peers
        .into_iter()
        .map(|peer| peer.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
