//! Token amounts.
//!
//! Amounts are arbitrary-precision non-negative integers. On the wire a coin
//! is `{"denom": "stake", "amount": "95000000"}` and in text it is
//! `95000000stake`; a coin set is a comma-separated list of those.

use std::{fmt, str::FromStr};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Invalid coin expression {0:?}: expected <amount><denom>")]
    InvalidFormat(String),

    #[error("Invalid denom {0:?}")]
    InvalidDenom(String),

    #[error("Invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("Duplicate denom {0}")]
    DuplicateDenom(String),
}

/// Denoms follow `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let mut chars = denom.chars();
    let valid = (3..=128).contains(&denom.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));

    if valid {
        Ok(())
    } else {
        Err(CoinError::InvalidDenom(denom.to_string()))
    }
}

/// Parses a base-10 amount made only of ASCII digits.
pub fn parse_amount(raw: &str) -> Result<BigUint, CoinError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoinError::InvalidAmount(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| CoinError::InvalidAmount(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: BigUint,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<BigUint>) -> Result<Self, CoinError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self {
            denom,
            amount: amount.into(),
        })
    }

    pub fn is_zero(&self) -> bool {
        self.amount == BigUint::default()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinError::InvalidFormat(s.to_string()))?;
        if split == 0 {
            return Err(CoinError::InvalidFormat(s.to_string()));
        }

        let (amount, denom) = s.split_at(split);
        let amount = parse_amount(amount)?;
        Coin::new(denom.trim_start(), amount)
    }
}

/// A denom-unique coin collection, kept sorted by denom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> Option<&BigUint> {
        self.0
            .binary_search_by(|coin| coin.denom.as_str().cmp(denom))
            .ok()
            .map(|index| &self.0[index].amount)
    }

    /// Exact membership: the denom must be present with exactly this amount.
    pub fn contains(&self, coin: &Coin) -> bool {
        self.amount_of(&coin.denom) == Some(&coin.amount)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinError;

    fn try_from(mut coins: Vec<Coin>) -> Result<Self, Self::Error> {
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for pair in coins.windows(2) {
            if pair[0].denom == pair[1].denom {
                return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
            }
        }
        for coin in &coins {
            validate_denom(&coin.denom)?;
        }
        Ok(Self(coins))
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self(vec![coin])
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, coin) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

impl FromStr for Coins {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(',')
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()
            .and_then(Coins::try_from)
    }
}

mod amount_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(de::Error::custom)
    }
}
