//! Primitive value types for auctions.

use {
    num::{BigUint, Zero},
    regex::Regex,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock},
    thiserror::Error,
};

pub use alloy::primitives::Address;

/// Auction identifier. Assigned by the store, never reused.
pub type Id = u64;

static DENOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9/:._-]{2,127}$").unwrap());

/// Unit tag distinguishing incompatible amounts (e.g. `ukava`, `usdx`).
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
pub struct Denom(String);

impl Denom {
    pub fn new(denom: impl Into<String>) -> Result<Self, DenomError> {
        let denom = denom.into();
        if !DENOM.is_match(&denom) {
            return Err(DenomError(denom));
        }
        Ok(Self(denom))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Denom {
    type Error = DenomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Denom {
    type Err = DenomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Denom> for String {
    fn from(value: Denom) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid denomination {0:?}")]
pub struct DenomError(pub String);

/// An exact, non-negative quantity of a single denomination.
///
/// Amounts of different denominations can't be compared, added or
/// subtracted; those operations fail with [`AmountError::DenomMismatch`]
/// instead. Subtraction never wraps, it fails with
/// [`AmountError::Underflow`].
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub denom: Denom,
    #[serde_as(as = "DisplayFromStr")]
    pub quantity: BigUint,
}

impl Amount {
    pub fn new(denom: Denom, quantity: impl Into<BigUint>) -> Self {
        Self {
            denom,
            quantity: quantity.into(),
        }
    }

    pub fn zero(denom: Denom) -> Self {
        Self::new(denom, BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Fails unless `other` is of the same denomination.
    pub fn ensure_same_denom(&self, other: &Amount) -> Result<(), AmountError> {
        if self.denom != other.denom {
            return Err(AmountError::DenomMismatch {
                expected: self.denom.clone(),
                got: other.denom.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_cmp(&self, other: &Amount) -> Result<Ordering, AmountError> {
        self.ensure_same_denom(other)?;
        Ok(self.quantity.cmp(&other.quantity))
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.ensure_same_denom(other)?;
        Ok(Self::new(self.denom.clone(), &self.quantity + &other.quantity))
    }

    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.ensure_same_denom(other)?;
        if self.quantity < other.quantity {
            return Err(AmountError::Underflow {
                minuend: self.clone(),
                subtrahend: other.clone(),
            });
        }
        Ok(Self::new(self.denom.clone(), &self.quantity - &other.quantity))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quantity, self.denom)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Amount {
    /// Shorthand for tests, panics on an invalid denomination.
    pub fn test(denom: &str, quantity: u64) -> Self {
        Self::new(Denom::new(denom).unwrap(), quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("denomination mismatch: expected {expected}, got {got}")]
    DenomMismatch { expected: Denom, got: Denom },
    #[error("cannot subtract {subtrahend} from {minuend}")]
    Underflow { minuend: Amount, subtrahend: Amount },
}
