//! Weighted sets of participants sharing a surplus.

use {
    crate::primitives::Address,
    itertools::Itertools,
    num::{BigInt, BigUint, Signed, Zero},
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    thiserror::Error,
};

/// Ordered participants with one weight each.
///
/// The order matters: it breaks ties when [`Self::split`] hands out the
/// units left over after rounding down.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeightedBeneficiarySet {
    participants: Vec<Address>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    weights: Vec<BigUint>,
}

impl WeightedBeneficiarySet {
    /// Builds the set from signed weights so that negative input is reported
    /// instead of being unrepresentable at the call site.
    pub fn new(participants: Vec<Address>, weights: Vec<BigInt>) -> Result<Self, BeneficiaryError> {
        if participants.len() != weights.len() {
            return Err(BeneficiaryError::LengthMismatch {
                participants: participants.len(),
                weights: weights.len(),
            });
        }
        let weights = weights
            .into_iter()
            .enumerate()
            .map(|(index, weight)| {
                if weight.is_negative() {
                    return Err(BeneficiaryError::NegativeWeight { index });
                }
                Ok(weight.magnitude().clone())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_unsigned(participants, weights)
    }

    fn from_unsigned(
        participants: Vec<Address>,
        weights: Vec<BigUint>,
    ) -> Result<Self, BeneficiaryError> {
        if participants.len() != weights.len() {
            return Err(BeneficiaryError::LengthMismatch {
                participants: participants.len(),
                weights: weights.len(),
            });
        }
        if participants.is_empty() {
            return Err(BeneficiaryError::Empty);
        }
        if let Some(duplicate) = participants.iter().duplicates().next() {
            return Err(BeneficiaryError::DuplicateParticipant(*duplicate));
        }
        if weights.iter().all(Zero::is_zero) {
            return Err(BeneficiaryError::ZeroTotalWeight);
        }
        Ok(Self {
            participants,
            weights,
        })
    }

    pub fn participants(&self) -> &[Address] {
        &self.participants
    }

    pub fn weights(&self) -> &[BigUint] {
        &self.weights
    }

    pub fn total_weight(&self) -> BigUint {
        self.weights.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Splits `amount` proportionally to the weights using the
    /// largest-remainder method.
    ///
    /// Every participant first gets `floor(amount * weight / total)`. The
    /// units lost to rounding (always fewer than the number of participants)
    /// are then handed out one each, largest fractional remainder first, ties
    /// going to the participant listed earlier. The returned allocations line
    /// up with [`Self::participants`] and always sum to exactly `amount`.
    pub fn split(&self, amount: &BigUint) -> Vec<BigUint> {
        let total = self.total_weight();

        // All shares have the same denominator, so comparing the integer
        // remainders compares the fractional parts exactly.
        let (mut allocations, remainders): (Vec<BigUint>, Vec<BigUint>) = self
            .weights
            .iter()
            .map(|weight| {
                let scaled = amount * weight;
                (&scaled / &total, scaled % &total)
            })
            .unzip();

        let allocated: BigUint = allocations.iter().sum();
        let mut leftover = amount - allocated;

        let by_remainder = (0..remainders.len())
            .sorted_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));
        for index in by_remainder {
            if leftover.is_zero() {
                break;
            }
            allocations[index] += 1u32;
            leftover -= 1u32;
        }

        allocations
    }
}

#[derive(Deserialize)]
struct UncheckedSet {
    participants: Vec<Address>,
    weights: Vec<String>,
}

impl<'de> Deserialize<'de> for WeightedBeneficiarySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let unchecked = UncheckedSet::deserialize(deserializer)?;
        let weights = unchecked
            .weights
            .iter()
            .map(|weight| weight.parse::<BigInt>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom)?;
        Self::new(unchecked.participants, weights).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeneficiaryError {
    #[error("number of participants ({participants}) doesn't match number of weights ({weights})")]
    LengthMismatch { participants: usize, weights: usize },
    #[error("weights contain a negative amount at index {index}")]
    NegativeWeight { index: usize },
    #[error("beneficiary set is empty")]
    Empty,
    #[error("participant {0} is listed more than once")]
    DuplicateParticipant(Address),
    #[error("total weight must be positive")]
    ZeroTotalWeight,
}
