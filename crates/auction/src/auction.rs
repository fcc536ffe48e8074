//! Auction records.
//!
//! The set of auction kinds is closed: [`Auction`] is matched exhaustively
//! wherever the kinds behave differently.

use {
    crate::{
        beneficiaries::WeightedBeneficiarySet,
        primitives::{Address, Amount, Denom, Id},
        transfer::{Plan, Transfer},
    },
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// State shared by every kind of auction.
///
/// Records are only built by the keeper, everyone else reads them through
/// the accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseAuction {
    pub(crate) id: Id,
    /// Account that started the auction and receives its proceeds.
    pub(crate) initiator: Address,
    /// What is on offer.
    pub(crate) lot: Amount,
    /// Current best bidder, `None` until the first accepted bid.
    pub(crate) bidder: Option<Address>,
    /// What the current bidder offers for the lot.
    pub(crate) bid: Amount,
    /// Bids are accepted strictly before this time, closing is allowed from
    /// this time on.
    pub(crate) end_time: DateTime<Utc>,
    /// Ceiling for `end_time`, fixed at creation.
    pub(crate) max_end_time: DateTime<Utc>,
}

impl BaseAuction {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn initiator(&self) -> Address {
        self.initiator
    }

    pub fn lot(&self) -> &Amount {
        &self.lot
    }

    pub fn bidder(&self) -> Option<Address> {
        self.bidder
    }

    pub fn bid(&self) -> &Amount {
        &self.bid
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn max_end_time(&self) -> DateTime<Utc> {
        self.max_end_time
    }

    /// New end time after an accepted bid at `now`. Never exceeds the
    /// auction's `max_end_time`.
    pub(crate) fn extended_end_time(
        &self,
        now: DateTime<Utc>,
        bid_duration: chrono::TimeDelta,
    ) -> DateTime<Utc> {
        now.checked_add_signed(bid_duration)
            .map_or(self.max_end_time, |end| end.min(self.max_end_time))
    }
}

/// The bid rises while the lot stays fixed. Proceeds are discarded on
/// settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardAuction {
    #[serde(flatten)]
    pub(crate) base: BaseAuction,
}

impl ForwardAuction {
    pub fn base(&self) -> &BaseAuction {
        &self.base
    }

    pub(crate) fn new(
        id: Id,
        initiator: Address,
        lot: Amount,
        bid_denom: Denom,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            base: BaseAuction {
                id,
                initiator,
                lot,
                bidder: None,
                bid: Amount::zero(bid_denom),
                end_time,
                max_end_time: end_time,
            },
        }
    }
}

/// The bid is fixed while bidders compete by accepting an ever smaller lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseAuction {
    #[serde(flatten)]
    pub(crate) base: BaseAuction,
}

impl ReverseAuction {
    pub fn base(&self) -> &BaseAuction {
        &self.base
    }

    pub(crate) fn new(
        id: Id,
        initiator: Address,
        bid: Amount,
        initial_lot: Amount,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            base: BaseAuction {
                id,
                initiator,
                lot: initial_lot,
                bidder: None,
                bid,
                end_time,
                max_end_time: end_time,
            },
        }
    }
}

/// Starts as a forward auction until someone bids `max_bid`, then continues
/// as a reverse auction on the lot. Lot given up in the reverse phase goes to
/// `lot_returns`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardReverseAuction {
    #[serde(flatten)]
    pub(crate) base: BaseAuction,
    pub(crate) max_bid: Amount,
    pub(crate) lot_returns: WeightedBeneficiarySet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Forward,
    Reverse,
}

impl ForwardReverseAuction {
    pub(crate) fn new(
        id: Id,
        initiator: Address,
        lot: Amount,
        max_bid: Amount,
        lot_returns: WeightedBeneficiarySet,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            base: BaseAuction {
                id,
                initiator,
                lot,
                bidder: None,
                bid: Amount::zero(max_bid.denom.clone()),
                end_time,
                max_end_time: end_time,
            },
            max_bid,
            lot_returns,
        }
    }

    pub fn base(&self) -> &BaseAuction {
        &self.base
    }

    pub fn max_bid(&self) -> &Amount {
        &self.max_bid
    }

    pub fn lot_returns(&self) -> &WeightedBeneficiarySet {
        &self.lot_returns
    }

    /// Derived from the bid so it can never disagree with it.
    pub fn phase(&self) -> Phase {
        if self.base.bid.quantity < self.max_bid.quantity {
            Phase::Forward
        } else {
            Phase::Reverse
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Auction {
    Forward(ForwardAuction),
    Reverse(ReverseAuction),
    ForwardReverse(ForwardReverseAuction),
}

impl Auction {
    pub fn base(&self) -> &BaseAuction {
        match self {
            Auction::Forward(auction) => &auction.base,
            Auction::Reverse(auction) => &auction.base,
            Auction::ForwardReverse(auction) => &auction.base,
        }
    }

    pub fn id(&self) -> Id {
        self.base().id
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Auction::Forward(_) => "forward",
            Auction::Reverse(_) => "reverse",
            Auction::ForwardReverse(_) => "forward-reverse",
        }
    }

    /// Whether the auction may be closed at `now`.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.base().end_time
    }

    /// Transfers that finalize the auction.
    ///
    /// With a bidder, the lot goes to the bidder and the bid to wherever the
    /// auction kind sends its proceeds. Without bids, forward and
    /// forward-reverse auctions return the escrowed lot to the initiator,
    /// while a reverse auction has nothing to settle because its lot is only
    /// issued to a winning bidder.
    pub fn settlement(&self) -> Vec<Transfer> {
        let base = self.base();
        let mut plan = Plan::default();
        match (self, base.bidder) {
            (Auction::Forward(_), Some(bidder)) => {
                plan.release(bidder, &base.lot).discard(&base.bid);
            }
            (Auction::Reverse(_), Some(bidder)) => {
                plan.release(base.initiator, &base.bid).issue(bidder, &base.lot);
            }
            (Auction::ForwardReverse(_), Some(bidder)) => {
                plan.release(bidder, &base.lot)
                    .release(base.initiator, &base.bid);
            }
            (Auction::Forward(_) | Auction::ForwardReverse(_), None) => {
                plan.release(base.initiator, &base.lot);
            }
            (Auction::Reverse(_), None) => {}
        }
        plan.into_transfers()
    }
}
