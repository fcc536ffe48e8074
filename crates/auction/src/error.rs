use {
    crate::{
        beneficiaries::BeneficiaryError,
        ledger::LedgerError,
        primitives::{Amount, AmountError, Id},
    },
    chrono::{DateTime, Utc},
    thiserror::Error,
};

/// Everything an auction operation can fail with.
///
/// No variant leaves partial state behind: the store and the ledger look
/// exactly as they did before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("auction {0} not found")]
    AuctionNotFound(Id),
    #[error("auction {id} can't be closed before {end_time}")]
    AuctionNotExpired { id: Id, end_time: DateTime<Utc> },
}

/// Rejected auction parameters or bids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("invalid beneficiaries: {0}")]
    Beneficiaries(#[from] BeneficiaryError),
    #[error("{0} must not be zero")]
    ZeroAmount(&'static str),
    #[error("auction duration overflows the representable time range")]
    TimeOverflow,
    #[error("auction ended at {end_time}")]
    AuctionExpired { end_time: DateTime<Utc> },

    // forward auctions
    #[error("lot {got} doesn't match auction lot {expected}")]
    LotMismatch { expected: Amount, got: Amount },
    #[error("bid {proposed} not greater than last bid {current}")]
    BidNotIncreasing { current: Amount, proposed: Amount },

    // reverse auctions
    #[error("bid {got} doesn't match the fixed auction bid {expected}")]
    BidMismatch { expected: Amount, got: Amount },
    #[error("lot {proposed} not smaller than last lot {current}")]
    LotNotDecreasing { current: Amount, proposed: Amount },

    // forward-reverse auctions
    #[error("lot {proposed} out of bounds, auction lot is {current}")]
    LotOutOfBounds { current: Amount, proposed: Amount },
    #[error("auction cannot enter reverse phase without bidding max bid {max_bid}")]
    CannotEnterReversePhase { max_bid: Amount },
    #[error("auction in forward phase, new bid {proposed} not higher than last bid {current}")]
    PhaseForwardBidNotIncreasing { current: Amount, proposed: Amount },
    #[error("bid {proposed} higher than max bid {max_bid}")]
    BidExceedsMaxBid { max_bid: Amount, proposed: Amount },
    #[error("auction in reverse phase, bid {proposed} must stay at max bid {max_bid}")]
    PhaseReverseBidChanged { max_bid: Amount, proposed: Amount },
    #[error("auction in reverse phase, new lot {proposed} not less than previous lot {current}")]
    PhaseReverseLotNotDecreasing { current: Amount, proposed: Amount },
}
