//! Deterministic auction engine for liquidating collateral and raising or
//! spending protocol reserves.
//!
//! Every operation receives the current block time as an argument, so the
//! same inputs produce the same state and the same fund movements on every
//! node. The crate is split into:
//!
//! - `primitives`: denominations, amounts and participant addresses
//! - `beneficiaries`: weighted surplus recipients and the largest-remainder
//!   split
//! - `auction`: the forward, reverse and forward-reverse records
//! - `bidding`: pure bid validation producing the next record and the
//!   required transfers
//! - `transfer`: fund movements and their compensation
//! - `keeper`: starts, bids on and closes auctions against a [`Store`] and a
//!   [`Ledger`]

pub mod auction;
pub mod beneficiaries;
pub mod bidding;
pub mod error;
pub mod keeper;
pub mod ledger;
pub mod primitives;
pub mod store;
pub mod transfer;

pub use {
    auction::{Auction, BaseAuction, ForwardAuction, ForwardReverseAuction, Phase, ReverseAuction},
    beneficiaries::WeightedBeneficiarySet,
    bidding::{Bid, Outcome},
    error::{Error, ValidationError},
    keeper::Keeper,
    ledger::{Ledger, LedgerError},
    primitives::{Address, Amount, Denom, Id},
    store::Store,
    transfer::Transfer,
};
