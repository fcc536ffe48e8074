//! Auction lifecycle: start, bid, close.

use {
    crate::{
        auction::{Auction, ForwardAuction, ForwardReverseAuction, ReverseAuction},
        beneficiaries::WeightedBeneficiarySet,
        bidding::{self, Bid},
        error::{Error, ValidationError},
        ledger::{Ledger, LedgerError},
        primitives::{Address, Amount, Denom, Id},
        store::Store,
        transfer::{self, Plan, Transfer},
    },
    anyhow::Context,
    chrono::{DateTime, TimeDelta, Utc},
    num::BigInt,
    tracing::instrument,
};

/// Runs auctions against a [`Store`] and a [`Ledger`].
///
/// Every operation either completes or fails without leaving a trace in the
/// store or the ledger. The caller provides the current block time, the
/// keeper never reads a clock.
#[derive(Debug)]
pub struct Keeper<S, L> {
    store: S,
    ledger: L,
    max_auction_duration: TimeDelta,
    bid_duration: TimeDelta,
}

impl<S: Store, L: Ledger> Keeper<S, L> {
    pub fn new(store: S, ledger: L, params: &configs::auction::Params) -> anyhow::Result<Self> {
        params.validate()?;
        Ok(Self {
            store,
            ledger,
            max_auction_duration: TimeDelta::from_std(params.max_auction_duration)
                .context("max auction duration out of range")?,
            bid_duration: TimeDelta::from_std(params.bid_duration)
                .context("bid duration out of range")?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Auctions `lot` for the highest bid in `bid_denom`. The lot is escrowed
    /// from `initiator` right away.
    #[instrument(skip_all, fields(initiator = %initiator, lot = %lot, bid_denom = %bid_denom))]
    pub fn start_forward_auction(
        &mut self,
        initiator: Address,
        lot: Amount,
        bid_denom: Denom,
        now: DateTime<Utc>,
    ) -> Result<Id, Error> {
        ensure_non_zero(&lot, "lot")?;
        let end_time = self.prepare_start(&initiator, now)?;
        let mut plan = Plan::default();
        plan.escrow(initiator, &lot);
        self.start(plan, |id| {
            Auction::Forward(ForwardAuction::new(id, initiator, lot, bid_denom, end_time))
        })
    }

    /// Raises the fixed amount `bid` by offering up to `initial_lot`, which
    /// is issued to the winner when the auction closes. Nothing is escrowed
    /// at start.
    #[instrument(skip_all, fields(initiator = %initiator, bid = %bid, initial_lot = %initial_lot))]
    pub fn start_reverse_auction(
        &mut self,
        initiator: Address,
        bid: Amount,
        initial_lot: Amount,
        now: DateTime<Utc>,
    ) -> Result<Id, Error> {
        ensure_non_zero(&bid, "bid")?;
        ensure_non_zero(&initial_lot, "initial lot")?;
        let end_time = self.prepare_start(&initiator, now)?;
        self.start(Plan::default(), |id| {
            Auction::Reverse(ReverseAuction::new(
                id,
                initiator,
                bid,
                initial_lot,
                end_time,
            ))
        })
    }

    /// Auctions `lot` for up to `max_bid`. Lot given up after the bid
    /// reaches `max_bid` is split between `beneficiaries` by `weights`.
    #[instrument(skip_all, fields(initiator = %initiator, lot = %lot, max_bid = %max_bid))]
    pub fn start_forward_reverse_auction(
        &mut self,
        initiator: Address,
        lot: Amount,
        max_bid: Amount,
        beneficiaries: Vec<Address>,
        weights: Vec<BigInt>,
        now: DateTime<Utc>,
    ) -> Result<Id, Error> {
        ensure_non_zero(&lot, "lot")?;
        ensure_non_zero(&max_bid, "max bid")?;
        let lot_returns =
            WeightedBeneficiarySet::new(beneficiaries, weights).map_err(ValidationError::from)?;
        let end_time = self.prepare_start(&initiator, now)?;
        let mut plan = Plan::default();
        plan.escrow(initiator, &lot);
        self.start(plan, |id| {
            Auction::ForwardReverse(ForwardReverseAuction::new(
                id,
                initiator,
                lot,
                max_bid,
                lot_returns,
                end_time,
            ))
        })
    }

    #[instrument(skip_all, fields(id = id, bidder = %bidder, lot = %lot, bid = %bid))]
    pub fn place_bid(
        &mut self,
        id: Id,
        bidder: Address,
        lot: Amount,
        bid: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let auction = self.store.get(id).ok_or(Error::AuctionNotFound(id))?;
        let outcome = bidding::place(
            &auction,
            &Bid { bidder, lot, bid },
            now,
            self.bid_duration,
        )?;
        transfer::execute(&mut self.ledger, &outcome.transfers)?;
        tracing::debug!(
            kind = outcome.auction.kind(),
            end_time = %outcome.auction.base().end_time,
            transfers = outcome.transfers.len(),
            "bid accepted"
        );
        self.store.put(outcome.auction);
        Ok(())
    }

    /// Settles an auction whose end time has been reached and removes it.
    #[instrument(skip_all, fields(id = id))]
    pub fn close_auction(&mut self, id: Id, now: DateTime<Utc>) -> Result<(), Error> {
        let auction = self.store.get(id).ok_or(Error::AuctionNotFound(id))?;
        if !auction.has_expired(now) {
            return Err(Error::AuctionNotExpired {
                id,
                end_time: auction.base().end_time,
            });
        }
        let settlement = auction.settlement();
        transfer::execute(&mut self.ledger, &settlement)?;
        self.store.delete(id);
        tracing::info!(
            kind = auction.kind(),
            winner = ?auction.base().bidder,
            lot = %auction.base().lot,
            bid = %auction.base().bid,
            "auction closed"
        );
        Ok(())
    }

    /// Closes every auction that has reached its end time, returning the
    /// closed ids. Auctions that fail to close stay in the store.
    #[instrument(skip_all)]
    pub fn close_expired_auctions(&mut self, now: DateTime<Utc>) -> Vec<Id> {
        let expired: Vec<Id> = self
            .auctions()
            .into_iter()
            .filter(|auction| auction.has_expired(now))
            .map(|auction| auction.id())
            .collect();
        expired
            .into_iter()
            .filter(|id| match self.close_auction(*id, now) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(id = *id, ?err, "failed to close expired auction");
                    false
                }
            })
            .collect()
    }

    pub fn get_auction(&self, id: Id) -> Option<Auction> {
        self.store.get(id)
    }

    /// All live auctions ordered by id.
    pub fn auctions(&self) -> Vec<Auction> {
        self.store
            .ids()
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    /// Checks shared by every start operation and returns the end time of
    /// the new auction.
    fn prepare_start(
        &self,
        initiator: &Address,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, Error> {
        if !self.ledger.account_exists(initiator) {
            return Err(LedgerError::UnknownAccount(*initiator).into());
        }
        now.checked_add_signed(self.max_auction_duration)
            .ok_or(ValidationError::TimeOverflow.into())
    }

    /// Moves the funds in `plan` and only then assigns an id, so that a
    /// failed start consumes none.
    fn start(&mut self, plan: Plan, auction: impl FnOnce(Id) -> Auction) -> Result<Id, Error> {
        let transfers: Vec<Transfer> = plan.into_transfers();
        transfer::execute(&mut self.ledger, &transfers)?;
        let auction = auction(self.store.next_id());
        let id = auction.id();
        tracing::info!(
            id,
            kind = auction.kind(),
            end_time = %auction.base().end_time,
            "auction started"
        );
        self.store.put(auction);
        Ok(id)
    }
}

fn ensure_non_zero(amount: &Amount, what: &'static str) -> Result<(), ValidationError> {
    if amount.is_zero() {
        return Err(ValidationError::ZeroAmount(what));
    }
    Ok(())
}
