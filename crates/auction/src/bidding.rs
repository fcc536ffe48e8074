//! Bid validation.
//!
//! These functions are pure: they never touch the store or the ledger. An
//! accepted bid yields the next auction record together with the transfers
//! the ledger has to carry out; a rejected bid yields an error and leaves the
//! given record untouched.

use {
    crate::{
        auction::{
            Auction,
            BaseAuction,
            ForwardAuction,
            ForwardReverseAuction,
            Phase,
            ReverseAuction,
        },
        error::ValidationError,
        primitives::{Address, Amount},
        transfer::{Plan, Transfer},
    },
    chrono::{DateTime, TimeDelta, Utc},
    std::cmp::Ordering,
};

/// A bid as submitted by a participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    pub bidder: Address,
    pub lot: Amount,
    pub bid: Amount,
}

/// An accepted bid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// The record after the bid.
    pub auction: Auction,
    /// Refund of the previous offer, escrow of the new one and any surplus
    /// released to beneficiaries, in that order.
    pub transfers: Vec<Transfer>,
}

/// Validates `bid` against `auction` at time `now`.
///
/// Every accepted bid moves the end time to `now + bid_duration`, capped at
/// the auction's max end time.
pub fn place(
    auction: &Auction,
    bid: &Bid,
    now: DateTime<Utc>,
    bid_duration: TimeDelta,
) -> Result<Outcome, ValidationError> {
    match auction {
        Auction::Forward(auction) => forward(auction, bid, now, bid_duration),
        Auction::Reverse(auction) => reverse(auction, bid, now, bid_duration),
        Auction::ForwardReverse(auction) => forward_reverse(auction, bid, now, bid_duration),
    }
}

fn forward(
    auction: &ForwardAuction,
    bid: &Bid,
    now: DateTime<Utc>,
    bid_duration: TimeDelta,
) -> Result<Outcome, ValidationError> {
    let base = &auction.base;
    if bid.lot != base.lot {
        return Err(ValidationError::LotMismatch {
            expected: base.lot.clone(),
            got: bid.lot.clone(),
        });
    }
    if base.bid.checked_cmp(&bid.bid)? != Ordering::Less {
        return Err(ValidationError::BidNotIncreasing {
            current: base.bid.clone(),
            proposed: bid.bid.clone(),
        });
    }
    ensure_open(base, now)?;

    let mut plan = Plan::default();
    outbid(&mut plan, base, bid.bidder, &bid.bid);

    let mut next = auction.clone();
    next.base.bidder = Some(bid.bidder);
    next.base.bid = bid.bid.clone();
    next.base.end_time = base.extended_end_time(now, bid_duration);
    Ok(Outcome {
        auction: Auction::Forward(next),
        transfers: plan.into_transfers(),
    })
}

fn reverse(
    auction: &ReverseAuction,
    bid: &Bid,
    now: DateTime<Utc>,
    bid_duration: TimeDelta,
) -> Result<Outcome, ValidationError> {
    let base = &auction.base;
    if base.bid.checked_cmp(&bid.bid)? != Ordering::Equal {
        return Err(ValidationError::BidMismatch {
            expected: base.bid.clone(),
            got: bid.bid.clone(),
        });
    }
    if bid.lot.checked_cmp(&base.lot)? != Ordering::Less {
        return Err(ValidationError::LotNotDecreasing {
            current: base.lot.clone(),
            proposed: bid.lot.clone(),
        });
    }
    ensure_open(base, now)?;

    let mut plan = Plan::default();
    outbid(&mut plan, base, bid.bidder, &base.bid);

    let mut next = auction.clone();
    next.base.bidder = Some(bid.bidder);
    next.base.lot = bid.lot.clone();
    next.base.end_time = base.extended_end_time(now, bid_duration);
    Ok(Outcome {
        auction: Auction::Reverse(next),
        transfers: plan.into_transfers(),
    })
}

fn forward_reverse(
    auction: &ForwardReverseAuction,
    bid: &Bid,
    now: DateTime<Utc>,
    bid_duration: TimeDelta,
) -> Result<Outcome, ValidationError> {
    let base = &auction.base;
    let bid_order = bid.bid.checked_cmp(&base.bid)?;
    let lot_order = bid.lot.checked_cmp(&base.lot)?;

    match auction.phase() {
        Phase::Forward => {
            match lot_order {
                Ordering::Greater => {
                    return Err(ValidationError::LotOutOfBounds {
                        current: base.lot.clone(),
                        proposed: bid.lot.clone(),
                    });
                }
                Ordering::Less if bid.bid != auction.max_bid => {
                    return Err(ValidationError::CannotEnterReversePhase {
                        max_bid: auction.max_bid.clone(),
                    });
                }
                _ => {}
            }
            if bid_order != Ordering::Greater {
                return Err(ValidationError::PhaseForwardBidNotIncreasing {
                    current: base.bid.clone(),
                    proposed: bid.bid.clone(),
                });
            }
            if bid.bid.quantity > auction.max_bid.quantity {
                return Err(ValidationError::BidExceedsMaxBid {
                    max_bid: auction.max_bid.clone(),
                    proposed: bid.bid.clone(),
                });
            }
        }
        Phase::Reverse => {
            if bid_order != Ordering::Equal {
                return Err(ValidationError::PhaseReverseBidChanged {
                    max_bid: auction.max_bid.clone(),
                    proposed: bid.bid.clone(),
                });
            }
            if lot_order != Ordering::Less {
                return Err(ValidationError::PhaseReverseLotNotDecreasing {
                    current: base.lot.clone(),
                    proposed: bid.lot.clone(),
                });
            }
        }
    }
    ensure_open(base, now)?;

    let mut plan = Plan::default();
    outbid(&mut plan, base, bid.bidder, &bid.bid);

    let surplus = base.lot.checked_sub(&bid.lot)?;
    let shares = auction.lot_returns.split(&surplus.quantity);
    for (participant, share) in auction.lot_returns.participants().iter().zip(shares) {
        plan.release(*participant, &Amount::new(surplus.denom.clone(), share));
    }

    let mut next = auction.clone();
    next.base.bidder = Some(bid.bidder);
    next.base.bid = bid.bid.clone();
    next.base.lot = bid.lot.clone();
    next.base.end_time = base.extended_end_time(now, bid_duration);
    Ok(Outcome {
        auction: Auction::ForwardReverse(next),
        transfers: plan.into_transfers(),
    })
}

/// Bids are accepted strictly before the end time.
fn ensure_open(base: &BaseAuction, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if now >= base.end_time {
        return Err(ValidationError::AuctionExpired {
            end_time: base.end_time,
        });
    }
    Ok(())
}

/// Refunds the previous bidder, then escrows the new offer. Refunding first
/// lets a bidder raise their own bid with the funds it frees up.
fn outbid(plan: &mut Plan, base: &BaseAuction, bidder: Address, offer: &Amount) {
    if let Some(previous) = base.bidder {
        plan.release(previous, &base.bid);
    }
    plan.escrow(bidder, offer);
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            beneficiaries::WeightedBeneficiarySet,
            primitives::{AmountError, Denom},
        },
        num::{BigInt, BigUint},
    };

    fn bid_duration() -> TimeDelta {
        TimeDelta::seconds(100)
    }

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn c(denom: &str, quantity: u64) -> Amount {
        Amount::test(denom, quantity)
    }

    fn seller() -> Address {
        Address::with_last_byte(0xaa)
    }

    fn buyer1() -> Address {
        Address::with_last_byte(1)
    }

    fn buyer2() -> Address {
        Address::with_last_byte(2)
    }

    fn bid(bidder: Address, lot: Amount, bid: Amount) -> Bid {
        Bid { bidder, lot, bid }
    }

    fn base(lot: Amount, bid: Amount, bidder: Option<Address>) -> BaseAuction {
        BaseAuction {
            id: 0,
            initiator: seller(),
            lot,
            bidder,
            bid,
            end_time: time(10_000),
            max_end_time: time(10_000),
        }
    }

    fn forward_auction() -> Auction {
        Auction::Forward(ForwardAuction {
            base: base(c("usdx", 100), c("ukava", 6), Some(buyer1())),
        })
    }

    fn reverse_auction() -> Auction {
        Auction::Reverse(ReverseAuction {
            base: base(c("ukava", 10), c("usdx", 100), Some(buyer1())),
        })
    }

    fn cdp_owners() -> WeightedBeneficiarySet {
        WeightedBeneficiarySet::new(
            vec![
                Address::with_last_byte(0x10),
                Address::with_last_byte(0x11),
                Address::with_last_byte(0x12),
            ],
            vec![BigInt::from(30), BigInt::from(20), BigInt::from(10)],
        )
        .unwrap()
    }

    fn forward_reverse_auction(lot: u64, current_bid: u64) -> Auction {
        Auction::ForwardReverse(ForwardReverseAuction {
            base: base(c("xrp", lot), c("usdx", current_bid), Some(buyer1())),
            max_bid: c("usdx", 10),
            lot_returns: cdp_owners(),
        })
    }

    #[test]
    fn forward_bid() {
        let auction = forward_auction();
        let outcome = place(
            &auction,
            &bid(buyer2(), c("usdx", 100), c("ukava", 10)),
            time(10),
            bid_duration(),
        )
        .unwrap();

        assert_eq!(
            outcome.transfers,
            vec![
                Transfer::Release {
                    to: buyer1(),
                    amount: c("ukava", 6)
                },
                Transfer::Escrow {
                    from: buyer2(),
                    amount: c("ukava", 10)
                },
            ]
        );
        let next = outcome.auction.base();
        assert_eq!(next.bidder, Some(buyer2()));
        assert_eq!(next.bid, c("ukava", 10));
        assert_eq!(next.lot, c("usdx", 100));
        assert_eq!(next.end_time, time(110));
        assert_eq!(next.max_end_time, time(10_000));
    }

    #[test]
    fn first_forward_bid_refunds_nobody() {
        let auction = Auction::Forward(ForwardAuction {
            base: base(c("usdx", 100), c("ukava", 0), None),
        });
        let outcome = place(
            &auction,
            &bid(buyer1(), c("usdx", 100), c("ukava", 1)),
            time(10),
            bid_duration(),
        )
        .unwrap();
        assert_eq!(
            outcome.transfers,
            vec![Transfer::Escrow {
                from: buyer1(),
                amount: c("ukava", 1)
            }]
        );
    }

    #[test]
    fn forward_bid_rejections() {
        let auction = forward_auction();
        let reject = |lot, amount, now| {
            place(&auction, &bid(buyer2(), lot, amount), now, bid_duration()).unwrap_err()
        };

        assert_eq!(
            reject(c("usdx", 99), c("ukava", 10), time(10)),
            ValidationError::LotMismatch {
                expected: c("usdx", 100),
                got: c("usdx", 99)
            }
        );
        assert!(matches!(
            reject(c("xrp", 100), c("ukava", 10), time(10)),
            ValidationError::LotMismatch { .. }
        ));
        assert_eq!(
            reject(c("usdx", 100), c("badtoken", 10), time(10)),
            ValidationError::Amount(AmountError::DenomMismatch {
                expected: Denom::new("ukava").unwrap(),
                got: Denom::new("badtoken").unwrap()
            })
        );
        assert_eq!(
            reject(c("usdx", 100), c("ukava", 5), time(10)),
            ValidationError::BidNotIncreasing {
                current: c("ukava", 6),
                proposed: c("ukava", 5)
            }
        );
        assert!(matches!(
            reject(c("usdx", 100), c("ukava", 6), time(10)),
            ValidationError::BidNotIncreasing { .. }
        ));
        assert_eq!(
            reject(c("usdx", 100), c("ukava", 10), time(10_001)),
            ValidationError::AuctionExpired {
                end_time: time(10_000)
            }
        );
    }

    #[test]
    fn bids_at_end_time_are_rejected() {
        let auction = forward_auction();
        let offer = bid(buyer2(), c("usdx", 100), c("ukava", 10));
        assert!(matches!(
            place(&auction, &offer, time(10_000), bid_duration()),
            Err(ValidationError::AuctionExpired { .. })
        ));
        assert!(place(&auction, &offer, time(9_999), bid_duration()).is_ok());
    }

    #[test]
    fn end_time_is_capped_at_max_end_time() {
        let auction = forward_auction();
        let outcome = place(
            &auction,
            &bid(buyer2(), c("usdx", 100), c("ukava", 10)),
            time(9_999),
            bid_duration(),
        )
        .unwrap();
        assert_eq!(outcome.auction.base().end_time, time(10_000));
    }

    #[test]
    fn reverse_bid() {
        let auction = reverse_auction();
        let outcome = place(
            &auction,
            &bid(buyer2(), c("ukava", 9), c("usdx", 100)),
            time(10),
            bid_duration(),
        )
        .unwrap();

        assert_eq!(
            outcome.transfers,
            vec![
                Transfer::Release {
                    to: buyer1(),
                    amount: c("usdx", 100)
                },
                Transfer::Escrow {
                    from: buyer2(),
                    amount: c("usdx", 100)
                },
            ]
        );
        let next = outcome.auction.base();
        assert_eq!(next.bidder, Some(buyer2()));
        assert_eq!(next.lot, c("ukava", 9));
        assert_eq!(next.bid, c("usdx", 100));
        assert_eq!(next.end_time, time(110));
    }

    #[test]
    fn reverse_bid_rejections() {
        let auction = reverse_auction();
        let reject = |lot, amount, now| {
            place(&auction, &bid(buyer2(), lot, amount), now, bid_duration()).unwrap_err()
        };

        assert_eq!(
            reject(c("ukava", 11), c("usdx", 100), time(10)),
            ValidationError::LotNotDecreasing {
                current: c("ukava", 10),
                proposed: c("ukava", 11)
            }
        );
        assert!(matches!(
            reject(c("ukava", 10), c("usdx", 100), time(10)),
            ValidationError::LotNotDecreasing { .. }
        ));
        assert!(matches!(
            reject(c("badtoken", 9), c("usdx", 100), time(10)),
            ValidationError::Amount(AmountError::DenomMismatch { .. })
        ));
        assert!(matches!(
            reject(c("ukava", 9), c("badtoken", 100), time(10)),
            ValidationError::Amount(AmountError::DenomMismatch { .. })
        ));
        assert_eq!(
            reject(c("ukava", 9), c("usdx", 99), time(10)),
            ValidationError::BidMismatch {
                expected: c("usdx", 100),
                got: c("usdx", 99)
            }
        );
        assert!(matches!(
            reject(c("ukava", 9), c("usdx", 100), time(10_001)),
            ValidationError::AuctionExpired { .. }
        ));
    }

    #[test]
    fn forward_reverse_forward_phase_bid() {
        let auction = forward_reverse_auction(100, 5);
        let outcome = place(
            &auction,
            &bid(buyer2(), c("xrp", 100), c("usdx", 6)),
            time(10),
            bid_duration(),
        )
        .unwrap();

        assert_eq!(
            outcome.transfers,
            vec![
                Transfer::Release {
                    to: buyer1(),
                    amount: c("usdx", 5)
                },
                Transfer::Escrow {
                    from: buyer2(),
                    amount: c("usdx", 6)
                },
            ]
        );
        let Auction::ForwardReverse(next) = outcome.auction else {
            panic!("auction kind changed");
        };
        assert_eq!(next.base.bid, c("usdx", 6));
        assert_eq!(next.base.lot, c("xrp", 100));
        assert_eq!(next.base.end_time, time(110));
        assert_eq!(next.phase(), Phase::Forward);
    }

    #[test]
    fn forward_reverse_switch_over_bid() {
        let auction = forward_reverse_auction(100, 5);
        let outcome = place(
            &auction,
            &bid(buyer2(), c("xrp", 99), c("usdx", 10)),
            time(10),
            bid_duration(),
        )
        .unwrap();

        assert_eq!(
            outcome.transfers,
            vec![
                Transfer::Release {
                    to: buyer1(),
                    amount: c("usdx", 5)
                },
                Transfer::Escrow {
                    from: buyer2(),
                    amount: c("usdx", 10)
                },
                Transfer::Release {
                    to: Address::with_last_byte(0x10),
                    amount: c("xrp", 1)
                },
            ]
        );
        let Auction::ForwardReverse(next) = outcome.auction else {
            panic!("auction kind changed");
        };
        assert_eq!(next.base.lot, c("xrp", 99));
        assert_eq!(next.phase(), Phase::Reverse);
    }

    #[test]
    fn forward_reverse_reverse_phase_bid() {
        let auction = forward_reverse_auction(20, 10);
        let outcome = place(
            &auction,
            &bid(buyer2(), c("xrp", 15), c("usdx", 10)),
            time(10),
            bid_duration(),
        )
        .unwrap();

        assert_eq!(
            outcome.transfers,
            vec![
                Transfer::Release {
                    to: buyer1(),
                    amount: c("usdx", 10)
                },
                Transfer::Escrow {
                    from: buyer2(),
                    amount: c("usdx", 10)
                },
                Transfer::Release {
                    to: Address::with_last_byte(0x10),
                    amount: c("xrp", 2)
                },
                Transfer::Release {
                    to: Address::with_last_byte(0x11),
                    amount: c("xrp", 2)
                },
                Transfer::Release {
                    to: Address::with_last_byte(0x12),
                    amount: c("xrp", 1)
                },
            ]
        );
        assert_eq!(outcome.auction.base().lot, c("xrp", 15));
        assert_eq!(outcome.auction.base().bid, c("usdx", 10));
    }

    #[test]
    fn forward_reverse_rejections() {
        let forward_phase = forward_reverse_auction(20, 5);
        let reverse_phase = forward_reverse_auction(20, 10);
        let reject = |auction: &Auction, lot, amount| {
            place(auction, &bid(buyer2(), lot, amount), time(10), bid_duration()).unwrap_err()
        };

        assert_eq!(
            reject(&forward_phase, c("xrp", 30), c("usdx", 6)),
            ValidationError::LotOutOfBounds {
                current: c("xrp", 20),
                proposed: c("xrp", 30)
            }
        );
        assert_eq!(
            reject(&forward_phase, c("xrp", 15), c("usdx", 6)),
            ValidationError::CannotEnterReversePhase {
                max_bid: c("usdx", 10)
            }
        );
        assert!(matches!(
            reject(&forward_phase, c("xrp", 20), c("usdx", 5)),
            ValidationError::PhaseForwardBidNotIncreasing { .. }
        ));
        assert!(matches!(
            reject(&forward_phase, c("xrp", 20), c("usdx", 0)),
            ValidationError::PhaseForwardBidNotIncreasing { .. }
        ));
        assert_eq!(
            reject(&forward_phase, c("xrp", 20), c("usdx", 11)),
            ValidationError::BidExceedsMaxBid {
                max_bid: c("usdx", 10),
                proposed: c("usdx", 11)
            }
        );
        assert!(matches!(
            reject(&forward_phase, c("btc", 20), c("usdx", 6)),
            ValidationError::Amount(AmountError::DenomMismatch { .. })
        ));

        assert!(matches!(
            reject(&reverse_phase, c("xrp", 20), c("usdx", 10)),
            ValidationError::PhaseReverseLotNotDecreasing { .. }
        ));
        assert!(matches!(
            reject(&reverse_phase, c("xrp", 21), c("usdx", 10)),
            ValidationError::PhaseReverseLotNotDecreasing { .. }
        ));
        assert_eq!(
            reject(&reverse_phase, c("xrp", 15), c("usdx", 11)),
            ValidationError::PhaseReverseBidChanged {
                max_bid: c("usdx", 10),
                proposed: c("usdx", 11)
            }
        );
        assert!(matches!(
            reject(&reverse_phase, c("xrp", 15), c("usdx", 9)),
            ValidationError::PhaseReverseBidChanged { .. }
        ));
    }

    #[test]
    fn bid_sequence_keeps_invariants() {
        let mut auction = Auction::ForwardReverse(ForwardReverseAuction {
            base: base(c("xrp", 1_000), c("usdx", 0), None),
            max_bid: c("usdx", 500),
            lot_returns: cdp_owners(),
        });
        let bids = [
            (0x21, 1_000, 100, 9_800),
            (0x22, 1_000, 250, 9_850),
            (0x21, 1_000, 499, 9_900),
            (0x22, 900, 500, 9_950),
            (0x23, 899, 500, 9_990),
            (0x21, 1, 500, 9_999),
        ];
        let mut surplus = 0;
        for (bidder, lot, amount, now) in bids {
            let previous = auction.base().clone();
            let outcome = place(
                &auction,
                &bid(Address::with_last_byte(bidder), c("xrp", lot), c("usdx", amount)),
                time(now),
                bid_duration(),
            )
            .unwrap();

            let next = outcome.auction.base();
            assert!(next.end_time <= next.max_end_time);
            assert_eq!(
                next.end_time,
                (time(now) + bid_duration()).min(previous.max_end_time)
            );
            if previous.bid.quantity < BigUint::from(500u32) {
                assert!(next.bid.quantity > previous.bid.quantity);
            } else {
                assert_eq!(next.bid, previous.bid);
                assert!(next.lot.quantity < previous.lot.quantity);
            }
            surplus += outcome
                .transfers
                .iter()
                .filter_map(|transfer| match transfer {
                    Transfer::Release { amount, .. } if amount.denom.as_str() == "xrp" => {
                        Some(u64::try_from(&amount.quantity).unwrap())
                    }
                    _ => None,
                })
                .sum::<u64>();
            auction = outcome.auction;
        }
        assert_eq!(surplus, 999);
        assert_eq!(auction.base().lot, c("xrp", 1));
    }
}
