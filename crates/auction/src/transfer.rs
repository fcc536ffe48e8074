//! Fund movements requested from the [`Ledger`].

use {
    crate::{
        ledger::{Ledger, LedgerError},
        primitives::{Address, Amount},
    },
    std::fmt,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    Escrow { from: Address, amount: Amount },
    Release { to: Address, amount: Amount },
    Discard { amount: Amount },
    Issue { to: Address, amount: Amount },
}

impl Transfer {
    fn apply<L: Ledger + ?Sized>(&self, ledger: &mut L) -> Result<(), LedgerError> {
        match self {
            Transfer::Escrow { from, amount } => ledger.escrow(from, amount),
            Transfer::Release { to, amount } => ledger.release(to, amount),
            Transfer::Discard { amount } => ledger.discard(amount),
            Transfer::Issue { to, amount } => ledger.issue(to, amount),
        }
    }

    /// Transfers undoing a successfully applied `self`.
    ///
    /// Discarded funds are gone for good, which is why a plan only ever
    /// discards in its last step.
    fn compensation(&self) -> Vec<Transfer> {
        match self {
            Transfer::Escrow { from, amount } => vec![Transfer::Release {
                to: *from,
                amount: amount.clone(),
            }],
            Transfer::Release { to, amount } => vec![Transfer::Escrow {
                from: *to,
                amount: amount.clone(),
            }],
            Transfer::Issue { to, amount } => vec![
                Transfer::Escrow {
                    from: *to,
                    amount: amount.clone(),
                },
                Transfer::Discard {
                    amount: amount.clone(),
                },
            ],
            Transfer::Discard { .. } => vec![],
        }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transfer::Escrow { from, amount } => write!(f, "escrow {amount} from {from}"),
            Transfer::Release { to, amount } => write!(f, "release {amount} to {to}"),
            Transfer::Discard { amount } => write!(f, "discard {amount}"),
            Transfer::Issue { to, amount } => write!(f, "issue {amount} to {to}"),
        }
    }
}

/// Ordered list of transfers under construction. Zero amounts are dropped.
#[derive(Debug, Default)]
pub(crate) struct Plan(Vec<Transfer>);

impl Plan {
    pub fn escrow(&mut self, from: Address, amount: &Amount) -> &mut Self {
        self.push(Transfer::Escrow {
            from,
            amount: amount.clone(),
        })
    }

    pub fn release(&mut self, to: Address, amount: &Amount) -> &mut Self {
        self.push(Transfer::Release {
            to,
            amount: amount.clone(),
        })
    }

    pub fn discard(&mut self, amount: &Amount) -> &mut Self {
        self.push(Transfer::Discard {
            amount: amount.clone(),
        })
    }

    pub fn issue(&mut self, to: Address, amount: &Amount) -> &mut Self {
        self.push(Transfer::Issue {
            to,
            amount: amount.clone(),
        })
    }

    fn push(&mut self, transfer: Transfer) -> &mut Self {
        let amount = match &transfer {
            Transfer::Escrow { amount, .. }
            | Transfer::Release { amount, .. }
            | Transfer::Discard { amount }
            | Transfer::Issue { amount, .. } => amount,
        };
        if !amount.is_zero() {
            self.0.push(transfer);
        }
        self
    }

    pub fn into_transfers(self) -> Vec<Transfer> {
        self.0
    }
}

/// Applies `transfers` in order, all or nothing.
///
/// When a transfer fails, the ones already applied are compensated in
/// reverse order and the original error is returned.
pub fn execute<L: Ledger + ?Sized>(
    ledger: &mut L,
    transfers: &[Transfer],
) -> Result<(), LedgerError> {
    for (index, transfer) in transfers.iter().enumerate() {
        if let Err(err) = transfer.apply(ledger) {
            tracing::warn!(%transfer, ?err, applied = index, "transfer failed, compensating");
            for applied in transfers[..index].iter().rev() {
                for compensation in applied.compensation() {
                    if let Err(err) = compensation.apply(ledger) {
                        tracing::error!(%compensation, ?err, "failed to compensate transfer");
                    }
                }
            }
            return Err(err);
        }
    }
    Ok(())
}
