//! Interface to the account balances auctions move funds between.

use {
    crate::primitives::{Address, Amount},
    num::BigUint,
    thiserror::Error,
};

/// Balance keeping collaborator.
///
/// The ledger owns the escrow account holding lots and bids of running
/// auctions as well as the sink discarded funds go to. Every call is atomic:
/// it either moves the whole amount or fails without effect. Undoing a
/// successful call is the caller's job, by issuing the opposite call.
#[cfg_attr(test, mockall::automock)]
pub trait Ledger {
    /// Whether `account` is known and able to hold funds.
    fn account_exists(&self, account: &Address) -> bool;

    /// Moves `amount` from `from` into escrow.
    fn escrow(&mut self, from: &Address, amount: &Amount) -> Result<(), LedgerError>;

    /// Moves `amount` out of escrow to `to`.
    fn release(&mut self, to: &Address, amount: &Amount) -> Result<(), LedgerError>;

    /// Destroys `amount` held in escrow (e.g. burns auction proceeds).
    fn discard(&mut self, amount: &Amount) -> Result<(), LedgerError>;

    /// Creates `amount` and credits it to `to` (e.g. mints a reverse auction
    /// lot).
    fn issue(&mut self, to: &Address, amount: &Amount) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account {0} does not exist")]
    UnknownAccount(Address),
    #[error("account {account} holds {available} but {required} is required")]
    InsufficientFunds {
        account: Address,
        required: Amount,
        available: BigUint,
    },
    #[error("escrow holds {available} but {required} is required")]
    InsufficientEscrow { required: Amount, available: BigUint },
}

#[cfg(any(test, feature = "test-util"))]
pub use in_memory::InMemory;

#[cfg(any(test, feature = "test-util"))]
mod in_memory {
    use {
        super::{Ledger, LedgerError},
        crate::primitives::{Address, Amount, Denom},
        num::BigUint,
        std::collections::BTreeMap,
    };

    /// Balances kept in maps, for exercising auctions end to end.
    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    pub struct InMemory {
        accounts: BTreeMap<Address, BTreeMap<Denom, BigUint>>,
        escrow: BTreeMap<Denom, BigUint>,
        discarded: BTreeMap<Denom, BigUint>,
        issued: BTreeMap<Denom, BigUint>,
    }

    impl InMemory {
        /// Registers `account` holding `funds`.
        pub fn with_account(
            mut self,
            account: Address,
            funds: impl IntoIterator<Item = Amount>,
        ) -> Self {
            let balances = self.accounts.entry(account).or_default();
            for amount in funds {
                *balances.entry(amount.denom).or_default() += amount.quantity;
            }
            self
        }

        pub fn balance(&self, account: &Address, denom: &str) -> BigUint {
            self.accounts
                .get(account)
                .and_then(|balances| lookup(balances, denom))
                .unwrap_or_default()
        }

        pub fn escrowed(&self, denom: &str) -> BigUint {
            lookup(&self.escrow, denom).unwrap_or_default()
        }

        pub fn discarded(&self, denom: &str) -> BigUint {
            lookup(&self.discarded, denom).unwrap_or_default()
        }

        pub fn issued(&self, denom: &str) -> BigUint {
            lookup(&self.issued, denom).unwrap_or_default()
        }

        fn take_escrow(&mut self, amount: &Amount) -> Result<(), LedgerError> {
            let available = self.escrow.get(&amount.denom).cloned().unwrap_or_default();
            if available < amount.quantity {
                return Err(LedgerError::InsufficientEscrow {
                    required: amount.clone(),
                    available,
                });
            }
            if let Some(held) = self.escrow.get_mut(&amount.denom) {
                *held -= &amount.quantity;
            }
            Ok(())
        }

        fn credit(&mut self, to: &Address, amount: &Amount) {
            *self
                .accounts
                .entry(*to)
                .or_default()
                .entry(amount.denom.clone())
                .or_default() += &amount.quantity;
        }
    }

    fn lookup(balances: &BTreeMap<Denom, BigUint>, denom: &str) -> Option<BigUint> {
        balances
            .iter()
            .find(|(key, _)| key.as_str() == denom)
            .map(|(_, quantity)| quantity.clone())
    }

    impl Ledger for InMemory {
        fn account_exists(&self, account: &Address) -> bool {
            self.accounts.contains_key(account)
        }

        fn escrow(&mut self, from: &Address, amount: &Amount) -> Result<(), LedgerError> {
            let balances = self
                .accounts
                .get_mut(from)
                .ok_or(LedgerError::UnknownAccount(*from))?;
            let available = balances.get(&amount.denom).cloned().unwrap_or_default();
            if available < amount.quantity {
                return Err(LedgerError::InsufficientFunds {
                    account: *from,
                    required: amount.clone(),
                    available,
                });
            }
            if let Some(balance) = balances.get_mut(&amount.denom) {
                *balance -= &amount.quantity;
            }
            *self.escrow.entry(amount.denom.clone()).or_default() += &amount.quantity;
            Ok(())
        }

        fn release(&mut self, to: &Address, amount: &Amount) -> Result<(), LedgerError> {
            self.take_escrow(amount)?;
            self.credit(to, amount);
            Ok(())
        }

        fn discard(&mut self, amount: &Amount) -> Result<(), LedgerError> {
            self.take_escrow(amount)?;
            *self.discarded.entry(amount.denom.clone()).or_default() += &amount.quantity;
            Ok(())
        }

        fn issue(&mut self, to: &Address, amount: &Amount) -> Result<(), LedgerError> {
            self.credit(to, amount);
            *self.issued.entry(amount.denom.clone()).or_default() += &amount.quantity;
            Ok(())
        }
    }

}
