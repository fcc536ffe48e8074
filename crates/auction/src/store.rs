//! Persistence of auction records.

use {
    crate::{auction::Auction, primitives::Id},
    std::collections::BTreeMap,
};

/// Storage for live auctions.
///
/// Ids handed out by [`Store::next_id`] are unique and increasing, even
/// across deletions.
pub trait Store {
    fn get(&self, id: Id) -> Option<Auction>;
    /// Inserts or replaces the record stored under the auction's id.
    fn put(&mut self, auction: Auction);
    fn delete(&mut self, id: Id);
    fn next_id(&mut self) -> Id;
    /// Ids of all stored auctions in ascending order.
    fn ids(&self) -> Vec<Id>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemory {
    next_id: Id,
    auctions: BTreeMap<Id, Auction>,
}

impl Store for InMemory {
    fn get(&self, id: Id) -> Option<Auction> {
        self.auctions.get(&id).cloned()
    }

    fn put(&mut self, auction: Auction) {
        self.auctions.insert(auction.id(), auction);
    }

    fn delete(&mut self, id: Id) {
        self.auctions.remove(&id);
    }

    fn next_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ids(&self) -> Vec<Id> {
        self.auctions.keys().copied().collect()
    }
}
