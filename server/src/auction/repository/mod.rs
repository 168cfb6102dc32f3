use {
    super::entities,
    crate::kernel::entities::UserId,
    models::Database,
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        time::Duration,
    },
    tokio::{
        sync::{
            Mutex,
            RwLock,
        },
        time::Instant,
    },
};

mod add_auction;
mod add_participant;
mod clear_auction_cache;
mod commit_bid;
mod end_auction;
mod get_auction;
mod get_auctions_to_end;
mod get_auctions_to_start;
mod get_bids;
mod get_leading_bid;
mod get_or_create_auction_lock;
mod models;
mod remove_auction_lock;
mod set_leading_bid;
mod start_auction;

pub use models::{
    CommitBidInput,
    CommittedBid,
    PreviousLeader,
};
#[cfg(test)]
pub use models::MockDatabase;

/// A leading-bid snapshot together with its expiry. Entries past their
/// expiry are treated as absent and repaired from the ledger on next read.
#[derive(Clone, Debug)]
pub struct CachedLeadingBid {
    pub snapshot:   entities::LeadingBid,
    pub expires_at: Instant,
}

/// Process-local fast-path state. Everything here is advisory and can be
/// rebuilt from the database; losing it costs latency, not correctness.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub leading_bids:  RwLock<HashMap<entities::AuctionId, CachedLeadingBid>>,
    pub participants:  RwLock<HashMap<entities::AuctionId, HashSet<UserId>>>,
    pub auction_locks: Mutex<HashMap<entities::AuctionId, entities::AuctionLock>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    db:                  Box<dyn Database>,
    leading_bid_ttl:     Duration,
}

impl Repository {
    pub fn new(db: impl Database, leading_bid_ttl: Duration) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db: Box::new(db),
            leading_bid_ttl,
        }
    }
}
