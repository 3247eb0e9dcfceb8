//! Persistence boundary for polls, their options and vote records.
//!
//! Core logic only talks to [`PollStore`]. Two implementations exist: Postgres for real
//! deployments and an in-process store for local runs and tests.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::db;
use crate::error::StoreResult;
use crate::models::{
    Id, NewOption, NewPoll, NewVote, Poll, PollFilter, PollOption, Vote, VoteFilter,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait PollStore: Send + Sync {
    /// Polls matching `filter`, in store order.
    async fn list_polls(&self, filter: PollFilter) -> StoreResult<Vec<Poll>>;

    async fn get_poll(&self, id: Id) -> StoreResult<Option<Poll>>;

    /// Options of a poll, in creation order.
    async fn get_options(&self, poll_id: Id) -> StoreResult<Vec<PollOption>>;

    async fn get_option(&self, id: Id) -> StoreResult<Option<PollOption>>;

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll>;

    async fn create_option(&self, option: NewOption) -> StoreResult<PollOption>;

    async fn update_option_vote_count(&self, id: Id, count: i64)
        -> StoreResult<Option<PollOption>>;

    async fn update_poll_vote_count(&self, id: Id, count: i64) -> StoreResult<Option<Poll>>;

    async fn list_votes(&self, filter: VoteFilter) -> StoreResult<Vec<Vote>>;

    /// Inserts the vote unless `(poll_id, voter)` already has one, and bumps the option and
    /// poll counters in the same atomic unit. `None` means a vote existed and nothing changed.
    async fn record_vote(&self, vote: NewVote) -> StoreResult<Option<Vote>>;

    /// Removes a poll together with its options and votes.
    async fn delete_poll(&self, id: Id) -> StoreResult<Option<Poll>>;
}

/// Opens the configured store: Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn PollStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config).await?;
            info!("Connected to Postgres poll store");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, polls will only live in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
