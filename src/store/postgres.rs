// src/store/postgres.rs
use async_trait::async_trait;
use sqlx::PgPool;

use super::PollStore;
use crate::error::StoreResult;
use crate::models::{
    Id, NewOption, NewPoll, NewVote, Poll, PollFilter, PollOption, Vote, VoteFilter,
};

const POLL_COLUMNS: &str = "id, title, description, is_active, created_at, total_votes";
const OPTION_COLUMNS: &str = "id, poll_id, text, vote_count";
const VOTE_COLUMNS: &str = "id, poll_id, option_id, voter, voted_at";

/// Poll store backed by the tables in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn list_polls(&self, filter: PollFilter) -> StoreResult<Vec<Poll>> {
        let polls = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls
             WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
             ORDER BY id"
        ))
        .bind(filter.active)
        .fetch_all(&self.pool)
        .await?;

        Ok(polls)
    }

    async fn get_poll(&self, id: Id) -> StoreResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(poll)
    }

    async fn get_options(&self, poll_id: Id) -> StoreResult<Vec<PollOption>> {
        let options = sqlx::query_as::<_, PollOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM poll_options WHERE poll_id = $1 ORDER BY id"
        ))
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    async fn get_option(&self, id: Id) -> StoreResult<Option<PollOption>> {
        let option = sqlx::query_as::<_, PollOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM poll_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(option)
    }

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "INSERT INTO polls (title, description, is_active, created_at, total_votes)
             VALUES ($1, $2, $3, $4, 0)
             RETURNING {POLL_COLUMNS}"
        ))
        .bind(poll.title)
        .bind(poll.description)
        .bind(poll.is_active)
        .bind(poll.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(poll)
    }

    async fn create_option(&self, option: NewOption) -> StoreResult<PollOption> {
        let option = sqlx::query_as::<_, PollOption>(&format!(
            "INSERT INTO poll_options (poll_id, text, vote_count)
             VALUES ($1, $2, 0)
             RETURNING {OPTION_COLUMNS}"
        ))
        .bind(option.poll_id)
        .bind(option.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(option)
    }

    async fn update_option_vote_count(
        &self,
        id: Id,
        count: i64,
    ) -> StoreResult<Option<PollOption>> {
        let option = sqlx::query_as::<_, PollOption>(&format!(
            "UPDATE poll_options SET vote_count = $2 WHERE id = $1 RETURNING {OPTION_COLUMNS}"
        ))
        .bind(id)
        .bind(count)
        .fetch_optional(&self.pool)
        .await?;

        Ok(option)
    }

    async fn update_poll_vote_count(&self, id: Id, count: i64) -> StoreResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "UPDATE polls SET total_votes = $2 WHERE id = $1 RETURNING {POLL_COLUMNS}"
        ))
        .bind(id)
        .bind(count)
        .fetch_optional(&self.pool)
        .await?;

        Ok(poll)
    }

    async fn list_votes(&self, filter: VoteFilter) -> StoreResult<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes
             WHERE poll_id = $1 AND ($2::TEXT IS NULL OR voter = $2)
             ORDER BY id"
        ))
        .bind(filter.poll_id)
        .bind(filter.voter)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn record_vote(&self, vote: NewVote) -> StoreResult<Option<Vote>> {
        let mut tx = self.pool.begin().await?;

        // The unique (poll_id, voter) constraint decides who wins concurrent attempts.
        let inserted = sqlx::query_as::<_, Vote>(&format!(
            "INSERT INTO votes (poll_id, option_id, voter, voted_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (poll_id, voter) DO NOTHING
             RETURNING {VOTE_COLUMNS}"
        ))
        .bind(vote.poll_id)
        .bind(vote.option_id)
        .bind(&vote.voter)
        .bind(vote.voted_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(inserted) = inserted else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE poll_options SET vote_count = vote_count + 1 WHERE id = $1")
            .bind(inserted.option_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE polls SET total_votes = total_votes + 1 WHERE id = $1")
            .bind(inserted.poll_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(inserted))
    }

    async fn delete_poll(&self, id: Id) -> StoreResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "DELETE FROM polls WHERE id = $1 RETURNING {POLL_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(poll)
    }
}
