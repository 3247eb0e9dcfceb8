// src/store/memory.rs
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::PollStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Id, NewOption, NewPoll, NewVote, Poll, PollFilter, PollOption, Vote, VoteFilter,
};

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    votes: Vec<Vote>,
    last_id: Id,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local poll store. Every operation runs under one lock, so `record_vote` is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn list_polls(&self, filter: PollFilter) -> StoreResult<Vec<Poll>> {
        let tables = self.lock()?;
        Ok(tables
            .polls
            .iter()
            .filter(|p| filter.active.map_or(true, |active| p.is_active == active))
            .cloned()
            .collect())
    }

    async fn get_poll(&self, id: Id) -> StoreResult<Option<Poll>> {
        let tables = self.lock()?;
        Ok(tables.polls.iter().find(|p| p.id == id).cloned())
    }

    async fn get_options(&self, poll_id: Id) -> StoreResult<Vec<PollOption>> {
        let tables = self.lock()?;
        Ok(tables
            .options
            .iter()
            .filter(|o| o.poll_id == poll_id)
            .cloned()
            .collect())
    }

    async fn get_option(&self, id: Id) -> StoreResult<Option<PollOption>> {
        let tables = self.lock()?;
        Ok(tables.options.iter().find(|o| o.id == id).cloned())
    }

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll> {
        let mut tables = self.lock()?;
        let poll = Poll {
            id: tables.next_id(),
            title: poll.title,
            description: poll.description,
            is_active: poll.is_active,
            created_at: poll.created_at,
            total_votes: 0,
        };
        tables.polls.push(poll.clone());
        Ok(poll)
    }

    async fn create_option(&self, option: NewOption) -> StoreResult<PollOption> {
        let mut tables = self.lock()?;
        let option = PollOption {
            id: tables.next_id(),
            poll_id: option.poll_id,
            text: option.text,
            vote_count: 0,
        };
        tables.options.push(option.clone());
        Ok(option)
    }

    async fn update_option_vote_count(
        &self,
        id: Id,
        count: i64,
    ) -> StoreResult<Option<PollOption>> {
        let mut tables = self.lock()?;
        Ok(tables.options.iter_mut().find(|o| o.id == id).map(|o| {
            o.vote_count = count;
            o.clone()
        }))
    }

    async fn update_poll_vote_count(&self, id: Id, count: i64) -> StoreResult<Option<Poll>> {
        let mut tables = self.lock()?;
        Ok(tables.polls.iter_mut().find(|p| p.id == id).map(|p| {
            p.total_votes = count;
            p.clone()
        }))
    }

    async fn list_votes(&self, filter: VoteFilter) -> StoreResult<Vec<Vote>> {
        let tables = self.lock()?;
        Ok(tables
            .votes
            .iter()
            .filter(|v| v.poll_id == filter.poll_id)
            .filter(|v| filter.voter.as_deref().map_or(true, |voter| v.voter == voter))
            .cloned()
            .collect())
    }

    async fn record_vote(&self, vote: NewVote) -> StoreResult<Option<Vote>> {
        let mut tables = self.lock()?;

        let taken = tables
            .votes
            .iter()
            .any(|v| v.poll_id == vote.poll_id && v.voter == vote.voter);
        if taken {
            return Ok(None);
        }

        let vote = Vote {
            id: tables.next_id(),
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            voter: vote.voter,
            voted_at: vote.voted_at,
        };

        if let Some(option) = tables.options.iter_mut().find(|o| o.id == vote.option_id) {
            option.vote_count += 1;
        }
        if let Some(poll) = tables.polls.iter_mut().find(|p| p.id == vote.poll_id) {
            poll.total_votes += 1;
        }
        tables.votes.push(vote.clone());

        Ok(Some(vote))
    }

    async fn delete_poll(&self, id: Id) -> StoreResult<Option<Poll>> {
        let mut tables = self.lock()?;
        let Some(index) = tables.polls.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let poll = tables.polls.remove(index);
        tables.options.retain(|o| o.poll_id != id);
        tables.votes.retain(|v| v.poll_id != id);

        Ok(Some(poll))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    async fn seeded() -> (MemoryStore, Poll, PollOption) {
        let store = MemoryStore::new();
        let poll = store.create_poll(NewPoll::titled("Lunch?")).await.unwrap();
        let option = store
            .create_option(NewOption {
                poll_id: poll.id,
                text: "Tacos".into(),
            })
            .await
            .unwrap();
        (store, poll, option)
    }

    fn ballot(poll: &Poll, option: &PollOption, voter: &str) -> NewVote {
        NewVote {
            poll_id: poll.id,
            option_id: option.id,
            voter: voter.into(),
            voted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn record_vote_is_insert_if_absent() {
        let (store, poll, option) = seeded().await;

        let first = store.record_vote(ballot(&poll, &option, "10.0.0.1")).await.unwrap();
        assert!(first.is_some());

        let second = store.record_vote(ballot(&poll, &option, "10.0.0.1")).await.unwrap();
        assert!(second.is_none());

        let option = store.get_option(option.id).await.unwrap().unwrap();
        let poll = store.get_poll(poll.id).await.unwrap().unwrap();
        assert_eq!(option.vote_count, 1);
        assert_eq!(poll.total_votes, 1);
    }

    #[tokio::test]
    async fn list_polls_filters_on_active_flag() {
        let store = MemoryStore::new();
        store.create_poll(NewPoll::titled("Open")).await.unwrap();
        store
            .create_poll(NewPoll {
                is_active: false,
                ..NewPoll::titled("Closed")
            })
            .await
            .unwrap();

        let active = store
            .list_polls(PollFilter { active: Some(true) })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Open");

        let all = store.list_polls(PollFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn delete_poll_cascades() {
        let (store, poll, option) = seeded().await;
        store.record_vote(ballot(&poll, &option, "a")).await.unwrap();

        let deleted = store.delete_poll(poll.id).await.unwrap();
        assert_eq!(deleted.map(|p| p.id), Some(poll.id));

        assert!(store.get_option(option.id).await.unwrap().is_none());
        let votes = store
            .list_votes(VoteFilter {
                poll_id: poll.id,
                voter: None,
            })
            .await
            .unwrap();
        assert!(votes.is_empty());
        assert!(store.delete_poll(poll.id).await.unwrap().is_none());
    }
}
