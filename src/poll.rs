// src/poll.rs
use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{Entity, PollError};
use crate::models::{
    parse_id, Id, NewOption, NewPoll, NewVote, OptionResult, Poll, PollFilter, PollWithOptions,
    ResultsView, VoteFilter,
};
use crate::store::PollStore;

/// Percentage of `count` over `total`, two decimals with halves rounded up; "0.00" when
/// nobody has voted.
pub fn percentage(count: i64, total: i64) -> String {
    if total <= 0 {
        return "0.00".to_string();
    }
    // Hundredths of a percent, computed exactly in integers.
    let hundredths = (count * 20_000 + total) / (2 * total);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Active polls, in store order.
pub async fn list_active_polls(store: &dyn PollStore) -> Result<Vec<Poll>, PollError> {
    let polls = store.list_polls(PollFilter { active: Some(true) }).await?;
    Ok(polls.into_iter().filter(|p| p.is_active).collect())
}

async fn load_poll(store: &dyn PollStore, id: Id) -> Result<PollWithOptions, PollError> {
    let (poll, options) = tokio::try_join!(store.get_poll(id), store.get_options(id))?;
    let poll = poll.ok_or(PollError::NotFound(Entity::Poll))?;
    Ok(PollWithOptions { poll, options })
}

pub async fn get_poll_with_options(
    store: &dyn PollStore,
    raw_id: &str,
) -> Result<PollWithOptions, PollError> {
    let id = parse_id(raw_id).ok_or(PollError::NotFound(Entity::Poll))?;
    load_poll(store, id).await
}

/// Creates a poll and one option per non-empty text, in order. Duplicate texts are kept.
///
/// If an option write fails the poll is deleted again, so callers never observe a poll
/// with only some of its options.
pub async fn create_poll_with_options(
    store: &dyn PollStore,
    question: &str,
    option_texts: &[String],
) -> Result<PollWithOptions, PollError> {
    let question = question.trim();
    let texts: Vec<&str> = option_texts
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect();

    if question.is_empty() || texts.len() < 2 {
        return Err(PollError::Validation(
            "Question and at least 2 options are required".into(),
        ));
    }

    let poll = store.create_poll(NewPoll::titled(question)).await?;

    let mut options = Vec::with_capacity(texts.len());
    for text in texts {
        let created = store
            .create_option(NewOption {
                poll_id: poll.id,
                text: text.to_string(),
            })
            .await;

        match created {
            Ok(option) => options.push(option),
            Err(e) => {
                warn!("Option write failed for poll {}, rolling back: {e}", poll.id);
                if let Err(cleanup) = store.delete_poll(poll.id).await {
                    warn!("Rollback of poll {} failed: {cleanup}", poll.id);
                }
                return Err(e.into());
            }
        }
    }

    info!("Created poll {} with {} options", poll.id, options.len());
    Ok(PollWithOptions { poll, options })
}

/// Registers one vote for `voter` on `option_id` within `poll_id`.
///
/// Rejections leave every counter untouched. The final write is a single insert-if-absent,
/// so concurrent attempts from the same voter record at most one vote.
pub async fn register_vote(
    store: &dyn PollStore,
    raw_poll_id: &str,
    raw_option_id: &str,
    voter: &str,
) -> Result<PollWithOptions, PollError> {
    let poll_id = parse_id(raw_poll_id).ok_or(PollError::NotFound(Entity::Poll))?;
    let option_id = parse_id(raw_option_id);

    let existing = store
        .list_votes(VoteFilter {
            poll_id,
            voter: Some(voter.to_string()),
        })
        .await?;
    if !existing.is_empty() {
        warn!("Duplicate vote on poll {poll_id} from {voter}");
        return Err(PollError::DuplicateVote);
    }

    let (poll, option) = tokio::try_join!(store.get_poll(poll_id), async {
        match option_id {
            Some(id) => store.get_option(id).await,
            None => Ok(None),
        }
    })?;
    let poll = poll.ok_or(PollError::NotFound(Entity::Poll))?;
    let option = option.ok_or(PollError::NotFound(Entity::Option))?;

    if option.poll_id != poll.id {
        return Err(PollError::InvalidAssociation);
    }

    let recorded = store
        .record_vote(NewVote {
            poll_id: poll.id,
            option_id: option.id,
            voter: voter.to_string(),
            voted_at: Utc::now(),
        })
        .await?;

    match recorded {
        Some(vote) => info!("Recorded vote {} on poll {} option {}", vote.id, poll.id, option.id),
        None => {
            warn!("Concurrent duplicate vote on poll {} from {voter}", poll.id);
            return Err(PollError::DuplicateVote);
        }
    }

    load_poll(store, poll.id).await
}

/// Vote counts and percentages, recomputed from the options themselves.
pub async fn compute_results(
    store: &dyn PollStore,
    raw_id: &str,
) -> Result<ResultsView, PollError> {
    let PollWithOptions { poll, options } = get_poll_with_options(store, raw_id).await?;

    let total_votes: i64 = options.iter().map(|o| o.vote_count).sum();
    let options = options
        .into_iter()
        .map(|o| OptionResult {
            percentage: percentage(o.vote_count, total_votes),
            id: o.id,
            text: o.text,
            vote_count: o.vote_count,
        })
        .collect();

    Ok(ResultsView {
        poll_id: poll.id,
        title: poll.title,
        description: poll.description,
        total_votes,
        options,
    })
}

pub async fn delete_poll(store: &dyn PollStore, raw_id: &str) -> Result<Poll, PollError> {
    let id = parse_id(raw_id).ok_or(PollError::NotFound(Entity::Poll))?;
    let poll = store
        .delete_poll(id)
        .await?
        .ok_or(PollError::NotFound(Entity::Poll))?;

    info!("Deleted poll {}", poll.id);
    Ok(poll)
}

/// Rebuilds the denormalized counters of a poll from its vote records.
///
/// Option counts are recounted from votes; the poll total becomes their sum.
pub async fn reconcile_poll(
    store: &dyn PollStore,
    raw_id: &str,
) -> Result<PollWithOptions, PollError> {
    let PollWithOptions { poll, options } = get_poll_with_options(store, raw_id).await?;

    let votes = store
        .list_votes(VoteFilter {
            poll_id: poll.id,
            voter: None,
        })
        .await?;
    let mut tally: HashMap<Id, i64> = HashMap::new();
    for vote in &votes {
        *tally.entry(vote.option_id).or_default() += 1;
    }

    let mut total = 0;
    for option in &options {
        let counted = tally.get(&option.id).copied().unwrap_or(0);
        total += counted;
        if counted != option.vote_count {
            warn!(
                "Option {} counter drifted: stored {}, counted {counted}",
                option.id, option.vote_count
            );
            store.update_option_vote_count(option.id, counted).await?;
        }
    }

    if total != poll.total_votes {
        warn!(
            "Poll {} total drifted: stored {}, counted {total}",
            poll.id, poll.total_votes
        );
        store
            .update_poll_vote_count(poll.id, total)
            .await?
            .ok_or(PollError::NotFound(Entity::Poll))?;
    }

    load_poll(store, poll.id).await
}
