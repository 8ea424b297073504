//! Polling context
//!
//! Tracks the current polling round of the active story and mirrors its
//! votes into the vote context.

use std::ops::Deref;

use serde_json::json;
use tracing::error;

use crate::entity::{decode_push, EntityCache};
use crate::store::Store;
use crate::transport::Transport;
use crate::types::Polling;

use super::vote::VoteContext;

/// Pollings of the active story
#[derive(Clone)]
pub struct PollingContext {
    cache: EntityCache<Polling>,
    current: Store<Option<Polling>>,
    votes: VoteContext,
}

impl PollingContext {
    pub fn new(transport: &Transport, votes: VoteContext) -> Self {
        let cache = EntityCache::new(transport, "polling");
        let current = Store::new(None);

        let selected = current.clone();
        cache
            .entities()
            .subscribe(move |pollings: &Vec<Polling>| selected.set(select_current(pollings)));

        let mirrored = votes.clone();
        current.subscribe(move |polling: &Option<Polling>| {
            let ballot = polling.as_ref().map(|p| p.votes.clone()).unwrap_or_default();
            mirrored.replace(ballot);
        });

        let restarted = current.clone();
        transport.listen("polling_restarted", move |event| {
            if let Some(polling) = decode_push::<Polling>(event) {
                restarted.set(Some(polling));
            }
        });

        Self {
            cache,
            current,
            votes,
        }
    }

    /// The round participants are voting on
    pub fn current(&self) -> &Store<Option<Polling>> {
        &self.current
    }

    pub fn votes(&self) -> &VoteContext {
        &self.votes
    }

    /// Close a round with its agreed value
    pub async fn complete(&self, id: &str, value: &str) -> Option<Polling> {
        let response = self
            .cache
            .call("complete", json!({ "entity_id": id, "value": value }))
            .await
            .map_err(|e| error!(error = %e, id, "complete polling failed"))
            .ok()?;
        self.cache.decode_result(response, "complete")
    }

    /// Start a fresh round on the same story
    pub async fn restart(&self, id: &str) -> Option<Polling> {
        let response = self
            .cache
            .call("restart", json!({ "entity_id": id }))
            .await
            .map_err(|e| error!(error = %e, id, "restart polling failed"))
            .ok()?;
        self.cache.decode_result(response, "restart")
    }
}

impl Deref for PollingContext {
    type Target = EntityCache<Polling>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

/// First round still open in collection order, else the last round
pub fn select_current(pollings: &[Polling]) -> Option<Polling> {
    pollings
        .iter()
        .find(|polling| !polling.completed)
        .or_else(|| pollings.last())
        .cloned()
}
