//! Poker event context

use std::ops::Deref;

use crate::entity::EntityCache;
use crate::store::Store;
use crate::transport::Transport;
use crate::types::PokerEvent;

/// Timeline of the active story, with live vote views
#[derive(Clone)]
pub struct EventContext {
    cache: EntityCache<PokerEvent>,
    unrevealed_votes: Store<Vec<PokerEvent>>,
    current_votes: Store<Vec<PokerEvent>>,
}

impl EventContext {
    pub fn new(transport: &Transport) -> Self {
        let cache = EntityCache::new(transport, "event");
        let unrevealed_votes = Store::new(Vec::new());
        let current_votes = Store::new(Vec::new());

        let unrevealed = unrevealed_votes.clone();
        let current = current_votes.clone();
        cache.entities().subscribe(move |events: &Vec<PokerEvent>| {
            let votes: Vec<PokerEvent> = events.iter().filter(|e| e.is_vote()).cloned().collect();
            unrevealed.set(votes.iter().filter(|e| !e.revealed).cloned().collect());
            current.set(votes);
        });

        Self {
            cache,
            unrevealed_votes,
            current_votes,
        }
    }

    /// Vote entries whose content is still hidden
    pub fn unrevealed_votes(&self) -> &Store<Vec<PokerEvent>> {
        &self.unrevealed_votes
    }

    /// Every vote entry
    pub fn current_votes(&self) -> &Store<Vec<PokerEvent>> {
        &self.current_votes
    }
}

impl Deref for EventContext {
    type Target = EntityCache<PokerEvent>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}
