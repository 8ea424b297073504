//! Participant context

use std::ops::Deref;

use tracing::{info, warn};

use crate::entity::EntityCache;
use crate::transport::Transport;
use crate::types::Participant;
use crate::utils::LocalStored;

/// Members of the current poker
#[derive(Clone)]
pub struct ParticipantContext {
    cache: EntityCache<Participant>,
}

impl ParticipantContext {
    pub fn new(transport: &Transport) -> Self {
        Self {
            cache: EntityCache::new(transport, "participant"),
        }
    }

    /// Display name of a participant in the current snapshot
    pub fn participant_name(&self, id: &str) -> Option<String> {
        self.cache.find(id).map(|participant| participant.name)
    }

    /// Resolve who this client is in `poker_id`.
    ///
    /// A remembered participant that is still in the collection wins and is
    /// written back with its current fields. A remembered participant that
    /// vanished is forgotten. Without a usable identity a new participant is
    /// created under `name`, when one is given, and remembered.
    pub async fn identify(
        &self,
        poker_id: &str,
        name: Option<&str>,
        stored: &LocalStored<Participant>,
    ) -> Option<Participant> {
        if let Some(remembered) = stored.get() {
            if let Some(live) = self.cache.find(&remembered.id) {
                remember(stored, &live);
                return Some(live);
            }
            warn!(id = %remembered.id, poker_id, "remembered participant is gone");
            if let Err(e) = stored.clear() {
                warn!(error = %e, key = stored.key(), "failed to forget participant");
            }
        }

        let name = name?;
        let created = self
            .cache
            .create(&Participant::new("", poker_id, name))
            .await?;
        info!(id = %created.id, poker_id, "joined as new participant");
        remember(stored, &created);
        Some(created)
    }
}

impl Deref for ParticipantContext {
    type Target = EntityCache<Participant>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

fn remember(stored: &LocalStored<Participant>, participant: &Participant) {
    if let Err(e) = stored.set(participant) {
        warn!(error = %e, key = stored.key(), "failed to remember participant");
    }
}
