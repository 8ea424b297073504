//! Data types for the planning poker client
//!
//! This module contains the entity records pushed by the server and the
//! query DTOs exchanged with the entity services.

mod entity;
mod event;
mod invite;
mod participant;
mod poker;
mod polling;
mod query;
mod story;
mod vote;

pub use entity::{Entity, EntityRef};
pub use event::{PokerEvent, PokerEventKind};
pub use invite::Invite;
pub use participant::Participant;
pub use poker::Poker;
pub use polling::Polling;
pub use query::{QueryFilter, QueryMetadata, QueryOptions, QueryRead};
pub use story::Story;
pub use vote::Vote;

/// Check if an identifier is still unassigned (for skip_serializing_if)
pub fn is_unassigned(id: &str) -> bool {
    id.is_empty()
}

/// Implement [`Entity`] for records that expose a plain `id: String` field
macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::types::Entity for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )+
    };
}

impl_entity!(Poker, Story, Participant, PokerEvent, Polling, Vote, Invite);
