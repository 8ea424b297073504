//! Domain contexts
//!
//! One context per entity kind, each wrapping an [`EntityCache`] and adding
//! the selection state of its level. Selections cascade downwards:
//!
//! ```text
//! Poker ─▶ Story ─┬▶ Event
//!                 └▶ Polling ─▶ Vote
//! ```
//!
//! [`Session`] builds the whole chain on one transport.
//!
//! [`EntityCache`]: crate::entity::EntityCache

pub mod event;
pub mod participant;
pub mod poker;
pub mod polling;
pub mod story;
pub mod vote;

pub use event::EventContext;
pub use participant::ParticipantContext;
pub use poker::PokerContext;
pub use polling::{select_current, PollingContext};
pub use story::{sort_by_order, story_channel, StoryContext};
pub use vote::VoteContext;

use crate::transport::Transport;

/// Every context of a client, wired to one transport
#[derive(Clone)]
pub struct Session {
    pub transport: Transport,
    pub votes: VoteContext,
    pub pollings: PollingContext,
    pub events: EventContext,
    pub stories: StoryContext,
    pub pokers: PokerContext,
    pub participants: ParticipantContext,
}

impl Session {
    /// Build the contexts children first, so each parent can hold its children
    pub fn new(transport: &Transport) -> Self {
        let votes = VoteContext::new(transport);
        let pollings = PollingContext::new(transport, votes.clone());
        let events = EventContext::new(transport);
        let stories = StoryContext::new(transport, events.clone(), pollings.clone());
        let pokers = PokerContext::new(transport, stories.clone());
        let participants = ParticipantContext::new(transport);

        Self {
            transport: transport.clone(),
            votes,
            pollings,
            events,
            stories,
            pokers,
            participants,
        }
    }
}
