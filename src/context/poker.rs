//! Poker context
//!
//! Root of the selection chain. Selecting a poker does not load its stories;
//! the active story only changes when the server announces it through the
//! `poker_selected_story` push, which this context forwards to the story
//! context.

use std::ops::Deref;

use serde_json::json;
use tracing::{error, info};

use crate::entity::{decode_push, EntityCache};
use crate::store::Store;
use crate::transport::Transport;
use crate::types::{Poker, Story};

use super::story::StoryContext;

/// Pokers the client knows about and the one being played
#[derive(Clone)]
pub struct PokerContext {
    cache: EntityCache<Poker>,
    current: Store<Option<Poker>>,
    stories: StoryContext,
}

impl PokerContext {
    pub fn new(transport: &Transport, stories: StoryContext) -> Self {
        let cache = EntityCache::new(transport, "poker");
        let current: Store<Option<Poker>> = Store::new(None);

        let selected = current.clone();
        cache.entities().subscribe(move |pokers: &Vec<Poker>| {
            if pokers.is_empty() {
                selected.set(None);
                return;
            }
            let Some(id) = selected.with(|poker| poker.as_ref().map(|p| p.id.clone())) else {
                return;
            };
            selected.set(pokers.iter().find(|poker| poker.id == id).cloned());
        });

        let cascade = stories.clone();
        transport.listen("poker_selected_story", move |event| {
            let story = if event.data.is_null() {
                None
            } else {
                match decode_push::<Story>(event) {
                    Some(story) => Some(story),
                    None => return,
                }
            };
            cascade.activate(story);
        });

        Self {
            cache,
            current,
            stories,
        }
    }

    /// The poker being played, if any
    pub fn current(&self) -> &Store<Option<Poker>> {
        &self.current
    }

    pub fn stories(&self) -> &StoryContext {
        &self.stories
    }

    /// Make `poker` current, preferring the copy held in the collection
    pub fn select(&self, poker: Option<Poker>) {
        let resolved = poker.map(|poker| self.cache.find(&poker.id).unwrap_or(poker));
        info!(poker = ?resolved.as_ref().map(|p| p.id.as_str()), "poker selected");
        self.current.set(resolved);
    }

    /// Ask the server to move the current poker to another story, or to none.
    ///
    /// The local selection is not touched; it follows the
    /// `poker_selected_story` push the server answers with.
    pub async fn select_story(&self, story_id: Option<&str>) {
        let Some(poker_id) = self.current.with(|poker| poker.as_ref().map(|p| p.id.clone())) else {
            return;
        };
        let data = json!({ "poker_id": poker_id, "story_id": story_id });
        if let Err(e) = self.cache.call("select_story", data).await {
            error!(error = %e, poker_id = %poker_id, ?story_id, "select story failed");
        }
    }
}

impl Deref for PokerContext {
    type Target = EntityCache<Poker>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::event::EventContext;
    use crate::context::polling::PollingContext;
    use crate::context::vote::VoteContext;
    use crate::protocol::{FrameMethod, RpcResponse};
    use crate::transport::{memory_pair, MemoryPeer, MemoryServer};
    use crate::types::Polling;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn setup() -> (PokerContext, MemoryServer, MemoryPeer) {
        let (connector, mut server) = memory_pair();
        let transport = Transport::new(connector);
        let votes = VoteContext::new(&transport);
        let pollings = PollingContext::new(&transport, votes);
        let events = EventContext::new(&transport);
        let stories = StoryContext::new(&transport, events, pollings);
        let pokers = PokerContext::new(&transport, stories);
        transport.init("mem://gateway");
        let peer = server.accept().await.unwrap();
        transport.until_connected().await;
        (pokers, server, peer)
    }

    fn named(id: &str, name: &str) -> Poker {
        Poker {
            name: name.to_string(),
            ..Poker::new(id, "u1")
        }
    }

    #[tokio::test]
    async fn test_select_prefers_collection_copy() {
        let (pokers, _server, _peer) = setup().await;
        pokers.replace(vec![named("p1", "Sprint 12")]);

        pokers.select(Some(named("p1", "stale")));
        assert_eq!(pokers.current().get().unwrap().name, "Sprint 12");

        pokers.select(Some(named("p2", "Unlisted")));
        assert_eq!(pokers.current().get().unwrap().name, "Unlisted");

        pokers.select(None);
        assert!(pokers.current().get().is_none());
    }

    #[tokio::test]
    async fn test_current_tracks_collection_changes() {
        let (pokers, _server, peer) = setup().await;
        pokers.replace(vec![named("p1", "Sprint 12"), named("p2", "Sprint 13")]);
        pokers.select(Some(named("p1", "Sprint 12")));

        peer.push("poker_updated", serde_json::to_value(named("p1", "Sprint 12b")).unwrap());
        settle().await;
        assert_eq!(pokers.current().get().unwrap().name, "Sprint 12b");

        peer.push("poker_deleted", json!({"id": "p1"}));
        settle().await;
        assert!(pokers.current().get().is_none());
    }

    #[tokio::test]
    async fn test_empty_collection_clears_current() {
        let (pokers, _server, _peer) = setup().await;
        pokers.select(Some(named("p9", "Orphan")));
        pokers.replace(Vec::new());
        assert!(pokers.current().get().is_none());
    }

    #[tokio::test]
    async fn test_selected_story_push_cascades() {
        let (pokers, _server, mut peer) = setup().await;
        let story = Story {
            pollings: vec![Polling::new("pl1", "s1")],
            ..Story::new("s1", "p1", "Login")
        };

        peer.push("poker_selected_story", serde_json::to_value(&story).unwrap());
        settle().await;

        let stories = pokers.stories();
        assert_eq!(stories.active_story_id().get().as_deref(), Some("s1"));
        assert_eq!(stories.pollings().current().get().unwrap().id, "pl1");
        let frame = peer.next_frame().await.unwrap();
        assert_eq!(frame.method, FrameMethod::Subscribe);
        assert_eq!(frame.channel(), Some("story:s1"));

        peer.push("poker_selected_story", serde_json::Value::Null);
        settle().await;
        assert!(stories.active_story_id().get().is_none());
        assert!(stories.pollings().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_select_story_without_poker_sends_nothing() {
        let (pokers, _server, mut peer) = setup().await;
        pokers.select_story(Some("s1")).await;
        settle().await;
        assert!(peer.try_next_frame().is_none());
    }

    #[tokio::test]
    async fn test_select_story_calls_service() {
        let (pokers, _server, mut peer) = setup().await;
        pokers.select(Some(named("p1", "Sprint 12")));

        let selecting = pokers.clone();
        let call = tokio::spawn(async move { selecting.select_story(Some("s2")).await });
        let request = peer.next_frame().await.unwrap().rpc_request().unwrap();
        assert_eq!(request.service, "poker_service");
        assert_eq!(request.method, "select_story");
        assert_eq!(request.data, json!({"poker_id": "p1", "story_id": "s2"}));
        peer.reply(RpcResponse::ok(&request.transaction_id, serde_json::Value::Null));
        call.await.unwrap();

        // selection only moves with the server push
        assert!(pokers.stories().active_story_id().get().is_none());
    }
}
