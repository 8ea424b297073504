//! Story context
//!
//! Owns the active story selection. Activating a story moves the channel
//! subscription to `story:{id}` and cascades the story's events and pollings
//! into the child contexts, replacing whatever they held before.

use std::ops::Deref;

use serde_json::json;
use tracing::{debug, error};

use crate::entity::EntityCache;
use crate::store::Store;
use crate::transport::Transport;
use crate::types::Story;

use super::event::EventContext;
use super::polling::PollingContext;

/// Channel that scopes pushes for one story
pub fn story_channel(id: &str) -> String {
    format!("story:{id}")
}

/// Stories of the current poker and the active selection
#[derive(Clone)]
pub struct StoryContext {
    cache: EntityCache<Story>,
    active_story_id: Store<Option<String>>,
    active_story: Store<Option<Story>>,
    events: EventContext,
    pollings: PollingContext,
}

impl StoryContext {
    pub fn new(transport: &Transport, events: EventContext, pollings: PollingContext) -> Self {
        let cache = EntityCache::new(transport, "story");
        let active_story_id: Store<Option<String>> = Store::new(None);
        let active_story = Store::new(None);

        // Keep the active story pointing at the live copy in the collection
        let selected_id = active_story_id.clone();
        let selected = active_story.clone();
        cache.entities().subscribe(move |stories: &Vec<Story>| {
            let found = selected_id
                .get()
                .and_then(|id| stories.iter().find(|story| story.id == id).cloned());
            selected.set(found);
        });

        // Registered after the cache's own listener, so it sees the reconciled collection
        let ordered = cache.entities().clone();
        transport.listen("story_updated", move |_| {
            ordered.update(|stories| sort_by_order(stories));
        });

        Self {
            cache,
            active_story_id,
            active_story,
            events,
            pollings,
        }
    }

    pub fn active_story_id(&self) -> &Store<Option<String>> {
        &self.active_story_id
    }

    pub fn active_story(&self) -> &Store<Option<Story>> {
        &self.active_story
    }

    pub fn events(&self) -> &EventContext {
        &self.events
    }

    pub fn pollings(&self) -> &PollingContext {
        &self.pollings
    }

    /// Change the active story, or clear it with `None`
    pub fn activate(&self, story: Option<Story>) {
        let previous = self.active_story_id.get();
        let next_id = story.as_ref().map(|s| s.id.clone());
        debug!(?previous, next = ?next_id, "activating story");

        self.active_story_id.set(next_id.clone());
        let resolved = next_id
            .as_deref()
            .and_then(|id| self.cache.find(id))
            .or_else(|| story.clone());
        self.active_story.set(resolved);

        let transport = self.cache.transport();
        if let Some(old) = previous {
            transport.unsubscribe(&story_channel(&old));
        }
        if let Some(new) = &next_id {
            transport.subscribe(&story_channel(new));
        }

        let (events, pollings) = story
            .map(|story| (story.events, story.pollings))
            .unwrap_or_default();
        self.events.replace(events);
        self.pollings.replace(pollings);
    }

    /// Reveal every vote on a story
    pub async fn reveal(&self, id: &str) -> Option<Story> {
        let response = self
            .cache
            .call("reveal", json!({ "story_id": id }))
            .await
            .map_err(|e| error!(error = %e, id, "reveal story failed"))
            .ok()?;
        self.cache.decode_result(response, "reveal")
    }
}

impl Deref for StoryContext {
    type Target = EntityCache<Story>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

/// Stable sort by the server-assigned `order`
pub fn sort_by_order(stories: &[Story]) -> Vec<Story> {
    let mut sorted = stories.to_vec();
    sorted.sort_by_key(|story| story.order);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::vote::VoteContext;
    use crate::protocol::{FrameMethod, RpcResponse};
    use crate::transport::{memory_pair, MemoryPeer, MemoryServer};
    use crate::types::{PokerEvent, PokerEventKind, Polling};

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn setup() -> (StoryContext, MemoryServer, MemoryPeer) {
        let (connector, mut server) = memory_pair();
        let transport = Transport::new(connector);
        let votes = VoteContext::new(&transport);
        let pollings = PollingContext::new(&transport, votes);
        let events = EventContext::new(&transport);
        let stories = StoryContext::new(&transport, events, pollings);
        transport.init("mem://gateway");
        let peer = server.accept().await.unwrap();
        transport.until_connected().await;
        (stories, server, peer)
    }

    fn story_with_children(id: &str) -> Story {
        Story {
            events: vec![
                PokerEvent::new(format!("{id}-e1"), id, PokerEventKind::Vote),
                PokerEvent::new(format!("{id}-e2"), id, PokerEventKind::Comment),
            ],
            pollings: vec![Polling::new(format!("{id}-p1"), id)],
            ..Story::new(id, "p1", id)
        }
    }

    #[tokio::test]
    async fn test_activate_cascades_children() {
        let (stories, _server, _peer) = setup().await;
        stories.events().replace(vec![PokerEvent::new("stale", "old", PokerEventKind::Vote)]);
        stories.pollings().replace(vec![Polling::new("stale", "old")]);

        stories.activate(Some(story_with_children("a")));

        let events: Vec<String> = stories.events().snapshot().into_iter().map(|e| e.id).collect();
        let pollings: Vec<String> = stories.pollings().snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(events, vec!["a-e1", "a-e2"]);
        assert_eq!(pollings, vec!["a-p1"]);
        assert_eq!(stories.pollings().current().get().unwrap().id, "a-p1");
        assert_eq!(stories.active_story_id().get().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_channel_lifecycle() {
        let (stories, _server, mut peer) = setup().await;

        stories.activate(Some(story_with_children("a")));
        stories.activate(Some(story_with_children("b")));
        settle().await;

        let frames: Vec<(FrameMethod, String)> = peer
            .drain_frames()
            .into_iter()
            .map(|f| (f.method, f.channel().unwrap_or_default().to_string()))
            .collect();
        assert_eq!(
            frames,
            vec![
                (FrameMethod::Subscribe, "story:a".to_string()),
                (FrameMethod::Unsubscribe, "story:a".to_string()),
                (FrameMethod::Subscribe, "story:b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_deactivate_clears_selection_and_children() {
        let (stories, _server, mut peer) = setup().await;
        stories.activate(Some(story_with_children("a")));
        stories.activate(None);
        settle().await;

        assert!(stories.active_story().get().is_none());
        assert!(stories.events().snapshot().is_empty());
        assert!(stories.pollings().snapshot().is_empty());
        let last = peer.drain_frames().pop().unwrap();
        assert_eq!(last.method, FrameMethod::Unsubscribe);
    }

    #[tokio::test]
    async fn test_active_story_follows_updates() {
        let (stories, _server, peer) = setup().await;
        stories.replace(vec![Story::new("a", "p1", "Login")]);
        stories.activate(Some(Story::new("a", "p1", "Login")));

        let mut renamed = Story::new("a", "p1", "Login v2");
        renamed.value = Some("5".to_string());
        peer.push("story_updated", serde_json::to_value(&renamed).unwrap());
        settle().await;
        assert_eq!(stories.active_story().get().unwrap().name, "Login v2");

        peer.push("story_deleted", json!({"id": "a"}));
        settle().await;
        assert!(stories.active_story().get().is_none());
        assert_eq!(stories.active_story_id().get().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_story_updated_resorts_collection() {
        let (stories, _server, peer) = setup().await;
        stories.replace(vec![
            Story::new("a", "p1", "A").with_order(1),
            Story::new("b", "p1", "B").with_order(2),
            Story::new("c", "p1", "C").with_order(3),
        ]);

        peer.push(
            "story_updated",
            serde_json::to_value(Story::new("a", "p1", "A").with_order(4)).unwrap(),
        );
        peer.push(
            "story_updated",
            serde_json::to_value(Story::new("c", "p1", "C").with_order(0)).unwrap(),
        );
        settle().await;

        let ids: Vec<String> = stories.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_reveal_sends_story_id() {
        let (stories, _server, mut peer) = setup().await;

        let revealing = stories.clone();
        let call = tokio::spawn(async move { revealing.reveal("s1").await });
        let request = peer.next_frame().await.unwrap().rpc_request().unwrap();
        assert_eq!(request.service, "story_service");
        assert_eq!(request.method, "reveal");
        assert_eq!(request.data, json!({"story_id": "s1"}));
        let revealed = story_with_children("s1");
        peer.reply(RpcResponse::ok(
            &request.transaction_id,
            serde_json::to_value(&revealed).unwrap(),
        ));

        assert_eq!(call.await.unwrap(), Some(revealed));
    }

    #[tokio::test]
    async fn test_reveal_rejected_is_none() {
        let (stories, _server, mut peer) = setup().await;

        let revealing = stories.clone();
        let call = tokio::spawn(async move { revealing.reveal("s1").await });
        let request = peer.next_frame().await.unwrap().rpc_request().unwrap();
        peer.reply(RpcResponse::failure(&request.transaction_id, json!("not the creator")));

        assert!(call.await.unwrap().is_none());
    }

    #[test]
    fn test_story_channel_name() {
        assert_eq!(story_channel("42"), "story:42");
    }
}
