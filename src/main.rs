//! Poker client - Binary Entry Point
//!
//! Connects to the gateway, opens the poker named by `POKER_ID` on every
//! connect and logs what happens to it until Ctrl+C. The participant this
//! client plays as is remembered under `POKER_STORAGE_DIR`, or joined as
//! `POKER_PARTICIPANT_NAME` when none is remembered.

use std::sync::Arc;

use poker_realtime::config::ClientConfig;
use poker_realtime::context::Session;
use poker_realtime::transport::Transport;
use poker_realtime::types::{Participant, QueryFilter, QueryOptions};
use poker_realtime::utils::{participant_storage_key, LocalStored};
use poker_realtime::Result;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    info!(url = %config.gateway_url, poker = ?config.poker_id, "starting {}", poker_realtime::NAME);

    let transport = Transport::websocket(config.transport());
    let session = Session::new(&transport);

    session.stories.active_story().subscribe(|story| match story {
        Some(story) => info!(id = %story.id, name = %story.name, value = ?story.value, "active story"),
        None => info!("no active story"),
    });
    session.pollings.current().subscribe(|polling| {
        if let Some(polling) = polling {
            info!(
                id = %polling.id,
                completed = polling.completed,
                revealed = polling.revealed,
                votes = polling.votes.len(),
                "current polling"
            );
        }
    });

    let opener = session.clone();
    let opened_config = config.clone();
    transport.connected().subscribe(move |connected| {
        if *connected {
            tokio::spawn(open_poker(opener.clone(), opened_config.clone()));
        }
    });

    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || signal.notify_one())?;

    transport.init(config.connection_url());
    shutdown.notified().await;

    info!("shutting down");
    transport.close();
    Ok(())
}

/// Load the configured poker and everything the views need from it
async fn open_poker(session: Session, config: ClientConfig) {
    let Some(poker_id) = config.poker_id.as_deref() else {
        return;
    };
    let Some(poker) = session.pokers.retrieve(poker_id).await else {
        warn!(poker_id, "poker not found");
        return;
    };
    info!(id = %poker.id, name = %poker.name, "poker opened");
    session.pokers.select(Some(poker.clone()));

    let by_poker = || vec![QueryFilter::new("pokerId", poker_id)];
    let stories = session.stories.query(by_poker(), QueryOptions::save()).await;
    let participants = session
        .participants
        .query(by_poker(), QueryOptions::save())
        .await;
    info!(
        stories = stories.as_ref().map_or(0, Vec::len),
        participants = participants.as_ref().map_or(0, Vec::len),
        "poker loaded"
    );

    let current = poker
        .current_story_id
        .as_deref()
        .and_then(|id| session.stories.find(id));
    session.stories.activate(current);

    let stored: LocalStored<Participant> =
        LocalStored::new(&config.storage_dir, participant_storage_key(poker_id));
    match session
        .participants
        .identify(poker_id, config.participant_name.as_deref(), &stored)
        .await
    {
        Some(me) => info!(id = %me.id, name = %me.name, "playing as participant"),
        None => info!("watching without a participant"),
    }
}
