//! Loopback demo: drives a complete match through the gateway without
//! any network transport. Run with `RUST_LOG=debug` for the full trace.

use rally::{
    ClientCommand, Gateway, GameOptions, Identity, IdentityResolver, PresenceError,
    RallyError, ServerEvent, UserId,
};
use tracing_subscriber::EnvFilter;

/// Stand-in for the external auth system: "credentials" are names from
/// a fixed roster.
struct RosterResolver;

impl IdentityResolver for RosterResolver {
    async fn resolve(&self, credential: &str) -> Result<Identity, PresenceError> {
        match credential {
            "ana" => Ok(Identity::new(UserId(1), "ana")),
            "bo" => Ok(Identity::new(UserId(2), "bo")),
            other => Err(PresenceError::ResolveFailed(other.to_string())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), RallyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let gateway = Gateway::new();
    let resolver = RosterResolver;

    let ana_identity = resolver.resolve("ana").await?;
    let bo_identity = resolver.resolve("bo").await?;
    let ana = ana_identity.id;
    let bo = bo_identity.id;
    let mut ana_events = gateway.connect(ana_identity).await;
    let mut bo_events = gateway.connect(bo_identity).await;

    gateway.handle_command(ana, ClientCommand::CreateRoom).await?;
    let room = match ana_events.recv().await {
        Some(ServerEvent::RoomCreated { room }) => room,
        other => {
            tracing::error!(?other, "expected room_created");
            return Ok(());
        }
    };
    tracing::info!(room = %room, "demo room ready");

    gateway
        .handle_command(ana, ClientCommand::JoinRoom { room: room.clone() })
        .await?;
    gateway
        .handle_command(bo, ClientCommand::JoinRoom { room: room.clone() })
        .await?;

    let options = GameOptions { winning_score: 2, ..GameOptions::default() };
    gateway
        .handle_command(
            ana,
            ClientCommand::Ready { room: room.clone(), options: options.clone() },
        )
        .await?;
    gateway
        .handle_command(bo, ClientCommand::Ready { room: room.clone(), options })
        .await?;

    // Park both paddles off the board so every rally scores and the
    // demo always terminates.
    gateway
        .handle_command(ana, ClientCommand::TouchBar { room: room.clone(), offset: 5.0 })
        .await?;
    gateway
        .handle_command(bo, ClientCommand::TouchBar { room: room.clone(), offset: 5.0 })
        .await?;
    gateway
        .handle_command(ana, ClientCommand::Start { room: room.clone() })
        .await?;

    // Drain the second stream in the background so nothing piles up.
    tokio::spawn(async move { while bo_events.recv().await.is_some() {} });

    while let Some(event) = ana_events.recv().await {
        match event {
            ServerEvent::ScoreUpdate { scores, .. } => {
                tracing::info!(?scores, "goal");
            }
            ServerEvent::GameOver { winner, scores, .. } => {
                tracing::info!(winner = %winner.name, ?scores, "game over");
                break;
            }
            _ => {}
        }
    }

    gateway.disconnect(ana).await;
    gateway.disconnect(bo).await;
    Ok(())
}
