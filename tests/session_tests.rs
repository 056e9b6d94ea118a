use std::sync::Arc;

use battleship_server::transport::in_memory::InMemoryTransport;
use battleship_server::transport::Transport;
use battleship_server::{
    Client, Failure, GameServer, Identity, MemoryStore, Message, Outcome, Rejection, Request,
    Response, Session, ShotResult, Store, Transaction, Turn, PROTOCOL_VERSION,
};
use tokio::task::JoinHandle;

type Server = Arc<GameServer<MemoryStore>>;

fn open_session(server: &Server) -> (InMemoryTransport, JoinHandle<anyhow::Result<()>>) {
    let (server_end, client_end) = InMemoryTransport::pair();
    let mut session = Session::new(Arc::clone(server), server_end);
    let handle = tokio::spawn(async move { session.run().await });
    (client_end, handle)
}

async fn join(server: &Server, key: &str) -> anyhow::Result<(Client<InMemoryTransport>, JoinHandle<anyhow::Result<()>>)> {
    let (transport, handle) = open_session(server);
    let client = Client::connect(transport, Identity::new(key)).await?;
    Ok((client, handle))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_game_over_sessions() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (mut alice, alice_session) = join(&server, "alice").await?;
    let (mut bob, bob_session) = join(&server, "bob").await?;

    let game_id = alice.create_game(bob.player_id()).await?;
    let ship = bob.place_ship(game_id, 0, 0, 2, true).await?;
    assert!(ship.is_applied());
    assert!(alice.place_ship(game_id, 4, 4, 1, true).await?.is_applied());
    assert_eq!(bob.start_game(game_id).await?, Outcome::Applied(()));

    let shot = alice.fire_at(game_id, 0, 0).await?.applied().unwrap();
    assert_eq!(shot.result, ShotResult::Hit);
    assert_eq!(shot.turn, Turn::Next(bob.player_id()));

    assert_eq!(
        alice.fire_at(game_id, 1, 0).await?,
        Outcome::Rejected(Rejection::NotYourTurn)
    );

    bob.fire_at(game_id, 0, 0).await?;
    let shot = alice.fire_at(game_id, 1, 0).await?.applied().unwrap();
    assert!(matches!(shot.result, ShotResult::Sink(_)));
    assert_eq!(shot.turn, Turn::Won(alice.player_id()));

    let view = bob.game_view(game_id).await?;
    assert_eq!(view.game.winner_id, Some(alice.player_id()));
    assert_eq!(bob.list_games().await?.len(), 1);

    alice.close().await?;
    bob.close().await?;
    alice_session.await??;
    bob_session.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failures_cross_the_wire() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (mut alice, session) = join(&server, "alice").await?;

    let err = alice.fire_at(77, 0, 0).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Failure>(), Some(&Failure::GameNotFound(77)));

    let err = alice.game_view(78).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Failure>(), Some(&Failure::GameNotFound(78)));

    // the session survives failed requests
    alice.set_name("Alice").await?;
    alice.close().await?;
    session.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_end_archives_player() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (alice, session) = join(&server, "alice").await?;
    let id = alice.player_id();

    alice.close().await?;
    session.await??;
    {
        let tx = server.store().begin()?;
        assert!(tx.find_player(&Identity::new("alice")).is_none());
        assert!(tx.find_archived_player(&Identity::new("alice")).is_some());
    }

    // reconnecting restores the same player id
    let (alice, session) = join(&server, "alice").await?;
    assert_eq!(alice.player_id(), id);
    alice.close().await?;
    session.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropped_client_is_disconnected() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (alice, session) = join(&server, "alice").await?;
    let (mut bob, bob_session) = join(&server, "bob").await?;
    let game_id = bob.create_game(alice.player_id()).await?;

    drop(alice);
    session.await??;

    // the game is left untouched
    let view = bob.game_view(game_id).await?;
    assert!(!view.game.game_ended);
    assert_eq!(view.game.current_turn_id, bob.player_id());

    bob.close().await?;
    bob_session.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_version_mismatch_is_rejected() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (mut transport, session) = open_session(&server);

    transport
        .send(Message::Handshake {
            version: PROTOCOL_VERSION + 1,
            identity: Identity::new("alice"),
        })
        .await?;
    assert!(session.await?.is_err());
    assert!(transport.recv().await.is_err());

    let tx = server.store().begin()?;
    assert!(tx.find_player(&Identity::new("alice")).is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_responses_echo_request_sequence() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (mut transport, session) = open_session(&server);

    transport
        .send(Message::Handshake {
            version: PROTOCOL_VERSION,
            identity: Identity::new("alice"),
        })
        .await?;
    let player_id = match transport.recv().await? {
        Message::HandshakeAck { player_id, .. } => player_id,
        other => panic!("unexpected {:?}", other),
    };

    transport
        .send(Message::Request {
            seq: 41,
            request: Request::CreateGame { opponent_id: player_id },
        })
        .await?;
    transport
        .send(Message::Request {
            seq: 42,
            request: Request::ListGames,
        })
        .await?;

    match transport.recv().await? {
        Message::Response { seq: 41, response: Response::GameCreated(_) } => {}
        other => panic!("unexpected {:?}", other),
    }
    match transport.recv().await? {
        Message::Response { seq: 42, response: Response::Games(games) } => assert_eq!(games.len(), 1),
        other => panic!("unexpected {:?}", other),
    }

    transport.send(Message::Goodbye).await?;
    session.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_identity_stays_active_until_last_session_ends() -> anyhow::Result<()> {
    let server: Server = Arc::new(GameServer::in_memory());
    let (first, first_session) = join(&server, "alice").await?;
    let (mut second, second_session) = join(&server, "alice").await?;
    assert_eq!(first.player_id(), second.player_id());

    first.close().await?;
    first_session.await??;

    // the remaining session still acts for the player
    let game_id = second.create_game(second.player_id()).await?;
    assert_eq!(second.list_games().await?[0].game_id, game_id);

    second.close().await?;
    second_session.await??;
    let tx = server.store().begin()?;
    assert!(tx.find_player(&Identity::new("alice")).is_none());
    assert!(tx.find_archived_player(&Identity::new("alice")).is_some());
    Ok(())
}
