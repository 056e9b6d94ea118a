//! Typed client for the game server protocol.

use anyhow::anyhow;

use crate::common::{Outcome, Shot};
use crate::game::GameView;
use crate::model::{Game, GameId, Identity, PlayerId, ShipId};
use crate::protocol::{Message, Request, Response, PROTOCOL_VERSION};
use crate::transport::Transport;

/// Client end of a session. Failed operations surface as errors that can be
/// downcast to [`crate::protocol::Failure`].
pub struct Client<T: Transport> {
    transport: T,
    player_id: PlayerId,
    seq: u64,
}

impl<T: Transport> Client<T> {
    /// Perform the handshake as `identity`.
    pub async fn connect(mut transport: T, identity: Identity) -> anyhow::Result<Self> {
        transport
            .send(Message::Handshake {
                version: PROTOCOL_VERSION,
                identity,
            })
            .await?;
        match transport.recv().await? {
            Message::HandshakeAck { version, player_id } if version == PROTOCOL_VERSION => Ok(Self {
                transport,
                player_id,
                seq: 0,
            }),
            Message::HandshakeAck { version, .. } => Err(anyhow!(
                "Protocol version mismatch in HandshakeAck: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            )),
            other => Err(anyhow!("Expected HandshakeAck, got {:?}", other)),
        }
    }

    /// Player id the server assigned to this client's identity.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Send one request and wait for its response.
    pub async fn call(&mut self, request: Request) -> anyhow::Result<Response> {
        let seq = self.seq;
        self.seq += 1;
        self.transport.send(Message::Request { seq, request }).await?;
        match self.transport.recv().await? {
            Message::Response { seq: resp_seq, response } if resp_seq == seq => match response {
                Response::Failed(failure) => Err(anyhow::Error::new(failure)),
                response => Ok(response),
            },
            Message::Response { seq: resp_seq, .. } => Err(anyhow!(
                "Sequence mismatch: expected {}, got {}",
                seq,
                resp_seq
            )),
            other => Err(anyhow!("Unexpected message: {:?}", other)),
        }
    }

    pub async fn set_name(&mut self, name: impl Into<String>) -> anyhow::Result<()> {
        match self.call(Request::SetName { name: name.into() }).await? {
            Response::Done => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn create_game(&mut self, opponent_id: PlayerId) -> anyhow::Result<GameId> {
        match self.call(Request::CreateGame { opponent_id }).await? {
            Response::GameCreated(game_id) => Ok(game_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn start_game(&mut self, game_id: GameId) -> anyhow::Result<Outcome<()>> {
        match self.call(Request::StartGame { game_id }).await? {
            Response::Started(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn place_ship(
        &mut self,
        game_id: GameId,
        x: u32,
        y: u32,
        length: u32,
        horizontal: bool,
    ) -> anyhow::Result<Outcome<ShipId>> {
        let request = Request::PlaceShip {
            game_id,
            x,
            y,
            length,
            horizontal,
        };
        match self.call(request).await? {
            Response::ShipPlaced(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn fire_at(&mut self, game_id: GameId, x: u32, y: u32) -> anyhow::Result<Outcome<Shot>> {
        match self.call(Request::FireAt { game_id, x, y }).await? {
            Response::Shot(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn game_view(&mut self, game_id: GameId) -> anyhow::Result<GameView> {
        match self.call(Request::GameView { game_id }).await? {
            Response::View(view) => Ok(view),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_games(&mut self) -> anyhow::Result<Vec<Game>> {
        match self.call(Request::ListGames).await? {
            Response::Games(games) => Ok(games),
            other => Err(unexpected(other)),
        }
    }

    /// End the session; the server archives this client's player record.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.transport.send(Message::Goodbye).await
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("Unexpected response: {:?}", response)
}
