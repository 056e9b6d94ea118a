//! Server side of a client connection.
//!
//! A session performs the handshake, registers the caller through the connect
//! hook, answers requests one at a time and archives the caller when the
//! connection ends.

use std::sync::Arc;

use anyhow::anyhow;
use log::{debug, info, warn};
use tokio::net::TcpListener;

use crate::config::{MAX_FRAME_SIZE, SESSION_IDLE_TIMEOUT};
use crate::model::Identity;
use crate::protocol::{Failure, Message, Request, Response, PROTOCOL_VERSION};
use crate::server::GameServer;
use crate::store::Store;
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

/// Run one public operation for `caller` and package its result.
pub fn dispatch<S: Store>(server: &GameServer<S>, caller: &Identity, request: Request) -> Response {
    let result = match request {
        Request::SetName { name } => server.set_name(caller, name).map(|()| Response::Done),
        Request::CreateGame { opponent_id } => server
            .create_game(caller, opponent_id)
            .map(Response::GameCreated),
        Request::StartGame { game_id } => server.start_game(caller, game_id).map(Response::Started),
        Request::PlaceShip {
            game_id,
            x,
            y,
            length,
            horizontal,
        } => server
            .place_ship(caller, game_id, x, y, length, horizontal)
            .map(Response::ShipPlaced),
        Request::FireAt { game_id, x, y } => {
            server.fire_at(caller, game_id, x, y).map(Response::Shot)
        }
        Request::GameView { game_id } => server.game_view(caller, game_id).map(Response::View),
        Request::ListGames => server.list_games(caller).map(Response::Games),
    };
    result.unwrap_or_else(|err| {
        debug!("request from {} failed: {}", caller, err);
        Response::Failed(Failure::from(err))
    })
}

pub struct Session<S: Store, T: Transport> {
    server: Arc<GameServer<S>>,
    transport: T,
}

impl<S: Store, T: Transport> Session<S, T> {
    pub fn new(server: Arc<GameServer<S>>, transport: T) -> Self {
        Self { server, transport }
    }
}

impl<S: Store + 'static, T: Transport> Session<S, T> {
    /// Run `op` against the server on the blocking pool; store calls may
    /// wait on the store lock and write the snapshot file.
    async fn blocking<R, F>(&self, op: F) -> anyhow::Result<R>
    where
        F: FnOnce(&GameServer<S>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let server = Arc::clone(&self.server);
        Ok(tokio::task::spawn_blocking(move || op(&server)).await?)
    }

    async fn handshake(&mut self) -> anyhow::Result<Identity> {
        match self.transport.recv().await? {
            Message::Handshake { version, identity } if version == PROTOCOL_VERSION => {
                let caller = identity.clone();
                let player_id = self.blocking(move |server| server.connect(&caller)).await??;
                self.transport
                    .send(Message::HandshakeAck {
                        version: PROTOCOL_VERSION,
                        player_id,
                    })
                    .await?;
                Ok(identity)
            }
            Message::Handshake { version, .. } => Err(anyhow!(
                "Protocol version mismatch in Handshake: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            )),
            other => Err(anyhow!("Expected Handshake, got {:?}", other)),
        }
    }

    /// Serve the connection until the client leaves or the transport fails.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let identity = self.handshake().await?;
        info!("session opened for {}", identity);

        let served = self.serve(&identity).await;
        let caller = identity.clone();
        match self.blocking(move |server| server.disconnect(&caller)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("disconnect of {} failed: {}", identity, e),
            Err(e) => warn!("disconnect of {} failed: {}", identity, e),
        }
        info!("session closed for {}", identity);
        served
    }

    async fn serve(&mut self, identity: &Identity) -> anyhow::Result<()> {
        loop {
            let msg = match self.transport.recv().await {
                Ok(msg) => msg,
                Err(e) => {
                    debug!("transport of {} ended: {}", identity, e);
                    return Ok(());
                }
            };
            match msg {
                Message::Request { seq, request } => {
                    let caller = identity.clone();
                    let response = self
                        .blocking(move |server| dispatch(server, &caller, request))
                        .await?;
                    self.transport
                        .send(Message::Response { seq, response })
                        .await?;
                }
                Message::Goodbye => return Ok(()),
                other => return Err(anyhow!("Unexpected message from {}: {:?}", identity, other)),
            }
        }
    }
}

/// Accept TCP clients forever, running each session on its own task.
pub async fn serve<S>(listener: TcpListener, server: Arc<GameServer<S>>) -> anyhow::Result<()>
where
    S: Store + 'static,
{
    loop {
        let (stream, addr) = listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("set_nodelay for {} failed: {}", addr, e);
        }
        debug!("accepted connection from {}", addr);
        let transport = TcpTransport::with_config(stream, SESSION_IDLE_TIMEOUT, MAX_FRAME_SIZE);
        let mut session = Session::new(Arc::clone(&server), transport);
        tokio::spawn(async move {
            if let Err(e) = session.run().await {
                warn!("session from {} ended with an error: {}", addr, e);
            }
        });
    }
}
