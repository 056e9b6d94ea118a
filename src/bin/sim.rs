//! Two random players fight one game against an in-process server.
//!
//! Prints a single JSON line describing the result.

use std::collections::HashSet;
use std::sync::Arc;

use battleship_server::{
    random_fleet, Client, GameServer, Identity, InMemoryTransport, MemoryStore, Outcome, Session,
    Turn, BOARD_SIZE, SHIPS,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::json;

type SimClient = Client<InMemoryTransport>;

async fn join(server: &Arc<GameServer<MemoryStore>>, name: &str) -> anyhow::Result<SimClient> {
    let (server_end, client_end) = InMemoryTransport::pair();
    let mut session = Session::new(Arc::clone(server), server_end);
    tokio::spawn(async move { session.run().await });
    let mut client = Client::connect(client_end, Identity::new(name)).await?;
    client.set_name(name).await?;
    Ok(client)
}

/// Pick a coordinate not yet fired at.
fn pick_target(rng: &mut SmallRng, fired: &mut HashSet<(u32, u32)>) -> anyhow::Result<(u32, u32)> {
    if fired.len() >= (BOARD_SIZE * BOARD_SIZE) as usize {
        return Err(anyhow::anyhow!("no coordinates left to fire at"));
    }
    loop {
        let target = (rng.random_range(0..BOARD_SIZE), rng.random_range(0..BOARD_SIZE));
        if fired.insert(target) {
            return Ok(target);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;
    let mut rngs = [SmallRng::seed_from_u64(seed1), SmallRng::seed_from_u64(seed2)];

    let server = Arc::new(GameServer::in_memory());
    let mut clients = [join(&server, "player1").await?, join(&server, "player2").await?];
    let player_ids = [clients[0].player_id(), clients[1].player_id()];

    let game_id = clients[0].create_game(player_ids[1]).await?;
    let lengths: Vec<u32> = SHIPS.iter().map(|&(_, len)| len).collect();
    for (client, rng) in clients.iter_mut().zip(rngs.iter_mut()) {
        let fleet = random_fleet(rng, BOARD_SIZE, &lengths)
            .ok_or_else(|| anyhow::anyhow!("unable to lay out fleet"))?;
        for ship in fleet {
            client
                .place_ship(game_id, ship.x, ship.y, ship.length, ship.horizontal)
                .await?;
        }
    }
    clients[0].start_game(game_id).await?;

    let mut fired = [HashSet::new(), HashSet::new()];
    let mut shots = [0usize; 2];
    let mut turn = 0;
    let winner = loop {
        let (x, y) = pick_target(&mut rngs[turn], &mut fired[turn])?;
        let shot = match clients[turn].fire_at(game_id, x, y).await? {
            Outcome::Applied(shot) => shot,
            Outcome::Rejected(reason) => return Err(anyhow::anyhow!("shot rejected: {}", reason)),
        };
        shots[turn] += 1;
        match shot.turn {
            Turn::Won(_) => break turn,
            Turn::Next(next) => {
                turn = if next == player_ids[0] { 0 } else { 1 };
            }
        }
    };

    for client in clients {
        client.close().await?;
    }

    let result = json!({
        "player1": {"player_id": player_ids[0], "shots": shots[0]},
        "player2": {"player_id": player_ids[1], "shots": shots[1]},
        "shots": shots[0] + shots[1],
        "winner": if winner == 0 { "player1" } else { "player2" },
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
