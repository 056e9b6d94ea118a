use std::collections::HashMap;

use battleship_server::{
    DamageModel, GameServer, GameView, Identity, MemoryStore, Outcome, Rejection, Rules, ShipId,
    Turn,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Place { second: bool, x: u32, y: u32, length: u32, horizontal: bool },
    Fire { who: u8, x: u32, y: u32 },
    Start { second: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (any::<bool>(), 0..6u32, 0..6u32, 1..4u32, any::<bool>()).prop_map(
            |(second, x, y, length, horizontal)| Op::Place { second, x, y, length, horizontal }
        ),
        4 => (0..3u8, 0..6u32, 0..6u32).prop_map(|(who, x, y)| Op::Fire { who, x, y }),
        1 => any::<bool>().prop_map(|second| Op::Start { second }),
    ]
}

fn damage_strategy() -> impl Strategy<Value = DamageModel> {
    prop_oneof![Just(DamageModel::StruckShip), Just(DamageModel::Fleetwide)]
}

struct Table {
    server: GameServer<MemoryStore>,
    players: [Identity; 3],
    ids: [u32; 3],
    game_id: u32,
}

impl Table {
    fn new(damage: DamageModel) -> Self {
        let server = GameServer::new(MemoryStore::new(), Rules::with_damage(damage));
        let players = [Identity::new("p1"), Identity::new("p2"), Identity::new("outsider")];
        let ids = [
            server.connect(&players[0]).unwrap(),
            server.connect(&players[1]).unwrap(),
            server.connect(&players[2]).unwrap(),
        ];
        let game_id = server.create_game(&players[0], ids[1]).unwrap();
        Self { server, players, ids, game_id }
    }

    fn view(&self) -> GameView {
        self.server.game_view(&self.players[0], self.game_id).unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Turn, winner and sinking invariants hold after every operation of a random game.
    #[test]
    fn game_invariants_hold(
        damage in damage_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let table = Table::new(damage);
        let mut before = table.view();
        let mut sunk: HashMap<ShipId, bool> = HashMap::new();

        for op in ops {
            match op {
                Op::Place { second, x, y, length, horizontal } => {
                    let who = &table.players[second as usize];
                    let outcome = table.server
                        .place_ship(who, table.game_id, x, y, length, horizontal)
                        .unwrap();
                    let after = table.view();
                    if before.game.game_started {
                        prop_assert_eq!(outcome, Outcome::Rejected(Rejection::GameStarted));
                        prop_assert_eq!(&after, &before);
                    } else {
                        prop_assert!(outcome.is_applied());
                        prop_assert_eq!(after.ships.len(), before.ships.len() + 1);
                        prop_assert_eq!(after.tiles.len(), before.tiles.len() + length as usize);
                    }
                }
                Op::Fire { who, x, y } => {
                    let caller = table.ids[who as usize];
                    let outcome = table.server
                        .fire_at(&table.players[who as usize], table.game_id, x, y)
                        .unwrap();
                    let after = table.view();
                    if before.game.game_ended {
                        prop_assert_eq!(outcome, Outcome::Rejected(Rejection::GameEnded));
                        prop_assert_eq!(&after, &before);
                    } else if before.game.current_turn_id != caller {
                        prop_assert_eq!(outcome, Outcome::Rejected(Rejection::NotYourTurn));
                        prop_assert_eq!(&after, &before);
                    } else {
                        let shot = outcome.applied().unwrap();
                        match shot.turn {
                            Turn::Won(winner) => {
                                prop_assert_eq!(winner, caller);
                                prop_assert_eq!(after.game.winner_id, Some(caller));
                                prop_assert!(after.game.game_ended);
                            }
                            Turn::Next(next) => {
                                prop_assert_ne!(next, caller);
                                prop_assert_eq!(after.game.current_turn_id, next);
                            }
                        }
                    }
                }
                Op::Start { second } => {
                    let who = &table.players[second as usize];
                    let outcome = table.server.start_game(who, table.game_id).unwrap();
                    prop_assert_eq!(outcome.is_applied(), !before.game.game_started && !before.game.game_ended);
                }
            }

            let after = table.view();
            let game = &after.game;
            prop_assert!(game.current_turn_id == table.ids[0] || game.current_turn_id == table.ids[1]);
            if before.game.game_ended {
                prop_assert!(game.game_ended);
                prop_assert_eq!(game.winner_id, before.game.winner_id);
            }
            if let Some(winner) = game.winner_id {
                prop_assert!(game.game_ended);
                prop_assert!(winner == table.ids[0] || winner == table.ids[1]);
            }
            for ship in &after.ships {
                prop_assert!(ship.hit_count <= ship.length);
                let was_sunk = sunk.insert(ship.ship_id, ship.sunk).unwrap_or(false);
                prop_assert!(ship.sunk || !was_sunk, "ship {} resurfaced", ship.ship_id);
            }
            before = after;
        }
    }

    /// A second shot at the same hit tile changes nothing but the turn.
    #[test]
    fn repeat_shot_only_passes_turn(x in 0..5u32, y in 0..5u32, length in 2..5u32) {
        let table = Table::new(DamageModel::StruckShip);
        let [p1, p2, _] = &table.players;
        table.server.place_ship(p1, table.game_id, 0, 9, 5, true).unwrap();
        table.server.place_ship(p2, table.game_id, x, y, length, true).unwrap();

        table.server.fire_at(p1, table.game_id, x, y).unwrap();
        table.server.fire_at(p2, table.game_id, 9, 0).unwrap();
        let before = table.view();
        let shot = table.server.fire_at(p1, table.game_id, x, y).unwrap().applied().unwrap();
        let after = table.view();

        prop_assert_eq!(shot.turn, Turn::Next(table.ids[1]));
        prop_assert_eq!(&after.tiles, &before.tiles);
        prop_assert_eq!(&after.ships, &before.ships);
        prop_assert_eq!(after.game.current_turn_id, table.ids[1]);
    }
}
