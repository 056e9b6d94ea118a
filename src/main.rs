use std::path::PathBuf;
use std::sync::Arc;

use battleship_server::{
    init_logging, serve, DamageModel, GameServer, MemoryStore, Rules, DEFAULT_BIND,
};
use clap::Parser;
use log::info;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Accept clients over TCP and referee their games.
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, value_enum, default_value_t = DamageModel::StruckShip, help = "Which ships a hit is credited to")]
        damage: DamageModel,
        #[arg(long, help = "Persist all relations to this snapshot file")]
        snapshot: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            damage,
            snapshot,
        } => {
            let store = match snapshot {
                Some(path) => MemoryStore::open(path)?,
                None => MemoryStore::new(),
            };
            let server = Arc::new(GameServer::new(store, Rules::with_damage(damage)));
            let listener = TcpListener::bind(&bind).await?;
            info!("listening on {} (damage model {:?})", listener.local_addr()?, damage);
            serve(listener, server).await?;
        }
    }
    Ok(())
}
