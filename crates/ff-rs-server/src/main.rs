mod config;
mod connection;
mod net;
mod persistence;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use config::ServerConfig;
use connection::ConnectionHandler;
use ff_rs_game::content::ContentTables;
use ff_rs_game::world::{SimSettings, World};
use persistence::JsonPlayerStore;
use tracing::{error, info};

/// How often the world loop wakes to poll its timers.
const LOOP_INTERVAL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() {
    let config = Arc::new(match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "FF-RS shard v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);

    let content = match ContentTables::load(&config.world.content) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to load content: {e}");
            std::process::exit(1);
        }
    };
    let store = match JsonPlayerStore::open(&config.world.player_data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open player data {}: {e}", config.world.player_data);
            std::process::exit(1);
        }
    };
    let addr: SocketAddr = match format!("{}:{}", config.server.address, config.server.port).parse()
    {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid bind address: {e}");
            std::process::exit(1);
        }
    };

    let settings = SimSettings {
        simulate_mobs: config.world.simulate_mobs,
    };
    if !settings.simulate_mobs {
        info!("Mob simulation disabled");
    }
    let mut world = World::new(content, settings);
    world.populate();

    let (events_tx, mut events) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = net::listen(addr, events_tx).await {
            error!("Listener on {addr} failed: {e}");
        }
    });

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // All world state is owned by this one task.
    let world_loop = tokio::spawn(async move {
        let mut handler = ConnectionHandler::new(world, Box::new(store), config);
        let mut tick_interval = tokio::time::interval(LOOP_INTERVAL);
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(e) => {
                            let now = handler.now();
                            handler.handle_event(e, now);
                        }
                        None => break, // listener gone
                    }
                }
                _ = tick_interval.tick() => {
                    let now = handler.now();
                    handler.tick(now);
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Saving {} players before shutdown...", handler.player_count());
                        handler.save_all();
                        break;
                    }
                }
            }
        }
    });

    if let Err(e) = world_loop.await {
        error!("World loop panicked: {e}");
    }
    info!("Server shut down.");
}
