mod api;
mod blockchain;
mod config;
mod error;
mod storage;
mod sync;

use std::sync::{Arc, Mutex};

use actix_web::{App, HttpServer, web};
use chrono::Utc;
use dotenvy::dotenv;
use log::{error, info};

use api::AppState;
use blockchain::Block;
use config::Config;
use storage::ChainStore;
use sync::HttpChainSource;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Create the genesis block and chain file on first start.
    let store = ChainStore::for_port(&config.data_dir, config.port);
    let genesis_difficulty = config.genesis_difficulty;
    let chain = store
        .open_or_init(|| Block::genesis(Utc::now().timestamp_millis(), genesis_difficulty))
        .map_err(|e| {
            error!("Unable to create Genesis block: {e}");
            std::io::Error::other(e.to_string())
        })?;

    let peers = HttpChainSource::new(config.peer_timeout)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    info!(
        "⛓️ Starting node at http://{}:{} ({} blocks in {}, {} member nodes, policy {:?})",
        config.host,
        config.port,
        chain.len(),
        store.path().display(),
        config.member_nodes.len(),
        config.difficulty_policy
    );

    let state = web::Data::new(AppState {
        store,
        write_lock: Mutex::new(()),
        policy: config.difficulty_policy,
        member_nodes: config.member_nodes.clone(),
        peer_timeout: config.peer_timeout,
        peers: Arc::new(peers),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
