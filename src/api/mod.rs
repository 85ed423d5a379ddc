mod chain;
mod consensus;
mod health;
pub mod models;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_blockchain)
            .service(chain::mine_block)
            .service(chain::validate_local_chain)
            .service(consensus::synchronize)
            // must stay last: `{index}` would shadow the fixed paths above
            .service(chain::get_block_by_index),
    );
}
