use actix_web::{HttpResponse, post, web};

use super::models::{AppState, MineResponse};
use crate::error::LedgerError;
use crate::miner;

/// Seal the valid pool transactions plus a reward for the node wallet.
/// The search runs on the blocking pool with no state lock held.
#[post("/mine-transactions/")]
pub async fn mine_transactions(state: web::Data<AppState>) -> Result<HttpResponse, LedgerError> {
    let worker = state.clone();

    let mined = web::block(move || {
        miner::mine_transactions(
            &worker.blockchain,
            &worker.transaction_pool,
            &worker.wallet,
            &worker.mine_control(),
        )
    })
    .await;

    match mined {
        Ok(Ok((index, block))) => Ok(HttpResponse::Ok().json(MineResponse::new(index, &block))),
        Ok(Err(e)) => Err(e),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}
