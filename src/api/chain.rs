use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, MineRequest, MineResponse, ReplaceResponse, ValidateResponse};
use crate::blockchain::{Block, Blockchain, ReplaceOutcome};
use crate::error::LedgerError;
use crate::miner;

/// Get the full blockchain.
#[get("/blocks/")]
pub async fn get_blocks(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(&bc.chain)
}

/// Validate the local chain.
#[get("/blocks/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: Blockchain::is_valid_chain(&bc.chain),
        length: bc.len(),
        difficulty: bc.difficulty(),
    })
}

/// Mine a block with an arbitrary payload on top of the local tip.
/// Pool entries that end up on-chain are dropped afterwards.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    req: web::Json<MineRequest>,
) -> Result<HttpResponse, LedgerError> {
    let data = req.into_inner().data;
    let worker = state.clone();

    let mined = web::block(move || {
        miner::mine_block(&worker.blockchain, data, &worker.mine_control(), |chain| {
            worker
                .transaction_pool
                .lock()
                .expect("mutex poisoned")
                .clear_blockchain_transactions(chain)
        })
    })
    .await;

    match mined {
        Ok(Ok((index, block))) => {
            info!("MINE - sealed block #{} (hash={})", index, block.hash);
            Ok(HttpResponse::Ok().json(MineResponse::new(index, &block)))
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

/// Chain sync: a peer hands over its full chain. Adopted only if strictly
/// longer and valid; settled pool entries are purged on success.
#[post("/chain/replace/")]
pub async fn replace_chain(
    state: web::Data<AppState>,
    body: web::Json<Vec<Block>>,
) -> impl Responder {
    let candidate = body.into_inner();
    let validate_transactions = state.settings.validate_incoming_transactions;

    let mut bc = state.blockchain.lock().expect("mutex poisoned");
    let mut pool = state.transaction_pool.lock().expect("mutex poisoned");
    let outcome = bc.replace_chain(candidate, validate_transactions, |chain| {
        pool.clear_blockchain_transactions(chain)
    });

    let resp = ReplaceResponse {
        accepted: outcome == ReplaceOutcome::Replaced,
        outcome,
        length: bc.len(),
    };
    if resp.accepted {
        HttpResponse::Ok().json(resp)
    } else {
        warn!("SYNC - rejected incoming chain: {:?}", outcome);
        HttpResponse::BadRequest().json(resp)
    }
}
