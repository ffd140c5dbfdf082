use actix_web::{HttpResponse, Responder, get, post, put, web};
use log::{debug, info};
use std::collections::HashMap;

use super::models::{AppState, TransactRequest, TransactResponse};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// Send `amount` from the node wallet to `recipient`.
///
/// If the wallet already has a pending transaction the transfer is merged
/// into it, otherwise a new one is authored against the replayed balance.
#[post("/transact/")]
pub async fn post_transact(
    state: web::Data<AppState>,
    body: web::Json<TransactRequest>,
) -> Result<HttpResponse, LedgerError> {
    let TransactRequest { recipient, amount } = body.into_inner();

    let bc = state.blockchain.lock().expect("mutex poisoned");
    let mut pool = state.transaction_pool.lock().expect("mutex poisoned");
    let mut wallet = state.wallet.lock().expect("mutex poisoned");

    let tx = match pool.existing_transaction_mut(&wallet.public_key) {
        Some(existing) => {
            existing.update(&wallet, &recipient, amount)?;
            debug!("POST /transact/ - updated pending tx {}", existing.id);
            existing.clone()
        }
        None => wallet.create_transaction(&recipient, amount, Some(&bc.chain))?,
    };
    pool.set_transaction(tx.clone());

    info!(
        "POST /transact/ - tx {} OK (pool size {})",
        tx.id,
        pool.len()
    );
    Ok(HttpResponse::Ok().json(TransactResponse {
        kind: "success",
        transaction: tx,
    }))
}

/// Current pool contents keyed by transaction id.
#[get("/transaction-pool-map/")]
pub async fn get_pool_map(state: web::Data<AppState>) -> impl Responder {
    let pool = state.transaction_pool.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(&*pool)
}

/// Mempool sync: overwrite the local pool with a peer's snapshot.
#[put("/transaction-pool-map/")]
pub async fn put_pool_map(
    state: web::Data<AppState>,
    body: web::Json<HashMap<String, Transaction>>,
) -> impl Responder {
    let snapshot = body.into_inner();
    let mut pool = state.transaction_pool.lock().expect("mutex poisoned");
    let before = pool.len();
    pool.set_map(snapshot);
    info!(
        "SYNC - transaction pool replaced ({} -> {} entries)",
        before,
        pool.len()
    );
    HttpResponse::Ok().json(&*pool)
}
