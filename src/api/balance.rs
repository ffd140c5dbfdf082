use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, WalletInfoResponse};
use crate::wallet::Wallet;

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;

    let balance = {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        Wallet::calculate_balance(&bc.chain, &address)
    };

    HttpResponse::Ok().json(WalletInfoResponse { address, balance })
}
